mod common;

use quote_pdf::{Error, LineItem, QuoteDocumentRequest, render_quote_file, typeset};

const REQUEST_JSON: &str = r#"{
  "contact": {
    "company": "Clínica Santa Elena",
    "address": "Calle Larga 77, Valparaíso",
    "email": "abastecimiento@santaelena.cl",
    "phone": "+56 32 211 0000",
    "contactName": "Pedro Soto"
  },
  "items": [
    {
      "name": "Llave de paso 1/2\"",
      "sku": "LP-012",
      "characteristics": ["Bronce", "PN16"],
      "quantity": 4,
      "unitPrice": 12990,
      "discountPercent": 10,
      "measurementUnit": "in",
      "unitSize": "0.5"
    },
    {
      "name": "Cinta teflón",
      "quantity": 12,
      "unitPrice": 450.5
    }
  ],
  "metadata": {
    "quoteNumber": "COT-7781",
    "correlativeId": 7781,
    "createdAt": "2024-11-20T15:30:00Z",
    "description": "Reposición de materiales sala de calderas."
  }
}"#;

fn assert_invalid(request: &QuoteDocumentRequest, fragment: &str) {
    match typeset(request, &common::config_without_assets()) {
        Err(Error::InvalidRequest(msg)) => {
            assert!(msg.contains(fragment), "{msg:?} does not mention {fragment:?}")
        }
        other => panic!("expected InvalidRequest, got {:?}", other.map(|d| d.page_count())),
    }
}

#[test]
fn camel_case_json_deserializes() {
    let request = QuoteDocumentRequest::from_json(REQUEST_JSON.as_bytes()).unwrap();
    assert_eq!(request.contact.contact_name, "Pedro Soto");
    assert_eq!(request.contact.tax_id, None);
    assert_eq!(request.items.len(), 2);
    assert_eq!(request.items[0].characteristics, vec!["Bronce", "PN16"]);
    assert_eq!(request.items[0].unit_size.as_deref(), Some("0.5"));
    assert_eq!(request.items[1].discount_percent, 0.0);
    assert!(request.items[1].sku.is_none());
    assert_eq!(request.metadata.correlative_id, 7781);
}

#[test]
fn malformed_json_is_an_invalid_request() {
    let err = QuoteDocumentRequest::from_json(b"{\"contact\": {}}").unwrap_err();
    assert!(matches!(err, Error::InvalidRequest(_)), "{err}");
}

#[test]
fn totals_round_per_line_before_tax() {
    let request = QuoteDocumentRequest::from_json(REQUEST_JSON.as_bytes()).unwrap();
    let doc = typeset(&request, &common::config_without_assets()).unwrap();

    common::assert_well_formed(&doc);
    // 4 × 12990 × 0.9 = 46764; 12 × 450.5 = 5406
    assert_eq!(doc.totals.gross, 51960 + 5406);
    assert_eq!(doc.totals.net, 46764 + 5406);
    assert_eq!(doc.totals.discount, 5196);
    assert_eq!(doc.totals.tax, 9912);
    assert_eq!(doc.totals.grand_total, 52170 + 9912);
    assert_eq!(doc.page_count(), 1);
}

#[test]
fn tax_rate_comes_from_config() {
    let request = common::request(vec![LineItem::new("Servicio", 1, 10000.0)]);
    let mut config = common::config_without_assets();
    config.tax_rate = 0.0;
    let doc = typeset(&request, &config).unwrap();
    assert_eq!(doc.totals.tax, 0);
    assert_eq!(doc.totals.grand_total, 10000);
}

#[test]
fn empty_and_invalid_items_are_rejected() {
    assert_invalid(&common::request(Vec::new()), "no items");

    let mut zero = common::item(1, 0);
    zero.quantity = 0;
    assert_invalid(&common::request(vec![zero]), "quantity");

    let mut negative = common::item(1, 0);
    negative.unit_price = -5.0;
    assert_invalid(&common::request(vec![negative]), "unit price");

    let mut nan = common::item(1, 0);
    nan.unit_price = f64::NAN;
    assert_invalid(&common::request(vec![nan]), "unit price");

    let mut discount = common::item(1, 0);
    discount.discount_percent = 120.0;
    assert_invalid(&common::request(vec![common::item(0, 0), discount]), "item 1");
}

#[test]
fn line_amounts_beyond_currency_range_are_rejected() {
    let huge = vec![LineItem::new("A", u32::MAX, 1e18), LineItem::new("B", u32::MAX, 1e18)];
    assert_invalid(&common::request(huge), "line amount");

    // Largest accepted line still renders with exact totals.
    let edge = vec![LineItem::new("Lote completo", 1000, 1e12)];
    let doc = typeset(&common::request(edge), &common::config_without_assets()).unwrap();
    assert_eq!(doc.totals.net, 1_000_000_000_000_000);
    assert_eq!(doc.totals.tax, 190_000_000_000_000);
}

#[test]
fn tax_rate_that_overflows_totals_is_an_error() {
    let mut config = common::config_without_assets();
    config.tax_rate = 1e10;
    let request = common::request(vec![LineItem::new("Lote", 1000, 1e12)]);
    let err = typeset(&request, &config).unwrap_err();
    assert!(matches!(err, Error::InvalidRequest(_)), "{err}");
}

#[test]
fn validity_past_the_calendar_still_renders() {
    let mut config = common::config_without_assets();
    config.validity_days = u32::MAX;
    let doc = typeset(&common::request(vec![common::item(1, 0)]), &config).unwrap();
    common::assert_well_formed(&doc);
    assert_eq!(doc.page_count(), 1);
}

#[test]
fn quote_file_round_trip_through_disk() {
    let dir = common::output_dir("request_handling");
    let input = dir.join("request.json");
    let output = dir.join("quote.pdf");
    std::fs::write(&input, REQUEST_JSON).unwrap();

    let doc = render_quote_file(&input, &output, &common::config_without_assets()).unwrap();
    let written = std::fs::read(&output).unwrap();
    assert_eq!(written, doc.bytes);
}

#[test]
fn missing_input_file_is_an_io_error() {
    let dir = common::output_dir("request_handling");
    let err = render_quote_file(
        &dir.join("does-not-exist.json"),
        &dir.join("never.pdf"),
        &common::config_without_assets(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::Io(_)), "{err}");
    assert!(std::error::Error::source(&err).is_some());
}
