#![allow(dead_code)]

use std::path::{Path, PathBuf};

use chrono::{TimeZone, Utc};
use quote_pdf::{
    AssetPaths, Contact, LineItem, QuoteDocument, QuoteDocumentRequest, QuoteMetadata,
    SellerProfile, TypesetterConfig,
};

/// Output directory: tests/output/<case>/
pub fn output_dir(case: &str) -> PathBuf {
    let dir = PathBuf::from("tests/output").join(case);
    std::fs::create_dir_all(&dir).expect("create test output dir");
    dir
}

pub fn contact() -> Contact {
    Contact {
        company: "Constructora Los Andes Ltda.".into(),
        address: "Av. Providencia 1234, Santiago".into(),
        email: "compras@losandes.cl".into(),
        phone: "+56 2 2345 6789".into(),
        tax_id: Some("76.123.456-7".into()),
        contact_name: "María José Fuentes".into(),
    }
}

pub fn metadata() -> QuoteMetadata {
    QuoteMetadata {
        quote_number: "COT-2024-0042".into(),
        correlative_id: 42,
        created_at: Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap(),
        description: None,
        execution_time: Some("10 días hábiles".into()),
        payment_method: Some("Transferencia 30 días".into()),
    }
}

pub fn request(items: Vec<LineItem>) -> QuoteDocumentRequest {
    QuoteDocumentRequest {
        contact: contact(),
        items,
        metadata: metadata(),
    }
}

/// Catalog item with a one-line name and `characteristics` bullet lines.
pub fn item(n: usize, characteristics: usize) -> LineItem {
    let mut item = LineItem::new(format!("Producto {n:02}"), 1, 1000.0);
    item.sku = Some(format!("SKU-{n:04}"));
    item.measurement_unit = Some("in".into());
    item.unit_size = Some("0.5".into());
    item.characteristics = (0..characteristics)
        .map(|c| format!("Característica {}", c + 1))
        .collect();
    item
}

pub fn seller() -> SellerProfile {
    SellerProfile {
        name: "Ferretería Industrial del Sur".into(),
        tax_id: "77.888.999-0".into(),
        address: "Los Carrera 560, Concepción".into(),
        website: "www.ferrsur.cl".into(),
        email: "ventas@ferrsur.cl".into(),
        phone: "+56 41 222 3344".into(),
    }
}

/// Config whose asset directory does not exist, so every render uses the
/// standard-font fallback and no logo.
pub fn config_without_assets() -> TypesetterConfig {
    TypesetterConfig {
        assets: AssetPaths::under(Path::new("tests/output/no-such-assets")),
        seller: seller(),
        ..TypesetterConfig::default()
    }
}

pub fn count_occurrences(haystack: &[u8], needle: &[u8]) -> usize {
    haystack
        .windows(needle.len())
        .filter(|w| *w == needle)
        .count()
}

pub fn assert_well_formed(doc: &QuoteDocument) {
    assert!(doc.bytes.starts_with(b"%PDF-"), "missing PDF header");
    let tail = String::from_utf8_lossy(&doc.bytes[doc.bytes.len().saturating_sub(16)..]);
    assert!(tail.trim_end().ends_with("%%EOF"), "missing EOF marker: {tail:?}");
    assert!(!doc.pages.is_empty());
}

/// Item indices in the order they were drawn across all pages.
pub fn drawn_rows(doc: &QuoteDocument) -> Vec<usize> {
    doc.pages.iter().flat_map(|p| p.rows.iter().copied()).collect()
}
