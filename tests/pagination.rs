mod common;

use quote_pdf::{PageGeometry, QuoteDocument, typeset};

/// Row-level layout checks shared by every pagination case.
fn check_layout(doc: &QuoteDocument, item_count: usize) {
    let geometry = PageGeometry::default();

    let drawn = common::drawn_rows(doc);
    let expected: Vec<usize> = (0..item_count).collect();
    assert_eq!(drawn, expected, "every item drawn once, in order");

    for (p, page) in doc.pages.iter().enumerate() {
        assert!(page.header, "page {} has no header", p + 1);
        assert!(page.footer, "page {} has no footer", p + 1);

        let (Some(top), Some(bottom)) = (page.rows_top, page.rows_bottom) else {
            assert!(page.rows.is_empty());
            continue;
        };
        let used: f32 = page.rows.iter().map(|&i| doc.row_heights[i]).sum();
        assert!(
            (top - used - bottom).abs() < 0.01,
            "page {}: rows are not stacked contiguously",
            p + 1
        );
        // Only a row taller than a whole page may cross the footer reserve.
        if page.rows.len() > 1 {
            assert!(
                bottom >= geometry.footer_reserve - 0.01,
                "page {}: rows end at {bottom}, inside the footer reserve",
                p + 1
            );
        }
    }

    // A break only happens when the next row would not have fitted.
    for pair in doc.pages.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        let (Some(bottom), Some(&first)) = (prev.rows_bottom, next.rows.first()) else {
            continue;
        };
        assert!(
            bottom - doc.row_heights[first] < geometry.footer_reserve,
            "row {first} would have fitted on the previous page"
        );
    }

    // Totals once, then the disclaimer from that page to the end.
    let totals_pages: Vec<usize> = (0..doc.pages.len())
        .filter(|&p| doc.pages[p].totals_box)
        .collect();
    assert_eq!(totals_pages.len(), 1, "totals box drawn once");
    let totals_page = totals_pages[0];
    for (p, page) in doc.pages.iter().enumerate() {
        assert_eq!(page.disclaimer, p >= totals_page, "disclaimer on page {}", p + 1);
        if p > totals_page {
            assert!(page.rows.is_empty(), "page {} has rows after the totals", p + 1);
        }
        if let Some(bottom) = page.disclaimer_bottom {
            assert!(
                bottom >= geometry.footer_reserve - 0.01,
                "page {}: disclaimer ends at {bottom}, inside the footer reserve",
                p + 1
            );
        }
    }
}

fn disclaimer_of(sentences: usize) -> String {
    "Precios en pesos chilenos, sujetos a disponibilidad de stock al momento de la orden de compra. "
        .repeat(sentences)
}

#[test]
fn short_quote_fits_on_one_page() {
    let items = (1..=3).map(|n| common::item(n, 0)).collect();
    let doc = typeset(&common::request(items), &common::config_without_assets()).unwrap();

    common::assert_well_formed(&doc);
    assert_eq!(doc.page_count(), 1);
    check_layout(&doc, 3);
    assert_eq!(doc.totals.net, 3000);
    assert_eq!(doc.totals.tax, 570);
    assert_eq!(doc.totals.grand_total, 3570);
}

/// Forced two-page break with rows of three bullet lines each. Forty such
/// rows cannot fit two pages at a legible size, so fifteen 53pt rows stand in
/// for that case: nine fill the first page and six land on the second.
#[test]
fn tall_rows_force_exactly_two_pages() {
    let items = (1..=15).map(|n| common::item(n, 3)).collect();
    let doc = typeset(&common::request(items), &common::config_without_assets()).unwrap();

    common::assert_well_formed(&doc);
    assert_eq!(doc.page_count(), 2);
    assert!(doc.row_heights.iter().all(|&h| (h - 53.0).abs() < 0.01));
    assert_eq!(doc.pages[0].rows.len(), 9);
    assert_eq!(doc.pages[1].rows.len(), 6);
    check_layout(&doc, 15);

    let path = common::output_dir("pagination").join("fifteen_rows.pdf");
    std::fs::write(path, &doc.bytes).unwrap();
}

#[test]
fn long_quotes_paginate_without_splitting_rows() {
    for (count, characteristics) in [(40, 0), (60, 2), (25, 6)] {
        let items = (1..=count)
            .map(|n| common::item(n, (n % (characteristics + 1)) + characteristics / 2))
            .collect();
        let doc = typeset(&common::request(items), &common::config_without_assets()).unwrap();
        common::assert_well_formed(&doc);
        assert!(doc.page_count() >= 2, "{count} items on one page");
        check_layout(&doc, count);
    }
}

#[test]
fn row_taller_than_a_page_gets_a_page_of_its_own() {
    let items = vec![common::item(1, 0), common::item(2, 80), common::item(3, 0)];
    let doc = typeset(&common::request(items), &common::config_without_assets()).unwrap();

    common::assert_well_formed(&doc);
    assert!(doc.row_heights[1] > PageGeometry::default().height);
    let page_of = |row: usize| doc.pages.iter().position(|p| p.rows.contains(&row)).unwrap();
    assert_eq!(page_of(0), 0);
    assert_eq!(page_of(1), 1);
    assert_eq!(page_of(2), 2);
    assert_eq!(doc.pages[1].rows, vec![1]);
    check_layout(&doc, 3);
}

#[test]
fn oversized_first_row_leaves_no_empty_table_behind() {
    let items = vec![common::item(1, 80), common::item(2, 0)];
    let doc = typeset(&common::request(items), &common::config_without_assets()).unwrap();

    common::assert_well_formed(&doc);
    let first = &doc.pages[0];
    assert!(first.rows.is_empty());
    assert_eq!(first.rows_top, None, "no column headers above an empty table");
    assert_eq!(doc.pages[1].rows, vec![0]);
    check_layout(&doc, 2);
}

#[test]
fn totals_move_to_a_new_page_when_rows_fill_the_last_one() {
    // Find the item count whose table ends too low for the totals block.
    let config = common::config_without_assets();
    let mut found = false;
    for count in 5..=20 {
        let items = (1..=count).map(|n| common::item(n, 3)).collect();
        let doc = typeset(&common::request(items), &config).unwrap();
        let last = doc.pages.last().unwrap();
        if last.rows.is_empty() {
            assert!(last.totals_box && last.disclaimer);
            check_layout(&doc, count);
            found = true;
            break;
        }
    }
    assert!(found, "no item count pushed the totals onto their own page");
}

#[test]
fn every_page_carries_header_and_footer_links() {
    let items = (1..=30).map(|n| common::item(n, 2)).collect();
    let doc = typeset(&common::request(items), &common::config_without_assets()).unwrap();

    assert!(doc.page_count() >= 2);
    for page in &doc.pages {
        assert_eq!(page.links, 2, "website link in header and footer");
    }
    let total_links: usize = doc.pages.iter().map(|p| p.links).sum();
    assert_eq!(common::count_occurrences(&doc.bytes, b"/Link"), total_links);
}

#[test]
fn long_disclaimer_moves_totals_instead_of_overrunning_the_footer() {
    let mut config = common::config_without_assets();
    config.disclaimer = disclaimer_of(20);
    let items = (1..=6).map(|n| common::item(n, 3)).collect();
    let doc = typeset(&common::request(items), &config).unwrap();

    common::assert_well_formed(&doc);
    assert_eq!(doc.page_count(), 2);
    assert_eq!(doc.pages[0].rows.len(), 6);
    assert!(!doc.pages[0].totals_box);
    assert!(doc.pages[1].totals_box);
    check_layout(&doc, 6);
}

#[test]
fn disclaimer_longer_than_a_page_flows_onto_further_pages() {
    let mut config = common::config_without_assets();
    config.disclaimer = disclaimer_of(250);
    let items = (1..=4).map(|n| common::item(n, 1)).collect();
    let doc = typeset(&common::request(items), &config).unwrap();

    common::assert_well_formed(&doc);
    assert!(doc.page_count() >= 3, "{} pages", doc.page_count());
    check_layout(&doc, 4);
    let continued = doc.pages.iter().filter(|p| p.disclaimer && !p.totals_box).count();
    assert!(continued >= 1, "disclaimer never left the totals page");
    assert!(doc.pages.last().unwrap().disclaimer_bottom.is_some());

    let path = common::output_dir("pagination").join("long_disclaimer.pdf");
    std::fs::write(path, &doc.bytes).unwrap();
}

#[test]
fn long_address_wraps_and_pushes_the_table_down() {
    let config = common::config_without_assets();
    let rows_top = |address: String| {
        let mut request = common::request(vec![common::item(1, 0)]);
        request.contact.address = address;
        let doc = typeset(&request, &config).unwrap();
        common::assert_well_formed(&doc);
        doc.pages[0].rows_top.unwrap()
    };

    let street = "Parque Industrial Los Libertadores, Camino a Lampa km 3.5, Bodega 14, ";
    let short = rows_top(common::contact().address);
    let long = rows_top(street.repeat(4));
    let longer = rows_top(street.repeat(12));

    // Two extra value lines for the address; anything past three is cut.
    assert!((short - long - 22.0).abs() < 0.01, "{short} vs {long}");
    assert!((long - longer).abs() < 0.01, "{long} vs {longer}");
}
