mod chrome;
mod cursor;
mod layout;
mod summary;
mod table;

use std::collections::BTreeSet;

use chrono::{Datelike, Timelike};
use pdf_writer::{Content, Date, Filter, Name, Pdf, Rect, Ref, Str, TextStr};

use crate::assets::{ImageFormat, LogoImage, load_logo};
use crate::config::TypesetterConfig;
use crate::error::Error;
use crate::fonts::{FontSet, FontStyle, register_font};
use crate::model::QuoteDocumentRequest;
use crate::totals::{RunningTotals, Totals};

use chrome::{PageChrome, PlacedLogo, draw_contact_block, draw_description, draw_title};
use cursor::{Phase, RenderCursor};
use layout::{LayoutBox, LinkAnnotation};
use summary::{
    DISCLAIMER_LINE_HEIGHT, SECTION_GAP, TOTALS_BOX_HEIGHT, disclaimer_height,
    draw_disclaimer_heading, draw_disclaimer_lines, draw_totals, wrap_disclaimer,
};
use table::{
    COLUMNS, DESCRIPTION_COLUMN, compute_column_widths, draw_column_headers, draw_row,
    draw_table_border, layout_row,
};

const LOGO_MAX_WIDTH: f32 = 150.0;
const LOGO_MAX_HEIGHT: f32 = 48.0;

/// What ended up on one page.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PageSummary {
    pub header: bool,
    pub footer: bool,
    /// Indices into `QuoteDocumentRequest::items`, in drawing order.
    pub rows: Vec<usize>,
    /// Y where the first row on this page starts, below the column headers.
    pub rows_top: Option<f32>,
    /// Y where the last row on this page ends.
    pub rows_bottom: Option<f32>,
    pub totals_box: bool,
    pub disclaimer: bool,
    /// Y where the disclaimer text on this page ends.
    pub disclaimer_bottom: Option<f32>,
    pub links: usize,
}

/// A rendered quote and a description of how it was laid out.
#[derive(Clone, Debug)]
pub struct QuoteDocument {
    pub bytes: Vec<u8>,
    pub pages: Vec<PageSummary>,
    pub row_heights: Vec<f32>,
    pub totals: Totals,
    pub logo_embedded: bool,
    pub fallback_fonts: bool,
}

impl QuoteDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

struct PageCanvas {
    content: Content,
    links: Vec<LinkAnnotation>,
    summary: PageSummary,
}

impl PageCanvas {
    fn new(chrome: &PageChrome) -> Self {
        let mut canvas = PageCanvas {
            content: Content::new(),
            links: Vec::new(),
            summary: PageSummary::default(),
        };
        chrome.draw_header(&mut canvas.content, &mut canvas.links);
        canvas.summary.header = true;
        canvas
    }
}

/// Every character the document can show, so embedded fonts are subset once.
fn collect_used_chars(request: &QuoteDocumentRequest, config: &TypesetterConfig) -> BTreeSet<char> {
    let mut chars: BTreeSet<char> = (' '..='~').collect();
    chars.extend('\u{A0}'..='\u{FF}');
    chars.extend(['•', '…', '–', '—', '“', '”', '‘', '’']);

    let contact = &request.contact;
    let meta = &request.metadata;
    let seller = &config.seller;
    let texts = [
        contact.company.as_str(),
        contact.address.as_str(),
        contact.email.as_str(),
        contact.phone.as_str(),
        contact.tax_id.as_deref().unwrap_or(""),
        contact.contact_name.as_str(),
        meta.quote_number.as_str(),
        meta.description.as_deref().unwrap_or(""),
        meta.execution_time.as_deref().unwrap_or(""),
        meta.payment_method.as_deref().unwrap_or(""),
        seller.name.as_str(),
        seller.tax_id.as_str(),
        seller.address.as_str(),
        seller.website.as_str(),
        seller.email.as_str(),
        seller.phone.as_str(),
        config.disclaimer.as_str(),
    ];
    for text in texts {
        chars.extend(text.chars());
    }
    for item in &request.items {
        chars.extend(item.name.chars());
        chars.extend(item.sku.iter().flat_map(|s| s.chars()));
        chars.extend(item.characteristics.iter().flat_map(|c| c.chars()));
        chars.extend(item.measurement_unit.iter().flat_map(|s| s.chars()));
        chars.extend(item.unit_size.iter().flat_map(|s| s.chars()));
    }
    chars.extend(['²', '³', '°']);
    chars
}

fn embed_logo(pdf: &mut Pdf, logo: &LogoImage, alloc: &mut impl FnMut() -> Ref) -> Option<Ref> {
    let xobj_ref = alloc();
    match logo.format {
        ImageFormat::Jpeg => {
            let mut xobj = pdf.image_xobject(xobj_ref, &logo.data);
            xobj.filter(Filter::DctDecode);
            xobj.width(logo.pixel_width as i32);
            xobj.height(logo.pixel_height as i32);
            xobj.color_space().device_rgb();
            xobj.bits_per_component(8);
        }
        ImageFormat::Png => {
            let cursor = std::io::Cursor::new(&logo.data);
            let reader = image::ImageReader::with_format(
                std::io::BufReader::new(cursor),
                image::ImageFormat::Png,
            );
            let decoded = match reader.decode() {
                Ok(d) => d,
                Err(e) => {
                    log::warn!("Logo PNG could not be decoded: {e} — skipping");
                    return None;
                }
            };
            let rgba: image::RgbaImage = decoded.to_rgba8();
            let (w, h) = (rgba.width(), rgba.height());
            let has_alpha = rgba.pixels().any(|p| p.0[3] < 255);

            let rgb_data: Vec<u8> = rgba
                .pixels()
                .flat_map(|p| [p.0[0], p.0[1], p.0[2]])
                .collect();
            let compressed_rgb = miniz_oxide::deflate::compress_to_vec_zlib(&rgb_data, 6);

            let smask_ref = if has_alpha {
                let alpha_data: Vec<u8> = rgba.pixels().map(|p| p.0[3]).collect();
                let compressed_alpha = miniz_oxide::deflate::compress_to_vec_zlib(&alpha_data, 6);
                let mask_ref = alloc();
                let mut mask = pdf.image_xobject(mask_ref, &compressed_alpha);
                mask.filter(Filter::FlateDecode);
                mask.width(w as i32);
                mask.height(h as i32);
                mask.color_space().device_gray();
                mask.bits_per_component(8);
                Some(mask_ref)
            } else {
                None
            };

            let mut xobj = pdf.image_xobject(xobj_ref, &compressed_rgb);
            xobj.filter(Filter::FlateDecode);
            xobj.width(w as i32);
            xobj.height(h as i32);
            xobj.color_space().device_rgb();
            xobj.bits_per_component(8);
            if let Some(mask_ref) = smask_ref {
                xobj.s_mask(mask_ref);
            }
        }
    }
    Some(xobj_ref)
}

/// Column header band at the cursor; the table border starts above it.
fn begin_table(
    canvas: &mut PageCanvas,
    cursor: &mut RenderCursor,
    fonts: &FontSet,
    config: &TypesetterConfig,
    widths: &[f32],
) {
    let g = &config.page;
    cursor.open_table();
    let band = LayoutBox::new(
        g.side_margin,
        cursor.y(),
        g.content_width(),
        g.column_header_height,
    );
    draw_column_headers(&mut canvas.content, fonts, band, widths);
    cursor.advance(g.column_header_height);
    canvas.summary.rows_top = Some(cursor.y());
}

pub(crate) fn render(
    request: &QuoteDocumentRequest,
    config: &TypesetterConfig,
) -> Result<QuoteDocument, Error> {
    let t0 = std::time::Instant::now();
    let geometry = &config.page;
    let mut pdf = Pdf::new();
    let mut next_id = 1i32;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let catalog_id = alloc();
    let pages_id = alloc();
    let info_id = alloc();

    // Phase 1: assets
    let used_chars = collect_used_chars(request, config);
    let fonts = FontSet {
        regular: register_font(
            &mut pdf,
            FontStyle::Regular,
            &config.assets.regular_font,
            "F1".to_string(),
            &mut alloc,
            &used_chars,
        ),
        bold: register_font(
            &mut pdf,
            FontStyle::Bold,
            &config.assets.bold_font,
            "F2".to_string(),
            &mut alloc,
            &used_chars,
        ),
    };

    let logo = load_logo(&config.assets.logo).and_then(|img| {
        let xobj_ref = embed_logo(&mut pdf, &img, &mut alloc)?;
        let (width, height) = img.fit_within(LOGO_MAX_WIDTH, LOGO_MAX_HEIGHT);
        Some((xobj_ref, PlacedLogo {
            pdf_name: "Im1".to_string(),
            width,
            height,
        }))
    });
    let logo_ref = logo.as_ref().map(|(r, _)| *r);

    let t_assets = t0.elapsed();

    // Phase 2: table geometry and row sizes
    let percents: Vec<f32> = COLUMNS.iter().map(|c| c.percent).collect();
    let widths = compute_column_widths(
        geometry.content_width(),
        &percents,
        geometry.min_column_width,
    );
    let row_layouts: Vec<_> = request
        .items
        .iter()
        .map(|item| layout_row(item, &fonts.bold, &fonts.regular, widths[DESCRIPTION_COLUMN]))
        .collect();

    let chrome = PageChrome {
        fonts: &fonts,
        geometry,
        seller: &config.seller,
        logo: logo.map(|(_, placed)| placed),
    };

    // Phase 3: first page opening block
    let mut pages: Vec<PageCanvas> = vec![PageCanvas::new(&chrome)];
    let mut top = geometry.content_top();
    {
        let content = &mut pages[0].content;
        top -= draw_title(content, &fonts, geometry, request, top) + 8.0;
        top -= draw_contact_block(content, &fonts, geometry, request, config.validity_days, top)
            + 10.0;
        let desc = draw_description(
            content,
            &fonts,
            geometry,
            request.metadata.description.as_deref(),
            top,
        );
        if desc > 0.0 {
            top -= desc + 8.0;
        }
    }

    // Phase 4: rows
    let mut cursor = RenderCursor::new(geometry, top);
    let mut running = RunningTotals::new(config.tax_rate);
    // Column headers are drawn together with each page's first row.
    let mut table_open = false;

    for (index, (item, row)) in request.items.iter().zip(&row_layouts).enumerate() {
        let needed = if table_open {
            row.height
        } else {
            geometry.column_header_height + row.height
        };
        if let Some(brk) = cursor.break_page_if_needed(needed) {
            if let Some(border) = brk.closed_border {
                draw_table_border(&mut pages[border.page].content, &border);
            }
            log::debug!("Item {index} starts page {}", brk.new_page + 1);
            pages.push(PageCanvas::new(&chrome));
            table_open = false;
        }
        if !table_open {
            let page = cursor.page_index();
            begin_table(&mut pages[page], &mut cursor, &fonts, config, &widths);
            table_open = true;
        }
        let subtotal = running.add(item)?;
        let row_box = LayoutBox::new(
            geometry.side_margin,
            cursor.y(),
            geometry.content_width(),
            row.height,
        );
        let canvas = &mut pages[cursor.page_index()];
        draw_row(&mut canvas.content, &fonts, row_box, &widths, index, item, row, subtotal);
        cursor.advance(row.height);
        canvas.summary.rows.push(index);
        canvas.summary.rows_bottom = Some(cursor.y());
    }

    // Phase 5: totals and disclaimer
    let totals = running.finish()?;
    let disclaimer = wrap_disclaimer(&fonts, geometry.content_width(), &config.disclaimer);
    let needed = SECTION_GAP + TOTALS_BOX_HEIGHT + SECTION_GAP + disclaimer_height(&disclaimer);
    let full_page = geometry.content_top() - geometry.footer_reserve;
    let start = cursor.begin_totals(needed.min(full_page));
    if let Some(border) = start.closed_border {
        draw_table_border(&mut pages[border.page].content, &border);
    }
    if start.new_page.is_some() {
        log::debug!("Totals moved to page {}", pages.len() + 1);
        pages.push(PageCanvas::new(&chrome));
    }
    debug_assert_eq!(cursor.phase(), Phase::WritingTotals);
    {
        let canvas = &mut pages[cursor.page_index()];
        cursor.advance(SECTION_GAP);
        let right = geometry.side_margin + geometry.content_width();
        let used = draw_totals(
            &mut canvas.content,
            &fonts,
            right,
            cursor.y(),
            &totals,
            config.tax_rate,
        );
        cursor.advance(used + SECTION_GAP);
        canvas.summary.totals_box = true;
        let used = draw_disclaimer_heading(
            &mut canvas.content,
            &fonts,
            geometry.side_margin,
            geometry.content_width(),
            cursor.y(),
        );
        cursor.advance(used);
        canvas.summary.disclaimer = true;
        canvas.summary.disclaimer_bottom = Some(cursor.y());
    }

    // A disclaimer longer than the space left keeps flowing onto new pages.
    let mut remaining = disclaimer.as_slice();
    let mut fresh_page = false;
    while !remaining.is_empty() {
        let room = ((cursor.y() - geometry.footer_reserve) / DISCLAIMER_LINE_HEIGHT).floor();
        let mut take = if room > 0.0 { room as usize } else { 0 };
        if take == 0 {
            if !fresh_page {
                let page = cursor.continue_totals_on_new_page();
                log::debug!("Disclaimer continues on page {}", page + 1);
                pages.push(PageCanvas::new(&chrome));
                fresh_page = true;
                continue;
            }
            take = 1;
        }
        let (chunk, rest) = remaining.split_at(take.min(remaining.len()));
        let canvas = &mut pages[cursor.page_index()];
        let used = draw_disclaimer_lines(
            &mut canvas.content,
            &fonts,
            geometry.side_margin,
            cursor.y(),
            chunk,
        );
        cursor.advance(used);
        canvas.summary.disclaimer = true;
        canvas.summary.disclaimer_bottom = Some(cursor.y());
        remaining = rest;
        fresh_page = false;
    }
    cursor.finish();

    // Phase 6: footers, now that the page count is known
    let page_count = pages.len();
    for (i, canvas) in pages.iter_mut().enumerate() {
        chrome.draw_footer(&mut canvas.content, &mut canvas.links, i + 1, page_count);
        canvas.summary.footer = true;
    }

    let t_layout = t0.elapsed();

    // Phase 7: assembly
    let n = pages.len();
    let page_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
    let content_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();

    let mut summaries = Vec::with_capacity(n);
    let mut page_annot_refs: Vec<Vec<Ref>> = Vec::with_capacity(n);
    for (i, canvas) in pages.into_iter().enumerate() {
        let refs: Vec<Ref> = canvas
            .links
            .iter()
            .map(|link| {
                let annot_ref = alloc();
                let mut annot = pdf.annotation(annot_ref);
                annot
                    .subtype(pdf_writer::types::AnnotationType::Link)
                    .rect(link.rect)
                    .border(0.0, 0.0, 0.0, None);
                annot
                    .action()
                    .action_type(pdf_writer::types::ActionType::Uri)
                    .uri(Str(link.url.as_bytes()));
                annot_ref
            })
            .collect();

        let raw = canvas.content.finish();
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
        pdf.stream(content_ids[i], &compressed).filter(Filter::FlateDecode);

        let mut summary = canvas.summary;
        summary.links = refs.len();
        summaries.push(summary);
        page_annot_refs.push(refs);
    }

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(n as i32);

    for i in 0..n {
        let mut page = pdf.page(page_ids[i]);
        page.media_box(Rect::new(0.0, 0.0, geometry.width, geometry.height))
            .parent(pages_id)
            .contents(content_ids[i]);
        if !page_annot_refs[i].is_empty() {
            page.annotations(page_annot_refs[i].iter().copied());
        }
        let mut resources = page.resources();
        {
            let mut font_dict = resources.fonts();
            for (name, font_ref) in fonts.resource_pairs() {
                font_dict.pair(Name(name.as_bytes()), font_ref);
            }
        }
        if let Some(xobj_ref) = logo_ref {
            resources.x_objects().pair(Name(b"Im1"), xobj_ref);
        }
    }

    let meta = &request.metadata;
    let title = format!("Cotización N° {}", meta.quote_number);
    let created = meta.created_at;
    pdf.document_info(info_id)
        .title(TextStr(&title))
        .author(TextStr(&config.seller.name))
        .producer(TextStr("quote-pdf"))
        .creation_date(
            Date::new(created.year().clamp(0, 9999) as u16)
                .month(created.month() as u8)
                .day(created.day() as u8)
                .hour(created.hour() as u8)
                .minute(created.minute() as u8)
                .second(created.second() as u8)
                .utc_offset_hour(0),
        );

    let bytes = pdf.finish();
    if !bytes.starts_with(b"%PDF-") {
        return Err(Error::Pdf("writer produced no PDF header".into()));
    }
    let t_assembly = t0.elapsed();

    log::info!(
        "Render phases: assets={:.1}ms, layout={:.1}ms, assembly={:.1}ms ({} items, {} pages)",
        t_assets.as_secs_f64() * 1000.0,
        (t_layout - t_assets).as_secs_f64() * 1000.0,
        (t_assembly - t_layout).as_secs_f64() * 1000.0,
        request.items.len(),
        n,
    );

    let row_heights = row_layouts.iter().map(|r| r.height).collect();
    Ok(QuoteDocument {
        bytes,
        pages: summaries,
        row_heights,
        totals,
        logo_embedded: logo_ref.is_some(),
        fallback_fonts: fonts.uses_fallback(),
    })
}
