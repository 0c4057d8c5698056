//! Page furniture: header and footer bands on every page, and the title,
//! client details and description that open the first page.

use chrono::{DateTime, TimeDelta, Utc};
use pdf_writer::{Content, Name};

use crate::config::{PageGeometry, SellerProfile};
use crate::fonts::{FontSet, FontStyle};
use crate::model::QuoteDocumentRequest;

use super::layout::{
    ACCENT, ACCENT_LIGHT, Align, LayoutBox, LinkAnnotation, MUTED, Padding, TEXT, TextMeasure,
    draw_aligned, draw_lines, draw_text, hline, link_over_text, wrap_text,
};

const LINK_PAD: f32 = 2.0;
const MAX_DESCRIPTION_LINES: usize = 14;

pub(super) struct PlacedLogo {
    pub(super) pdf_name: String,
    pub(super) width: f32,
    pub(super) height: f32,
}

pub(super) struct PageChrome<'a> {
    pub(super) fonts: &'a FontSet,
    pub(super) geometry: &'a PageGeometry,
    pub(super) seller: &'a SellerProfile,
    pub(super) logo: Option<PlacedLogo>,
}

impl PageChrome<'_> {
    fn band(&self) -> LayoutBox {
        let g = self.geometry;
        LayoutBox::new(g.side_margin, g.height - 14.0, g.content_width(), g.header_height - 18.0)
    }

    /// Logo on the left, seller contact bar on the right, accent rule below.
    pub(super) fn draw_header(&self, content: &mut Content, links: &mut Vec<LinkAnnotation>) {
        let band = self.band();
        let regular = self.fonts.get(FontStyle::Regular);
        let bold = self.fonts.get(FontStyle::Bold);

        match &self.logo {
            Some(logo) => {
                let y = band.top - logo.height;
                content.save_state();
                content.transform([logo.width, 0.0, 0.0, logo.height, band.x, y]);
                content.x_object(Name(logo.pdf_name.as_bytes()));
                content.restore_state();
            }
            None if !self.seller.name.is_empty() => {
                let baseline = band.top - bold.ascent(15.0);
                draw_text(content, bold, 15.0, band.x, baseline, &self.seller.name, ACCENT);
            }
            None => {}
        }

        let contact_line = [self.seller.email.as_str(), self.seller.phone.as_str()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("  ·  ");
        let mut baseline = band.top - bold.ascent(9.0);
        if !self.seller.name.is_empty() {
            draw_aligned(content, bold, 9.0, &band, baseline, &self.seller.name, Align::Right, TEXT);
            baseline -= 11.0;
        }
        for line in [self.seller.address.as_str(), contact_line.as_str()] {
            if line.is_empty() {
                continue;
            }
            draw_aligned(content, regular, 8.0, &band, baseline, line, Align::Right, MUTED);
            baseline -= 10.0;
        }
        if let Some(uri) = self.seller.website_uri() {
            let site = self.seller.website.trim();
            let x = draw_aligned(content, regular, 8.0, &band, baseline, site, Align::Right, ACCENT);
            let w = regular.text_width(site, 8.0);
            links.extend(link_over_text(x, baseline, w, 8.0, LINK_PAD, &uri));
        }

        let rule_y = self.geometry.height - self.geometry.header_height;
        hline(content, band.x, band.right(), rule_y, ACCENT, 1.2);
    }

    /// Seller strip on the left, website in the middle, page counter on the right.
    pub(super) fn draw_footer(
        &self,
        content: &mut Content,
        links: &mut Vec<LinkAnnotation>,
        page_number: usize,
        page_count: usize,
    ) {
        let g = self.geometry;
        let regular = self.fonts.get(FontStyle::Regular);
        let strip = LayoutBox::new(g.side_margin, g.footer_height, g.content_width(), g.footer_height);
        hline(content, strip.x, strip.right(), strip.top, ACCENT, 0.8);

        let baseline = strip.top - 14.0;
        let left = [self.seller.name.as_str(), self.seller.phone.as_str(), self.seller.email.as_str()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("  |  ");
        draw_aligned(content, regular, 7.5, &strip, baseline, &left, Align::Left, MUTED);

        if let Some(uri) = self.seller.website_uri() {
            let site = self.seller.website.trim();
            let x = draw_aligned(content, regular, 7.5, &strip, baseline - 10.0, site, Align::Left, ACCENT);
            let w = regular.text_width(site, 7.5);
            links.extend(link_over_text(x, baseline - 10.0, w, 7.5, LINK_PAD, &uri));
        }

        let counter = format!("Página {page_number} de {page_count}");
        draw_aligned(content, regular, 7.5, &strip, baseline, &counter, Align::Right, MUTED);
    }
}

/// Quote number and dates; returns the height used.
pub(super) fn draw_title(
    content: &mut Content,
    fonts: &FontSet,
    geometry: &PageGeometry,
    request: &QuoteDocumentRequest,
    top: f32,
) -> f32 {
    let bold = fonts.get(FontStyle::Bold);
    let regular = fonts.get(FontStyle::Regular);
    let area = LayoutBox::new(geometry.side_margin, top, geometry.content_width(), 30.0);
    let meta = &request.metadata;

    let title = format!("COTIZACIÓN N° {}", meta.quote_number);
    let baseline = top - bold.ascent(15.0);
    draw_text(content, bold, 15.0, area.x, baseline, &title, ACCENT);

    let date = format!("Fecha: {}", meta.created_at.format("%d/%m/%Y"));
    draw_aligned(content, regular, 8.5, &area, top - 9.0, &date, Align::Right, TEXT);
    let correlative = format!("Correlativo: {}", meta.correlative_id);
    draw_aligned(content, regular, 8.5, &area, top - 20.0, &correlative, Align::Right, TEXT);
    area.height
}

const FIELD_LABEL_WIDTH: f32 = 68.0;
const FIELD_LINE_HEIGHT: f32 = 11.0;
const MAX_FIELD_LINES: usize = 3;

struct Field<'a> {
    label: &'a str,
    lines: Vec<String>,
}

/// Wrap each value to the value column, keeping at most [`MAX_FIELD_LINES`]
/// lines per value.
fn wrap_fields<'a>(
    measure: &impl TextMeasure,
    value_width: f32,
    fields: Vec<(&'a str, String)>,
) -> Vec<Field<'a>> {
    fields
        .into_iter()
        .map(|(label, value)| {
            let mut lines = wrap_text(&value, measure, 8.0, value_width);
            if lines.len() > MAX_FIELD_LINES {
                log::warn!(
                    "{label} takes {} lines; showing the first {MAX_FIELD_LINES}",
                    lines.len()
                );
                lines.truncate(MAX_FIELD_LINES);
                if let Some(last) = lines.last_mut() {
                    last.push('…');
                }
            }
            if lines.is_empty() {
                lines.push("-".to_string());
            }
            Field { label, lines }
        })
        .collect()
}

fn field_lines(fields: &[Field]) -> usize {
    fields.iter().map(|f| f.lines.len()).sum()
}

fn draw_field_column(
    content: &mut Content,
    fonts: &FontSet,
    area: LayoutBox,
    heading: &str,
    fields: &[Field],
) {
    let bold = fonts.get(FontStyle::Bold);
    let regular = fonts.get(FontStyle::Regular);
    let mut baseline = area.top - bold.ascent(9.0);
    draw_text(content, bold, 9.0, area.x, baseline, heading, ACCENT);
    baseline -= 14.0;
    for field in fields {
        let label = format!("{}:", field.label);
        draw_text(content, bold, 8.0, area.x, baseline, &label, TEXT);
        for line in &field.lines {
            draw_text(content, regular, 8.0, area.x + FIELD_LABEL_WIDTH, baseline, line, TEXT);
            baseline -= FIELD_LINE_HEIGHT;
        }
    }
}

/// Client fields on the left, quote terms on the right; returns the height used.
pub(super) fn draw_contact_block(
    content: &mut Content,
    fonts: &FontSet,
    geometry: &PageGeometry,
    request: &QuoteDocumentRequest,
    validity_days: u32,
    top: f32,
) -> f32 {
    let contact = &request.contact;
    let meta = &request.metadata;

    let mut client: Vec<(&str, String)> = vec![
        ("Empresa", contact.company.clone()),
        ("Contacto", contact.contact_name.clone()),
    ];
    if let Some(tax_id) = contact.tax_id.as_ref().filter(|t| !t.trim().is_empty()) {
        client.push(("RUT", tax_id.clone()));
    }
    client.push(("Dirección", contact.address.clone()));
    client.push(("Email", contact.email.clone()));
    client.push(("Teléfono", contact.phone.clone()));

    let mut terms: Vec<(&str, String)> =
        vec![("Emisión", meta.created_at.format("%d/%m/%Y").to_string())];
    match valid_until(meta.created_at, validity_days) {
        Some(date) => terms.push(("Válida hasta", date.format("%d/%m/%Y").to_string())),
        None => log::warn!(
            "Validity of {validity_days} days from {} is out of range; omitting the expiry date",
            meta.created_at
        ),
    }
    if let Some(t) = meta.execution_time.as_ref().filter(|t| !t.trim().is_empty()) {
        terms.push(("Ejecución", t.clone()));
    }
    if let Some(p) = meta.payment_method.as_ref().filter(|p| !p.trim().is_empty()) {
        terms.push(("Forma de pago", p.clone()));
    }

    let padding = Padding::uniform(8.0);
    let outer = LayoutBox::new(geometry.side_margin, top, geometry.content_width(), 0.0);
    let inner_width = outer.inset(padding).width;
    let gutter = 12.0;
    let column_width = (inner_width - gutter) / 2.0;
    let value_width = (column_width - FIELD_LABEL_WIDTH).max(1.0);

    let regular = fonts.get(FontStyle::Regular);
    let client = wrap_fields(regular, value_width, client);
    let terms = wrap_fields(regular, value_width, terms);

    let rows = field_lines(&client).max(field_lines(&terms)) as f32;
    let height = padding.top + 14.0 + rows * FIELD_LINE_HEIGHT + padding.bottom - 3.0;
    let block = LayoutBox::new(outer.x, top, outer.width, height);
    block.fill(content, ACCENT_LIGHT);

    let columns = block
        .inset(padding)
        .split_columns(&[column_width, gutter, column_width]);
    draw_field_column(content, fonts, columns[0], "CLIENTE", &client);
    draw_field_column(content, fonts, columns[2], "CONDICIONES", &terms);
    height
}

/// Expiry date of the quote, or `None` when it falls outside the calendar.
fn valid_until(created_at: DateTime<Utc>, validity_days: u32) -> Option<DateTime<Utc>> {
    TimeDelta::try_days(i64::from(validity_days))
        .and_then(|days| created_at.checked_add_signed(days))
}

/// Free-text description, wrapped to the page width; returns the height used
/// (zero when the quote has none).
pub(super) fn draw_description(
    content: &mut Content,
    fonts: &FontSet,
    geometry: &PageGeometry,
    description: Option<&str>,
    top: f32,
) -> f32 {
    let Some(text) = description.map(str::trim).filter(|d| !d.is_empty()) else {
        return 0.0;
    };
    let bold = fonts.get(FontStyle::Bold);
    let regular = fonts.get(FontStyle::Regular);
    let mut region = LayoutBox::new(geometry.side_margin, top, geometry.content_width(), f32::MAX);

    let heading = region.take_top(14.0);
    draw_text(content, bold, 9.0, heading.x, heading.top - bold.ascent(9.0), "Descripción", ACCENT);

    let mut lines: Vec<String> = text
        .lines()
        .flat_map(|para| wrap_text(para, regular, 8.5, region.width))
        .collect();
    if lines.len() > MAX_DESCRIPTION_LINES {
        log::warn!(
            "Description has {} lines; showing the first {MAX_DESCRIPTION_LINES}",
            lines.len()
        );
        lines.truncate(MAX_DESCRIPTION_LINES);
        if let Some(last) = lines.last_mut() {
            last.push('…');
        }
    }
    let used = draw_lines(content, regular, 8.5, 11.0, region.x, region.top, &lines, TEXT);
    14.0 + used
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    struct Mono;

    impl TextMeasure for Mono {
        fn text_width(&self, text: &str, _font_size: f32) -> f32 {
            text.chars().count() as f32 * 5.0
        }
    }

    #[test]
    fn validity_is_added_in_whole_days() {
        let created = Utc.with_ymd_and_hms(2024, 12, 20, 9, 0, 0).unwrap();
        let until = valid_until(created, 15).unwrap();
        assert_eq!(until, Utc.with_ymd_and_hms(2025, 1, 4, 9, 0, 0).unwrap());
    }

    #[test]
    fn validity_beyond_the_calendar_is_none() {
        let created = Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap();
        assert_eq!(valid_until(created, u32::MAX), None);
    }

    #[test]
    fn field_values_keep_every_wrapped_line_up_to_the_cap() {
        let fields = wrap_fields(
            &Mono,
            30.0,
            vec![
                ("Dirección", "aaaa bbbb cccc".to_string()),
                ("Empresa", "aaaa bbbb cccc dddd eeee".to_string()),
                ("Email", "   ".to_string()),
            ],
        );
        assert_eq!(fields[0].lines, vec!["aaaa", "bbbb", "cccc"]);
        assert_eq!(fields[1].lines, vec!["aaaa", "bbbb", "cccc…"]);
        assert_eq!(fields[2].lines, vec!["-"]);
        assert_eq!(field_lines(&fields), 7);
    }
}
