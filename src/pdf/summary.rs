use pdf_writer::Content;

use crate::fonts::{FontSet, FontStyle};
use crate::totals::{Totals, format_money, format_percent};

use super::layout::{
    ACCENT, Align, LayoutBox, MUTED, Padding, TEXT, WHITE, draw_aligned, draw_lines, draw_text,
    hline, wrap_text,
};

/// Space the totals box is assumed to need when deciding whether it still
/// fits on the current page.
pub(crate) const TOTALS_BOX_HEIGHT: f32 = 85.0;
/// Least space reserved for the disclaimer, even when its text is short.
pub(crate) const DISCLAIMER_MIN_HEIGHT: f32 = 60.0;
pub(crate) const DISCLAIMER_HEADING_HEIGHT: f32 = 16.0;
pub(crate) const DISCLAIMER_LINE_HEIGHT: f32 = 9.5;
pub(crate) const SECTION_GAP: f32 = 12.0;

const TOTALS_WIDTH: f32 = 220.0;
const TOTALS_ROW_HEIGHT: f32 = 15.0;
const DISCLAIMER_FONT_SIZE: f32 = 7.5;

fn tax_label(tax_rate: f64) -> String {
    let percent = (tax_rate * 1000.0).round() / 10.0;
    format!("IVA {}", format_percent(percent))
}

/// Right-aligned box with gross, discount, net, tax and grand total. Returns
/// the height used.
pub(super) fn draw_totals(
    content: &mut Content,
    fonts: &FontSet,
    table_right: f32,
    top: f32,
    totals: &Totals,
    tax_rate: f64,
) -> f32 {
    let regular = fonts.get(FontStyle::Regular);
    let bold = fonts.get(FontStyle::Bold);

    let mut rows: Vec<(String, String)> = vec![("Subtotal".into(), format_money(totals.gross))];
    if totals.discount != 0 {
        rows.push(("Descuento".into(), format_money(-totals.discount)));
    }
    rows.push(("Neto".into(), format_money(totals.net)));
    rows.push((tax_label(tax_rate), format_money(totals.tax)));

    let height = (rows.len() + 1) as f32 * TOTALS_ROW_HEIGHT + 6.0;
    let mut region = LayoutBox::new(table_right - TOTALS_WIDTH, top, TOTALS_WIDTH, height);
    region.stroke(content, ACCENT, 0.8);

    let pad = Padding::symmetric(0.0, 8.0);
    region.take_top(3.0);
    for (label, value) in &rows {
        let row = region.take_top(TOTALS_ROW_HEIGHT).inset(pad);
        let baseline = row.top - TOTALS_ROW_HEIGHT / 2.0 - 8.5 * 0.35;
        draw_aligned(content, regular, 8.5, &row, baseline, label, Align::Left, TEXT);
        draw_aligned(content, regular, 8.5, &row, baseline, value, Align::Right, TEXT);
    }

    let total_band = region.take_top(TOTALS_ROW_HEIGHT);
    total_band.fill(content, ACCENT);
    let row = total_band.inset(pad);
    let baseline = row.top - TOTALS_ROW_HEIGHT / 2.0 - 9.5 * 0.35;
    draw_aligned(content, bold, 9.5, &row, baseline, "TOTAL", Align::Left, WHITE);
    draw_aligned(
        content,
        bold,
        9.5,
        &row,
        baseline,
        &format_money(totals.grand_total),
        Align::Right,
        WHITE,
    );
    height
}

/// Wrap the legal notice to the table width.
pub(super) fn wrap_disclaimer(fonts: &FontSet, width: f32, text: &str) -> Vec<String> {
    wrap_text(text, fonts.get(FontStyle::Regular), DISCLAIMER_FONT_SIZE, width)
}

/// Height of the heading plus every wrapped line, floored at
/// [`DISCLAIMER_MIN_HEIGHT`].
pub(super) fn disclaimer_height(lines: &[String]) -> f32 {
    (DISCLAIMER_HEADING_HEIGHT + lines.len() as f32 * DISCLAIMER_LINE_HEIGHT)
        .max(DISCLAIMER_MIN_HEIGHT)
}

/// Rule and heading above the legal notice. Returns the height used.
pub(super) fn draw_disclaimer_heading(
    content: &mut Content,
    fonts: &FontSet,
    x: f32,
    width: f32,
    top: f32,
) -> f32 {
    let bold = fonts.get(FontStyle::Bold);
    hline(content, x, x + width, top, MUTED, 0.4);
    let heading_baseline = top - 4.0 - bold.ascent(8.0);
    draw_text(content, bold, 8.0, x, heading_baseline, "Condiciones generales", TEXT);
    DISCLAIMER_HEADING_HEIGHT
}

/// A run of wrapped disclaimer lines. Returns the height used.
pub(super) fn draw_disclaimer_lines(
    content: &mut Content,
    fonts: &FontSet,
    x: f32,
    top: f32,
    lines: &[String],
) -> f32 {
    draw_lines(
        content,
        fonts.get(FontStyle::Regular),
        DISCLAIMER_FONT_SIZE,
        DISCLAIMER_LINE_HEIGHT,
        x,
        top,
        lines,
        MUTED,
    )
}
