use pdf_writer::Content;

use crate::fonts::{FontEntry, FontSet, FontStyle};
use crate::model::LineItem;
use crate::totals::{format_money, format_percent, format_quantity};
use crate::units::format_unit;

use super::cursor::TableBorder;
use super::layout::{
    ACCENT, ACCENT_LIGHT, Align, LayoutBox, MUTED, Padding, TEXT, TextMeasure, WHITE, draw_aligned,
    draw_lines, hline, wrap_text,
};

pub(crate) struct ColumnSpec {
    pub(crate) title: &'static str,
    pub(crate) percent: f32,
    pub(crate) align: Align,
}

pub(crate) const COLUMNS: [ColumnSpec; 8] = [
    ColumnSpec { title: "N°", percent: 5.0, align: Align::Center },
    ColumnSpec { title: "Código", percent: 12.0, align: Align::Left },
    ColumnSpec { title: "Descripción", percent: 36.0, align: Align::Left },
    ColumnSpec { title: "Unidad", percent: 9.0, align: Align::Center },
    ColumnSpec { title: "Cant.", percent: 7.0, align: Align::Center },
    ColumnSpec { title: "P. Unitario", percent: 11.0, align: Align::Right },
    ColumnSpec { title: "Dcto.", percent: 7.0, align: Align::Center },
    ColumnSpec { title: "Total", percent: 13.0, align: Align::Right },
];

/// Index of the column holding name and characteristics.
pub(crate) const DESCRIPTION_COLUMN: usize = 2;

pub(crate) const ROW_FONT_SIZE: f32 = 8.0;
pub(crate) const ROW_LINE_HEIGHT: f32 = 10.0;
pub(crate) const ROW_PADDING: Padding = Padding::symmetric(5.0, 4.0);
/// Gap between the name and the characteristics when both are present.
pub(crate) const NAME_SPACER: f32 = 3.0;
pub(crate) const MIN_ROW_HEIGHT: f32 = 22.0;
const HEADER_FONT_SIZE: f32 = 8.0;

/// Split `available` by percentage. Each column is floored to whole points
/// and to `min_width`; the difference is then handed to (or taken from) the
/// trailing columns so the widths add up to exactly `available`.
pub(crate) fn compute_column_widths(available: f32, percents: &[f32], min_width: f32) -> Vec<f32> {
    let n = percents.len();
    if n == 0 {
        return Vec::new();
    }
    if available < min_width * n as f32 {
        log::warn!(
            "Table width {available:.1}pt cannot give {n} columns {min_width:.1}pt each; splitting evenly"
        );
        let mut widths = vec![available / n as f32; n];
        widths[n - 1] = available - widths[..n - 1].iter().sum::<f32>();
        return widths;
    }

    let mut widths: Vec<f32> = percents
        .iter()
        .map(|p| (available * p / 100.0).floor().max(min_width))
        .collect();

    let mut leftover = available - widths.iter().sum::<f32>();
    if leftover >= 1.0 {
        let whole = leftover.floor() as usize;
        for k in 0..whole {
            widths[n - 1 - (k % n)] += 1.0;
        }
    } else if leftover < 0.0 {
        for w in widths.iter_mut().rev() {
            let take = (*w - min_width).max(0.0).min(-leftover);
            *w -= take;
            leftover += take;
            if leftover >= 0.0 {
                break;
            }
        }
    }

    // The last column absorbs the fractional remainder.
    widths[n - 1] = available - widths[..n - 1].iter().sum::<f32>();
    widths
}

pub(crate) fn row_height(name_lines: usize, characteristic_lines: usize) -> f32 {
    let spacer = if name_lines > 0 && characteristic_lines > 0 {
        NAME_SPACER
    } else {
        0.0
    };
    let text_h = (name_lines + characteristic_lines) as f32 * ROW_LINE_HEIGHT;
    (text_h + spacer + ROW_PADDING.top + ROW_PADDING.bottom).max(MIN_ROW_HEIGHT)
}

pub(crate) struct RowLayout {
    pub(crate) name_lines: Vec<String>,
    pub(crate) characteristic_lines: Vec<String>,
    pub(crate) height: f32,
}

/// Wrap the item's name and characteristics into the description column and
/// size the row from the resulting line count.
pub(crate) fn layout_row(
    item: &LineItem,
    bold: &impl TextMeasure,
    regular: &impl TextMeasure,
    description_width: f32,
) -> RowLayout {
    let inner = description_width - ROW_PADDING.left - ROW_PADDING.right;
    let name_lines = wrap_text(&item.name, bold, ROW_FONT_SIZE, inner);
    let characteristic_lines: Vec<String> = item
        .characteristics
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .flat_map(|c| wrap_text(&format!("• {c}"), regular, ROW_FONT_SIZE, inner))
        .collect();
    let height = row_height(name_lines.len(), characteristic_lines.len());
    RowLayout {
        name_lines,
        characteristic_lines,
        height,
    }
}

/// Longest prefix of `text` that fits `width`, with an ellipsis when cut.
fn fit_single_line(text: &str, font: &FontEntry, font_size: f32, width: f32) -> String {
    if font.text_width(text, font_size) <= width {
        return text.to_string();
    }
    let mut out = String::new();
    for ch in text.chars() {
        out.push(ch);
        out.push('…');
        let too_wide = font.text_width(&out, font_size) > width;
        out.pop();
        if too_wide {
            out.pop();
            break;
        }
    }
    out.push('…');
    out
}

pub(crate) fn draw_column_headers(
    content: &mut Content,
    fonts: &FontSet,
    band: LayoutBox,
    widths: &[f32],
) {
    band.fill(content, ACCENT);
    let bold = fonts.get(FontStyle::Bold);
    let baseline = band.top - band.height / 2.0 - HEADER_FONT_SIZE * 0.35;
    for (spec, cell) in COLUMNS.iter().zip(band.split_columns(widths)) {
        let inner = cell.inset(ROW_PADDING);
        draw_aligned(
            content,
            bold,
            HEADER_FONT_SIZE,
            &inner,
            baseline,
            spec.title,
            spec.align,
            WHITE,
        );
    }
}

pub(crate) fn draw_row(
    content: &mut Content,
    fonts: &FontSet,
    row_box: LayoutBox,
    widths: &[f32],
    index: usize,
    item: &LineItem,
    layout: &RowLayout,
    subtotal: i64,
) {
    if index % 2 == 1 {
        row_box.fill(content, ACCENT_LIGHT);
    }
    let regular = fonts.get(FontStyle::Regular);
    let bold = fonts.get(FontStyle::Bold);
    let cells = row_box.split_columns(widths);
    let baseline = row_box.top - ROW_PADDING.top - regular.ascent(ROW_FONT_SIZE);

    let unit = format_unit(item.unit_size.as_deref(), item.measurement_unit.as_deref());
    let discount = if item.discount_percent > 0.0 {
        format_percent(item.discount_percent)
    } else {
        "-".to_string()
    };
    let values: [String; 8] = [
        (index + 1).to_string(),
        item.sku.clone().filter(|s| !s.trim().is_empty()).unwrap_or_else(|| "-".into()),
        String::new(),
        if unit.is_empty() { "-".into() } else { unit },
        format_quantity(item.quantity),
        format_money(item.unit_price.round() as i64),
        discount,
        format_money(subtotal),
    ];

    for (col, ((spec, cell), value)) in COLUMNS.iter().zip(&cells).zip(values).enumerate() {
        let inner = cell.inset(ROW_PADDING);
        if col == DESCRIPTION_COLUMN {
            let used = draw_lines(
                content,
                bold,
                ROW_FONT_SIZE,
                ROW_LINE_HEIGHT,
                inner.x,
                inner.top,
                &layout.name_lines,
                TEXT,
            );
            let spacer = if used > 0.0 { NAME_SPACER } else { 0.0 };
            draw_lines(
                content,
                regular,
                ROW_FONT_SIZE,
                ROW_LINE_HEIGHT,
                inner.x,
                inner.top - used - spacer,
                &layout.characteristic_lines,
                MUTED,
            );
            continue;
        }
        let shown = fit_single_line(&value, regular, ROW_FONT_SIZE, inner.width);
        draw_aligned(
            content,
            regular,
            ROW_FONT_SIZE,
            &inner,
            baseline,
            &shown,
            spec.align,
            TEXT,
        );
    }

    hline(
        content,
        row_box.x,
        row_box.right(),
        row_box.bottom(),
        [0xCC, 0xCC, 0xCC],
        0.4,
    );
}

pub(crate) fn draw_table_border(content: &mut Content, border: &TableBorder) {
    border.rect.stroke(content, ACCENT, 0.8);
}
