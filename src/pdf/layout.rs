use pdf_writer::{Content, Name, Rect, Str};

use crate::fonts::FontEntry;

pub(super) type Rgb = [u8; 3];

pub(super) const ACCENT: Rgb = [0x1F, 0x4E, 0x79];
pub(super) const ACCENT_LIGHT: Rgb = [0xE8, 0xEF, 0xF6];
pub(super) const TEXT: Rgb = [0x22, 0x22, 0x22];
pub(super) const MUTED: Rgb = [0x66, 0x66, 0x66];
pub(super) const WHITE: Rgb = [0xFF, 0xFF, 0xFF];

/// Horizontal measurement of a string in a font at a size, in points.
pub(crate) trait TextMeasure {
    fn text_width(&self, text: &str, font_size: f32) -> f32;
}

impl TextMeasure for FontEntry {
    fn text_width(&self, text: &str, font_size: f32) -> f32 {
        self.word_width(text, font_size)
    }
}

/// Greedy word wrap against measured glyph widths. A word that cannot fit on
/// a line by itself is broken between characters. Empty input has no lines.
pub(crate) fn wrap_text(
    text: &str,
    measure: &impl TextMeasure,
    font_size: f32,
    max_width: f32,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if measure.text_width(&candidate, font_size) <= max_width {
            current = candidate;
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if measure.text_width(word, font_size) <= max_width {
            current = word.to_string();
            continue;
        }
        for ch in word.chars() {
            current.push(ch);
            if current.chars().count() > 1 && measure.text_width(&current, font_size) > max_width {
                current.pop();
                lines.push(std::mem::take(&mut current));
                current.push(ch);
            }
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct Padding {
    pub(crate) top: f32,
    pub(crate) right: f32,
    pub(crate) bottom: f32,
    pub(crate) left: f32,
}

impl Padding {
    pub(crate) const fn uniform(v: f32) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub(crate) const fn symmetric(vertical: f32, horizontal: f32) -> Self {
        Self {
            top: vertical,
            right: horizontal,
            bottom: vertical,
            left: horizontal,
        }
    }
}

/// A rectangular region in page space. `top` is the upper edge (PDF y grows
/// upward), so a box occupies `top - height ..= top`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct LayoutBox {
    pub(crate) x: f32,
    pub(crate) top: f32,
    pub(crate) width: f32,
    pub(crate) height: f32,
}

impl LayoutBox {
    pub(crate) fn new(x: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            top,
            width,
            height,
        }
    }

    pub(crate) fn bottom(&self) -> f32 {
        self.top - self.height
    }

    pub(crate) fn right(&self) -> f32 {
        self.x + self.width
    }

    pub(crate) fn inset(&self, p: Padding) -> Self {
        Self {
            x: self.x + p.left,
            top: self.top - p.top,
            width: (self.width - p.left - p.right).max(0.0),
            height: (self.height - p.top - p.bottom).max(0.0),
        }
    }

    /// Cut a band of `height` off the top; `self` keeps the remainder.
    pub(crate) fn take_top(&mut self, height: f32) -> LayoutBox {
        let h = height.min(self.height);
        let band = LayoutBox::new(self.x, self.top, self.width, h);
        self.top -= h;
        self.height -= h;
        band
    }

    /// Side-by-side boxes of the given widths, starting at the left edge.
    pub(crate) fn split_columns(&self, widths: &[f32]) -> Vec<LayoutBox> {
        let mut x = self.x;
        widths
            .iter()
            .map(|&w| {
                let col = LayoutBox::new(x, self.top, w, self.height);
                x += w;
                col
            })
            .collect()
    }

    pub(crate) fn fill(&self, content: &mut Content, color: Rgb) {
        content.save_state();
        set_fill(content, color);
        content.rect(self.x, self.bottom(), self.width, self.height);
        content.fill_nonzero();
        content.restore_state();
    }

    pub(crate) fn stroke(&self, content: &mut Content, color: Rgb, line_width: f32) {
        content.save_state();
        set_stroke(content, color);
        content.set_line_width(line_width);
        content.rect(self.x, self.bottom(), self.width, self.height);
        content.stroke();
        content.restore_state();
    }
}

fn unit(c: u8) -> f32 {
    c as f32 / 255.0
}

pub(super) fn set_fill(content: &mut Content, [r, g, b]: Rgb) {
    content.set_fill_rgb(unit(r), unit(g), unit(b));
}

pub(super) fn set_stroke(content: &mut Content, [r, g, b]: Rgb) {
    content.set_stroke_rgb(unit(r), unit(g), unit(b));
}

pub(super) fn hline(content: &mut Content, x1: f32, x2: f32, y: f32, color: Rgb, width: f32) {
    content.save_state();
    set_stroke(content, color);
    content.set_line_width(width);
    content.move_to(x1, y);
    content.line_to(x2, y);
    content.stroke();
    content.restore_state();
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Align {
    Left,
    Center,
    Right,
}

pub(super) fn draw_text(
    content: &mut Content,
    font: &FontEntry,
    font_size: f32,
    x: f32,
    baseline: f32,
    text: &str,
    color: Rgb,
) {
    if text.is_empty() {
        return;
    }
    content.save_state();
    set_fill(content, color);
    content.begin_text();
    content.set_font(Name(font.pdf_name.as_bytes()), font_size);
    content.next_line(x, baseline);
    content.show(Str(&font.encode(text)));
    content.end_text();
    content.restore_state();
}

/// Draw `text` inside `area` horizontally; returns the x it started at.
pub(super) fn draw_aligned(
    content: &mut Content,
    font: &FontEntry,
    font_size: f32,
    area: &LayoutBox,
    baseline: f32,
    text: &str,
    align: Align,
    color: Rgb,
) -> f32 {
    let w = font.text_width(text, font_size);
    let x = match align {
        Align::Left => area.x,
        Align::Center => area.x + (area.width - w) / 2.0,
        Align::Right => area.right() - w,
    };
    draw_text(content, font, font_size, x, baseline, text, color);
    x
}

/// Draw pre-wrapped lines top-down starting at `top`; returns the height used.
pub(super) fn draw_lines(
    content: &mut Content,
    font: &FontEntry,
    font_size: f32,
    line_h: f32,
    x: f32,
    top: f32,
    lines: &[String],
    color: Rgb,
) -> f32 {
    let ascent = font.ascent(font_size);
    for (i, line) in lines.iter().enumerate() {
        let baseline = top - ascent - i as f32 * line_h;
        draw_text(content, font, font_size, x, baseline, line, color);
    }
    lines.len() as f32 * line_h
}

pub(super) struct LinkAnnotation {
    pub(super) rect: Rect,
    pub(super) url: String,
}

/// Clickable region over a drawn text run, grown by `pad` on every side.
/// Links that could not be written as a valid URI action are dropped; the
/// text itself is already on the page.
pub(super) fn link_over_text(
    x: f32,
    baseline: f32,
    text_width: f32,
    font_size: f32,
    pad: f32,
    url: &str,
) -> Option<LinkAnnotation> {
    if url.is_empty() || !url.is_ascii() {
        log::warn!("Skipping link annotation for {url:?}: URI must be non-empty ASCII");
        return None;
    }
    let rect = Rect::new(
        x - pad,
        baseline - font_size * 0.25 - pad,
        x + text_width + pad,
        baseline + font_size * 0.8 + pad,
    );
    if !(rect.x2 > rect.x1 && rect.y2 > rect.y1) || !text_width.is_finite() {
        log::warn!("Skipping link annotation for {url}: empty rectangle");
        return None;
    }
    Some(LinkAnnotation {
        rect,
        url: url.to_string(),
    })
}
