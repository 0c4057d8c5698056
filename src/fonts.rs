use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use memmap2::Mmap;
use pdf_writer::{Name, Pdf, Rect, Ref};
use ttf_parser::Face;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FontStyle {
    Regular,
    Bold,
}

impl FontStyle {
    fn standard_name(self) -> &'static [u8] {
        match self {
            FontStyle::Regular => b"Helvetica",
            FontStyle::Bold => b"Helvetica-Bold",
        }
    }
}

pub(crate) struct FontEntry {
    pub(crate) pdf_name: String,
    pub(crate) font_ref: Ref,
    pub(crate) widths_1000: Vec<f32>,
    pub(crate) ascender_ratio: Option<f32>,
    pub(crate) char_to_gid: Option<HashMap<char, u16>>,
    pub(crate) char_widths_1000: Option<HashMap<char, f32>>,
}

impl FontEntry {
    /// One of the 14 standard fonts, measured with its AFM widths.
    pub(crate) fn standard(style: FontStyle, pdf_name: String, font_ref: Ref) -> Self {
        let widths_1000 = match style {
            FontStyle::Regular => helvetica_widths(),
            FontStyle::Bold => helvetica_bold_widths(),
        };
        Self {
            pdf_name,
            font_ref,
            widths_1000,
            ascender_ratio: None,
            char_to_gid: None,
            char_widths_1000: None,
        }
    }

    pub(crate) fn is_embedded(&self) -> bool {
        self.char_to_gid.is_some()
    }

    /// Width of a single character in 1000-units. Uses the per-char cache (covers
    /// all chars seen in the quote), falls back to the WinAnsi table.
    pub(crate) fn char_width_1000(&self, ch: char) -> f32 {
        if let Some(ref map) = self.char_widths_1000 {
            if let Some(&w) = map.get(&ch) {
                return w;
            }
        }
        let byte = char_to_winansi(ch);
        if byte >= 32 {
            self.widths_1000[(byte - 32) as usize]
        } else {
            0.0
        }
    }

    pub(crate) fn word_width(&self, word: &str, font_size: f32) -> f32 {
        word.chars()
            .map(|ch| self.char_width_1000(ch) * font_size / 1000.0)
            .sum()
    }

    pub(crate) fn ascent(&self, font_size: f32) -> f32 {
        font_size * self.ascender_ratio.unwrap_or(0.72)
    }

    /// Bytes for a `Tj` operand in this font's encoding.
    pub(crate) fn encode(&self, text: &str) -> Vec<u8> {
        match &self.char_to_gid {
            Some(map) => encode_as_gids(text, map),
            None => to_winansi_bytes(text),
        }
    }
}

pub(crate) struct FontSet {
    pub(crate) regular: FontEntry,
    pub(crate) bold: FontEntry,
}

impl FontSet {
    pub(crate) fn get(&self, style: FontStyle) -> &FontEntry {
        match style {
            FontStyle::Regular => &self.regular,
            FontStyle::Bold => &self.bold,
        }
    }

    pub(crate) fn uses_fallback(&self) -> bool {
        !self.regular.is_embedded() || !self.bold.is_embedded()
    }

    pub(crate) fn resource_pairs(&self) -> [(&str, Ref); 2] {
        [
            (self.regular.pdf_name.as_str(), self.regular.font_ref),
            (self.bold.pdf_name.as_str(), self.bold.font_ref),
        ]
    }
}

/// Windows-1252 (WinAnsi) byte to Unicode char mapping.
/// Bytes 0x80-0x9F are remapped; all others map directly to their Unicode codepoint.
fn winansi_to_char(byte: u8) -> char {
    match byte {
        0x80 => '\u{20AC}',
        0x82 => '\u{201A}',
        0x83 => '\u{0192}',
        0x84 => '\u{201E}',
        0x85 => '\u{2026}',
        0x86 => '\u{2020}',
        0x87 => '\u{2021}',
        0x88 => '\u{02C6}',
        0x89 => '\u{2030}',
        0x8A => '\u{0160}',
        0x8B => '\u{2039}',
        0x8C => '\u{0152}',
        0x8E => '\u{017D}',
        0x91 => '\u{2018}',
        0x92 => '\u{2019}',
        0x93 => '\u{201C}',
        0x94 => '\u{201D}',
        0x95 => '\u{2022}', // bullet
        0x96 => '\u{2013}',
        0x97 => '\u{2014}',
        0x98 => '\u{02DC}',
        0x99 => '\u{2122}',
        0x9A => '\u{0161}',
        0x9B => '\u{203A}',
        0x9C => '\u{0153}',
        0x9E => '\u{017E}',
        0x9F => '\u{0178}',
        _ => byte as char,
    }
}

/// Map a single Unicode char to its WinAnsi byte, or 0 if unmappable.
fn char_to_winansi(c: char) -> u8 {
    match c as u32 {
        0x0020..=0x007F => c as u8,
        0x00A0..=0x00FF => c as u8,
        0x20AC => 0x80,
        0x201A => 0x82,
        0x0192 => 0x83,
        0x201E => 0x84,
        0x2026 => 0x85,
        0x2020 => 0x86,
        0x2021 => 0x87,
        0x02C6 => 0x88,
        0x2030 => 0x89,
        0x0160 => 0x8A,
        0x2039 => 0x8B,
        0x0152 => 0x8C,
        0x017D => 0x8E,
        0x2018 => 0x91,
        0x2019 => 0x92,
        0x201C => 0x93,
        0x201D => 0x94,
        0x2022 => 0x95,
        0x2013 => 0x96,
        0x2014 => 0x97,
        0x02DC => 0x98,
        0x2122 => 0x99,
        0x0161 => 0x9A,
        0x203A => 0x9B,
        0x0153 => 0x9C,
        0x017E => 0x9E,
        0x0178 => 0x9F,
        _ => 0,
    }
}

/// Convert a UTF-8 string to WinAnsi (Windows-1252) bytes for PDF Str encoding.
/// Unmappable chars are dropped.
pub(crate) fn to_winansi_bytes(s: &str) -> Vec<u8> {
    s.chars()
        .filter_map(|c| match char_to_winansi(c) {
            0 => None,
            b => Some(b),
        })
        .collect()
}

/// Encode UTF-8 text as big-endian 2-byte glyph IDs for CIDFont content streams.
pub(crate) fn encode_as_gids(text: &str, char_to_gid: &HashMap<char, u16>) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() * 2);
    for ch in text.chars() {
        let gid = char_to_gid.get(&ch).copied().unwrap_or(0);
        out.push((gid >> 8) as u8);
        out.push((gid & 0xFF) as u8);
    }
    out
}

/// Adobe Helvetica AFM advance widths for WinAnsi 32..=255; 0 where the code is unassigned.
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 224] = [
     278,  278,  355,  556,  556,  889,  667,  191,  333,  333,  389,  584,  278,  333,  278,  278, // 0x20
     556,  556,  556,  556,  556,  556,  556,  556,  556,  556,  278,  278,  584,  584,  584,  556, // 0x30
    1015,  667,  667,  722,  722,  667,  611,  778,  722,  278,  500,  667,  556,  833,  722,  778, // 0x40
     667,  778,  722,  667,  611,  722,  667,  944,  667,  667,  611,  278,  278,  278,  469,  556, // 0x50
     333,  556,  556,  500,  556,  556,  278,  556,  556,  222,  222,  500,  222,  833,  556,  556, // 0x60
     556,  556,  333,  500,  278,  556,  500,  722,  500,  500,  500,  334,  260,  334,  584,    0, // 0x70
     556,    0,  222,  556,  333, 1000,  556,  556,  333, 1000,  667,  333, 1000,    0,  611,    0, // 0x80
       0,  222,  222,  333,  333,  350,  556, 1000,  333, 1000,  500,  333,  944,    0,  500,  667, // 0x90
     278,  333,  556,  556,  556,  556,  260,  556,  333,  737,  370,  556,  584,  333,  737,  333, // 0xA0
     400,  584,  333,  333,  333,  556,  537,  278,  333,  333,  365,  556,  834,  834,  834,  611, // 0xB0
     667,  667,  667,  667,  667,  667, 1000,  722,  667,  667,  667,  667,  278,  278,  278,  278, // 0xC0
     722,  722,  778,  778,  778,  778,  778,  584,  778,  722,  722,  722,  722,  667,  667,  611, // 0xD0
     556,  556,  556,  556,  556,  556,  889,  500,  556,  556,  556,  556,  278,  278,  278,  278, // 0xE0
     556,  556,  556,  556,  556,  556,  556,  584,  611,  556,  556,  556,  556,  500,  556,  500, // 0xF0
];

/// Adobe Helvetica-Bold AFM advance widths, same layout as [`HELVETICA_WIDTHS`].
#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 224] = [
     278,  333,  474,  556,  556,  889,  722,  238,  333,  333,  389,  584,  278,  333,  278,  278, // 0x20
     556,  556,  556,  556,  556,  556,  556,  556,  556,  556,  333,  333,  584,  584,  584,  611, // 0x30
     975,  722,  722,  722,  722,  667,  611,  778,  722,  278,  556,  722,  611,  833,  722,  778, // 0x40
     667,  778,  722,  667,  611,  722,  667,  944,  667,  667,  611,  333,  278,  333,  584,  556, // 0x50
     333,  556,  611,  556,  611,  556,  333,  611,  611,  278,  278,  556,  278,  889,  611,  611, // 0x60
     611,  611,  389,  556,  333,  611,  556,  778,  556,  556,  500,  389,  280,  389,  584,    0, // 0x70
     556,    0,  278,  556,  500, 1000,  556,  556,  333, 1000,  667,  333, 1000,    0,  611,    0, // 0x80
       0,  278,  278,  500,  500,  350,  556, 1000,  333, 1000,  556,  333,  944,    0,  500,  667, // 0x90
     278,  333,  556,  556,  556,  556,  280,  556,  333,  737,  370,  556,  584,  333,  737,  333, // 0xA0
     400,  584,  333,  333,  333,  611,  556,  278,  333,  333,  365,  556,  834,  834,  834,  611, // 0xB0
     722,  722,  722,  722,  722,  722, 1000,  722,  667,  667,  667,  667,  278,  278,  278,  278, // 0xC0
     722,  722,  778,  778,  778,  778,  778,  584,  778,  722,  722,  722,  722,  667,  667,  611, // 0xD0
     556,  556,  556,  556,  556,  556,  889,  556,  556,  556,  556,  556,  278,  278,  278,  278, // 0xE0
     611,  611,  611,  611,  611,  611,  611,  584,  611,  611,  611,  611,  611,  556,  611,  556, // 0xF0
];


fn helvetica_widths() -> Vec<f32> {
    HELVETICA_WIDTHS.iter().map(|&w| w as f32).collect()
}

fn helvetica_bold_widths() -> Vec<f32> {
    HELVETICA_BOLD_WIDTHS.iter().map(|&w| w as f32).collect()
}

struct EmbeddedMetrics {
    widths_1000: Vec<f32>,
    ascender_ratio: f32,
    char_to_gid: HashMap<char, u16>,
    char_widths_1000: HashMap<char, f32>,
}

fn postscript_name(face: &Face, fallback: &str) -> String {
    for name in face.names() {
        if name.name_id == ttf_parser::name_id::POST_SCRIPT_NAME
            && let Some(s) = name.to_string()
        {
            return s.replace(' ', "");
        }
    }
    fallback.replace(' ', "")
}

/// Embed a TrueType/OpenType font as a CIDFont (Type0 composite) with Identity-H encoding.
/// The font data is subsetted to only include glyphs used in the quote.
fn embed_truetype(
    pdf: &mut Pdf,
    font_ref: Ref,
    descriptor_ref: Ref,
    data_ref: Ref,
    fallback_name: &str,
    font_data: &[u8],
    used_chars: &BTreeSet<char>,
    alloc: &mut impl FnMut() -> Ref,
) -> Option<EmbeddedMetrics> {
    let face = match Face::parse(font_data, 0) {
        Ok(face) => face,
        Err(e) => {
            log::warn!("Cannot parse font {fallback_name}: {e}");
            return None;
        }
    };

    let units = face.units_per_em() as f32;
    let ascent = face.ascender() as f32 / units * 1000.0;
    let descent = face.descender() as f32 / units * 1000.0;
    let cap_height = face
        .capital_height()
        .map(|h| h as f32 / units * 1000.0)
        .unwrap_or(700.0);

    let bb = face.global_bounding_box();
    let bbox = Rect::new(
        bb.x_min as f32 / units * 1000.0,
        bb.y_min as f32 / units * 1000.0,
        bb.x_max as f32 / units * 1000.0,
        bb.y_max as f32 / units * 1000.0,
    );

    let advance_1000 = |ch: char| -> Option<f32> {
        face.glyph_index(ch)
            .and_then(|gid| face.glyph_hor_advance(gid))
            .map(|adv| adv as f32 / units * 1000.0)
    };

    let widths_1000: Vec<f32> = (32u8..=255u8)
        .map(|byte| advance_1000(winansi_to_char(byte)).unwrap_or(0.0))
        .collect();

    // BTreeSet iteration keeps glyph numbering stable across renders
    let mut remapper = subsetter::GlyphRemapper::new();
    let mut char_to_gid = HashMap::new();
    let mut char_widths_1000 = HashMap::new();
    let mut gid_widths: Vec<(u16, f32)> = Vec::new();
    let mut cmap_pairs: Vec<(u16, char)> = Vec::new();
    for &ch in used_chars {
        if let Some(gid) = face.glyph_index(ch) {
            let new_gid = remapper.remap(gid.0);
            let w = advance_1000(ch).unwrap_or(0.0);
            char_to_gid.insert(ch, new_gid);
            char_widths_1000.insert(ch, w);
            cmap_pairs.push((new_gid, ch));
            gid_widths.push((new_gid, w));
        }
    }
    // Several chars can share a glyph; ToUnicode keeps the first
    cmap_pairs.sort_by_key(|&(gid, _)| gid);
    cmap_pairs.dedup_by_key(|&mut (gid, _)| gid);
    gid_widths.sort_by_key(|&(gid, _)| gid);
    gid_widths.dedup_by_key(|&mut (gid, _)| gid);

    let subset_data = subsetter::subset(font_data, 0, &remapper).unwrap_or_else(|e| {
        log::warn!("Font subsetting failed for {fallback_name}: {e} — embedding full font");
        font_data.to_vec()
    });

    let data_len = i32::try_from(subset_data.len()).ok()?;
    pdf.stream(data_ref, &subset_data)
        .pair(Name(b"Length1"), data_len);

    let ps_name = postscript_name(&face, fallback_name);

    pdf.font_descriptor(descriptor_ref)
        .name(Name(ps_name.as_bytes()))
        .flags(pdf_writer::types::FontFlags::NON_SYMBOLIC)
        .bbox(bbox)
        .italic_angle(0.0)
        .ascent(ascent)
        .descent(descent)
        .cap_height(cap_height)
        .stem_v(80.0)
        .font_file2(data_ref);

    let cid_font_ref = alloc();
    let system_info = pdf_writer::types::SystemInfo {
        registry: pdf_writer::Str(b"Adobe"),
        ordering: pdf_writer::Str(b"Identity"),
        supplement: 0,
    };
    {
        let mut cid = pdf.cid_font(cid_font_ref);
        cid.subtype(pdf_writer::types::CidFontType::Type2);
        cid.base_font(Name(ps_name.as_bytes()));
        cid.system_info(system_info);
        cid.font_descriptor(descriptor_ref);
        cid.default_width(0.0);
        cid.cid_to_gid_map_predefined(Name(b"Identity"));
        if !gid_widths.is_empty() {
            let mut w = cid.widths();
            for &(gid, width) in &gid_widths {
                w.consecutive(gid, [width]);
            }
        }
    }

    let tounicode_ref = alloc();
    let cmap_name = format!("{}-UTF16", ps_name);
    let mut cmap = pdf_writer::types::UnicodeCmap::new(
        Name(cmap_name.as_bytes()),
        pdf_writer::types::SystemInfo {
            registry: pdf_writer::Str(b"Adobe"),
            ordering: pdf_writer::Str(b"Identity"),
            supplement: 0,
        },
    );
    for &(new_gid, ch) in &cmap_pairs {
        cmap.pair(new_gid, ch);
    }
    let cmap_data = cmap.finish();
    pdf.stream(tounicode_ref, cmap_data.as_slice());

    pdf.type0_font(font_ref)
        .base_font(Name(ps_name.as_bytes()))
        .encoding_predefined(Name(b"Identity-H"))
        .descendant_font(cid_font_ref)
        .to_unicode(tounicode_ref);

    Some(EmbeddedMetrics {
        widths_1000,
        ascender_ratio: face.ascender() as f32 / units,
        char_to_gid,
        char_widths_1000,
    })
}

fn map_font_file(path: &Path) -> std::io::Result<Mmap> {
    let file = std::fs::File::open(path)?;
    // SAFETY: asset fonts are read-only deployment files.
    unsafe { Mmap::map(&file) }
}

/// Embed the font at `path`, or register the matching standard Helvetica
/// face when the file is missing or unusable.
pub(crate) fn register_font(
    pdf: &mut Pdf,
    style: FontStyle,
    path: &Path,
    pdf_name: String,
    alloc: &mut impl FnMut() -> Ref,
    used_chars: &BTreeSet<char>,
) -> FontEntry {
    let t0 = std::time::Instant::now();
    let font_ref = alloc();
    let descriptor_ref = alloc();
    let data_ref = alloc();

    let label = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("QuoteFont")
        .to_string();

    let metrics = match map_font_file(path) {
        Ok(data) => embed_truetype(
            pdf,
            font_ref,
            descriptor_ref,
            data_ref,
            &label,
            &data,
            used_chars,
            alloc,
        ),
        Err(e) => {
            log::warn!("Font not loaded: {} ({e})", path.display());
            None
        }
    };

    let entry = match metrics {
        Some(m) => FontEntry {
            pdf_name,
            font_ref,
            widths_1000: m.widths_1000,
            ascender_ratio: Some(m.ascender_ratio),
            char_to_gid: Some(m.char_to_gid),
            char_widths_1000: Some(m.char_widths_1000),
        },
        None => {
            let base = style.standard_name();
            log::warn!(
                "Using {} for {:?} text",
                String::from_utf8_lossy(base),
                style
            );
            pdf.type1_font(font_ref)
                .base_font(Name(base))
                .encoding_predefined(Name(b"WinAnsiEncoding"));
            FontEntry::standard(style, pdf_name, font_ref)
        }
    };

    log::debug!(
        "register_font: {:?} {} → {:.1}ms",
        style,
        path.display(),
        t0.elapsed().as_secs_f64() * 1000.0,
    );

    entry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn winansi_keeps_spanish_and_bullets() {
        assert_eq!(to_winansi_bytes("Año•…"), vec![b'A', 0xF1, b'o', 0x95, 0x85]);
        assert_eq!(to_winansi_bytes("m²"), vec![b'm', 0xB2]);
        assert_eq!(to_winansi_bytes("漢x"), vec![b'x']);
    }

    #[test]
    fn bold_fallback_is_wider() {
        let regular = FontEntry::standard(FontStyle::Regular, "F1".into(), Ref::new(1));
        let bold = FontEntry::standard(FontStyle::Bold, "F2".into(), Ref::new(2));
        let text = "Cotización N° 42";
        assert!(bold.word_width(text, 10.0) > regular.word_width(text, 10.0));
        assert!(!regular.is_embedded());
    }

    #[test]
    fn standard_widths_match_afm_metrics() {
        let regular = FontEntry::standard(FontStyle::Regular, "F1".into(), Ref::new(1));
        let bold = FontEntry::standard(FontStyle::Bold, "F2".into(), Ref::new(2));
        for (ch, r, b) in [
            (' ', 278.0, 278.0),
            ('W', 944.0, 944.0),
            ('O', 778.0, 778.0),
            ('Á', 667.0, 722.0),
            ('r', 333.0, 389.0),
            ('i', 222.0, 278.0),
            ('ñ', 556.0, 611.0),
            ('•', 350.0, 350.0),
            ('…', 1000.0, 1000.0),
            ('°', 400.0, 400.0),
        ] {
            assert_eq!(regular.char_width_1000(ch), r, "Helvetica {ch:?}");
            assert_eq!(bold.char_width_1000(ch), b, "Helvetica-Bold {ch:?}");
        }
        // C O D O space D N space 1 0 0 space C O N D U C C I O N
        let caps = regular.word_width("CODO DN 100 CONDUCCION", 1000.0);
        assert!((caps - 13834.0).abs() < 0.5, "{caps}");
    }

    #[test]
    fn gids_are_big_endian_pairs() {
        let map = HashMap::from([('a', 0x0102u16), ('b', 3)]);
        assert_eq!(encode_as_gids("ab?", &map), vec![0x01, 0x02, 0x00, 0x03, 0x00, 0x00]);
    }
}
