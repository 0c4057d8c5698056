//! Unit sizes and measurement-unit glyphs.
//!
//! Catalog sizes arrive as decimals ("0.375"), integers ("2") or fractions
//! ("1 1/2"). They are shown as the nearest fraction over 64 and stored as
//! decimals.

pub const MAX_DENOMINATOR: u64 = 64;

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Nearest fraction with denominator up to 64, reduced. Whole numbers have no
/// fraction part: `1.5 → "1 1/2"`, `0.375 → "3/8"`, `2.0 → "2"`.
pub fn format_fraction(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let abs = value.abs();
    let mut whole = abs.trunc() as u64;
    let mut num = ((abs - whole as f64) * MAX_DENOMINATOR as f64).round() as u64;
    let mut den = MAX_DENOMINATOR;
    if num == den {
        whole += 1;
        num = 0;
    }
    let sign = if value < 0.0 && (whole > 0 || num > 0) { "-" } else { "" };
    if num == 0 {
        return format!("{sign}{whole}");
    }
    let g = gcd(num, den);
    num /= g;
    den /= g;
    if whole == 0 {
        format!("{sign}{num}/{den}")
    } else {
        format!("{sign}{whole} {num}/{den}")
    }
}

fn parse_simple_fraction(s: &str) -> Option<f64> {
    let (num, den) = s.split_once('/')?;
    let num: f64 = num.trim().parse().ok()?;
    let den: f64 = den.trim().parse().ok()?;
    if den == 0.0 || !num.is_finite() || !den.is_finite() {
        return None;
    }
    Some(num / den)
}

/// Parse "1 1/2", "3/8", "2", "1.25" or "1,25" into a decimal.
pub fn parse_fraction(input: &str) -> Option<f64> {
    let trimmed = input.trim();
    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, trimmed),
    };
    let parts: Vec<&str> = body.split_whitespace().collect();
    let magnitude = match parts.as_slice() {
        [single] if single.contains('/') => parse_simple_fraction(single)?,
        [single] => {
            let v: f64 = single.replace(',', ".").parse().ok()?;
            if !v.is_finite() {
                return None;
            }
            v
        }
        [whole, frac] => {
            let whole: u64 = whole.parse().ok()?;
            let frac = parse_simple_fraction(frac)?;
            if !(0.0..1.0).contains(&frac) {
                return None;
            }
            whole as f64 + frac
        }
        _ => return None,
    };
    Some(if negative { -magnitude } else { magnitude })
}

/// Display form of a raw size; unparseable input is shown as entered.
pub fn normalize_unit_size(raw: &str) -> String {
    match parse_fraction(raw) {
        Some(v) => format_fraction(v),
        None => raw.trim().to_string(),
    }
}

/// Storage form of a raw size.
pub fn unit_size_to_decimal(raw: &str) -> Option<f64> {
    parse_fraction(raw)
}

pub fn unit_glyph(code: &str) -> &str {
    match code.trim().to_ascii_lowercase().as_str() {
        "in" | "inch" | "pulg" => "\"",
        "ft" | "pie" => "'",
        "m2" => "m²",
        "m3" => "m³",
        "cm2" => "cm²",
        "mm2" => "mm²",
        "un" | "u" | "unit" | "unidad" => "un.",
        "deg" => "°",
        _ => code.trim(),
    }
}

/// Size and unit as they appear in the unit column: `1 1/2"`, `2 kg`, `kg`.
pub fn format_unit(size: Option<&str>, unit: Option<&str>) -> String {
    let size = size.map(str::trim).filter(|s| !s.is_empty());
    let unit = unit.map(str::trim).filter(|s| !s.is_empty());
    match (size, unit) {
        (Some(s), Some(u)) => {
            let glyph = unit_glyph(u);
            let shown = normalize_unit_size(s);
            if matches!(glyph, "\"" | "'" | "°") {
                format!("{shown}{glyph}")
            } else {
                format!("{shown} {glyph}")
            }
        }
        (Some(s), None) => normalize_unit_size(s),
        (None, Some(u)) => unit_glyph(u).to_string(),
        (None, None) => String::new(),
    }
}
