mod assets;
mod config;
mod error;
mod fonts;
mod model;
mod pdf;
mod totals;
mod units;

pub use config::{AssetPaths, PageGeometry, SellerProfile, TypesetterConfig};
pub use error::Error;
pub use model::{Contact, LineItem, QuoteDocumentRequest, QuoteMetadata};
pub use pdf::{PageSummary, QuoteDocument};
pub use totals::{
    DEFAULT_TAX_RATE, MAX_LINE_AMOUNT, RunningTotals, Totals, format_money, format_percent,
    format_quantity, line_gross, line_subtotal,
};
pub use units::{
    format_fraction, format_unit, normalize_unit_size, parse_fraction, unit_glyph,
    unit_size_to_decimal,
};

use std::path::Path;
use std::time::Instant;

/// Lay out and render a quote, returning the layout report with the bytes.
pub fn typeset(
    request: &QuoteDocumentRequest,
    config: &TypesetterConfig,
) -> Result<QuoteDocument, Error> {
    request.validate()?;
    pdf::render(request, config)
}

/// Render a quote with configuration taken from the environment.
pub fn generate_document(request: &QuoteDocumentRequest) -> Result<Vec<u8>, Error> {
    let config = TypesetterConfig::from_env();
    Ok(typeset(request, &config)?.bytes)
}

/// Read a JSON request from `input` and write the PDF to `output`.
pub fn render_quote_file(
    input: &Path,
    output: &Path,
    config: &TypesetterConfig,
) -> Result<QuoteDocument, Error> {
    let t0 = Instant::now();

    let raw = std::fs::read(input).map_err(Error::Io)?;
    let request = QuoteDocumentRequest::from_json(&raw)?;
    let t_parse = t0.elapsed();

    let doc = typeset(&request, config)?;
    let t_render = t0.elapsed();

    std::fs::write(output, &doc.bytes).map_err(Error::Io)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: parse={:.1}ms, render={:.1}ms, write={:.1}ms, total={:.1}ms (output {} bytes, {} pages)",
        t_parse.as_secs_f64() * 1000.0,
        (t_render - t_parse).as_secs_f64() * 1000.0,
        (t_total - t_render).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        doc.bytes.len(),
        doc.page_count(),
    );

    Ok(doc)
}
