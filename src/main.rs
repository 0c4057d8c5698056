use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use quote_pdf::{AssetPaths, SellerProfile, TypesetterConfig, render_quote_file};

/// Typeset a quote request (JSON) into a paginated PDF.
#[derive(Parser, Debug)]
#[command(name = "quote-pdf")]
#[command(version, about, long_about = None)]
struct Args {
    /// Quote request in JSON
    input: PathBuf,

    /// Where to write the PDF
    output: PathBuf,

    /// Directory holding fonts/ and images/ (default: $QUOTE_PDF_ASSETS or ./assets)
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Seller profile JSON shown in the header and footer
    #[arg(long)]
    seller: Option<PathBuf>,

    /// Tax rate as a fraction, e.g. 0.19
    #[arg(long = "tax-rate")]
    tax_rate: Option<f64>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn build_config(args: &Args) -> Result<TypesetterConfig, quote_pdf::Error> {
    let mut config = TypesetterConfig::from_env();
    if let Some(dir) = &args.assets {
        config.assets = AssetPaths::under(dir);
    }
    if let Some(path) = &args.seller {
        config.seller = SellerProfile::from_json_file(path)?;
    }
    if let Some(rate) = args.tax_rate {
        if !rate.is_finite() || rate < 0.0 {
            return Err(quote_pdf::Error::InvalidRequest(format!(
                "tax rate must be a non-negative number, got {rate}"
            )));
        }
        config.tax_rate = rate;
    }
    Ok(config)
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let result = build_config(&args)
        .and_then(|config| render_quote_file(&args.input, &args.output, &config));
    match result {
        Ok(doc) => {
            log::info!(
                "Wrote {} ({} pages, total {})",
                args.output.display(),
                doc.page_count(),
                quote_pdf::format_money(doc.totals.grand_total),
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("quote-pdf: {e}");
            ExitCode::FAILURE
        }
    }
}
