use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::Error;
use crate::totals::DEFAULT_TAX_RATE;

const DEFAULT_DISCLAIMER: &str = "Los precios indicados son netos y no incluyen IVA salvo en el total final. \
Esta cotización está sujeta a disponibilidad de stock al momento de la confirmación de compra. \
Los plazos de entrega se cuentan desde la recepción de la orden de compra y del pago acordado. \
Cualquier modificación en cantidades o especificaciones puede alterar los valores aquí informados.";

/// Files read on every render. Missing files are not an error: fonts fall
/// back to Helvetica and the logo is skipped.
#[derive(Clone, Debug)]
pub struct AssetPaths {
    pub regular_font: PathBuf,
    pub bold_font: PathBuf,
    pub logo: PathBuf,
}

impl AssetPaths {
    pub fn under(root: &Path) -> Self {
        Self {
            regular_font: root.join("fonts/regular.ttf"),
            bold_font: root.join("fonts/bold.ttf"),
            logo: root.join("images/logo.png"),
        }
    }

    /// Root taken from `QUOTE_PDF_ASSETS`, else `./assets`.
    pub fn from_env() -> Self {
        let root = std::env::var("QUOTE_PDF_ASSETS")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("assets"));
        Self::under(&root)
    }
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self::under(Path::new("assets"))
    }
}

/// Page size and the fixed bands every page reserves, in points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub side_margin: f32,
    pub header_height: f32,
    pub footer_height: f32,
    /// Nothing but the footer band may be drawn below this Y.
    pub footer_reserve: f32,
    pub column_header_height: f32,
    pub min_column_width: f32,
}

impl PageGeometry {
    pub fn content_width(&self) -> f32 {
        self.width - 2.0 * self.side_margin
    }

    /// First Y below the header band.
    pub fn content_top(&self) -> f32 {
        self.height - self.header_height - 14.0
    }
}

impl Default for PageGeometry {
    /// US Letter.
    fn default() -> Self {
        Self {
            width: 612.0,
            height: 792.0,
            side_margin: 36.0,
            header_height: 70.0,
            footer_height: 34.0,
            footer_reserve: 60.0,
            column_header_height: 18.0,
            min_column_width: 28.0,
        }
    }
}

/// The issuing company, shown in the header and footer bands.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SellerProfile {
    pub name: String,
    pub tax_id: String,
    pub address: String,
    pub website: String,
    pub email: String,
    pub phone: String,
}

impl SellerProfile {
    pub fn from_json_file(path: &Path) -> Result<Self, Error> {
        let data = std::fs::read(path).map_err(|e| {
            Error::Io(std::io::Error::new(e.kind(), format!("{}: {}", e, path.display())))
        })?;
        Ok(serde_json::from_slice(&data)?)
    }

    /// Website as an absolute URI for link annotations.
    pub fn website_uri(&self) -> Option<String> {
        let site = self.website.trim();
        if site.is_empty() {
            None
        } else if site.starts_with("http://") || site.starts_with("https://") {
            Some(site.to_string())
        } else {
            Some(format!("https://{site}"))
        }
    }
}

#[derive(Clone, Debug)]
pub struct TypesetterConfig {
    pub assets: AssetPaths,
    pub page: PageGeometry,
    pub seller: SellerProfile,
    pub tax_rate: f64,
    pub validity_days: u32,
    pub disclaimer: String,
}

impl Default for TypesetterConfig {
    fn default() -> Self {
        Self {
            assets: AssetPaths::default(),
            page: PageGeometry::default(),
            seller: SellerProfile::default(),
            tax_rate: DEFAULT_TAX_RATE,
            validity_days: 15,
            disclaimer: DEFAULT_DISCLAIMER.to_string(),
        }
    }
}

impl TypesetterConfig {
    /// Defaults overridden by `QUOTE_PDF_ASSETS` and `QUOTE_PDF_TAX_RATE`.
    pub fn from_env() -> Self {
        let mut config = Self {
            assets: AssetPaths::from_env(),
            ..Self::default()
        };
        if let Ok(raw) = std::env::var("QUOTE_PDF_TAX_RATE") {
            match raw.trim().parse::<f64>() {
                Ok(rate) if rate.is_finite() && rate >= 0.0 => config.tax_rate = rate,
                _ => log::warn!("Ignoring QUOTE_PDF_TAX_RATE={raw:?}: not a non-negative number"),
            }
        }
        config
    }
}
