use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::Error;
use crate::totals::MAX_LINE_AMOUNT;

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub company: String,
    pub address: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub tax_id: Option<String>,
    pub contact_name: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub name: String,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub characteristics: Vec<String>,
    pub quantity: u32,
    pub unit_price: f64,
    #[serde(default)]
    pub discount_percent: f64,
    #[serde(default)]
    pub measurement_unit: Option<String>,
    /// Raw size as entered in the catalog: "2", "0.375", "1 1/2".
    #[serde(default)]
    pub unit_size: Option<String>,
}

impl LineItem {
    pub fn new(name: impl Into<String>, quantity: u32, unit_price: f64) -> Self {
        Self {
            name: name.into(),
            sku: None,
            characteristics: Vec::new(),
            quantity,
            unit_price,
            discount_percent: 0.0,
            measurement_unit: None,
            unit_size: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteMetadata {
    pub quote_number: String,
    pub correlative_id: u64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub execution_time: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteDocumentRequest {
    pub contact: Contact,
    pub items: Vec<LineItem>,
    pub metadata: QuoteMetadata,
}

impl QuoteDocumentRequest {
    pub fn from_json(bytes: &[u8]) -> Result<Self, Error> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Reject values that would otherwise flow unchecked into the totals.
    pub fn validate(&self) -> Result<(), Error> {
        if self.items.is_empty() {
            return Err(Error::InvalidRequest("quote has no items".into()));
        }
        for (i, item) in self.items.iter().enumerate() {
            if item.quantity == 0 {
                return Err(Error::InvalidRequest(format!(
                    "item {i} ({}): quantity must be at least 1",
                    item.name
                )));
            }
            if !item.unit_price.is_finite() || item.unit_price < 0.0 {
                return Err(Error::InvalidRequest(format!(
                    "item {i} ({}): unit price {} is not a non-negative number",
                    item.name, item.unit_price
                )));
            }
            let amount = item.quantity as f64 * item.unit_price;
            if amount > MAX_LINE_AMOUNT {
                return Err(Error::InvalidRequest(format!(
                    "item {i} ({}): line amount {amount} exceeds {MAX_LINE_AMOUNT}",
                    item.name
                )));
            }
            if !item.discount_percent.is_finite()
                || !(0.0..=100.0).contains(&item.discount_percent)
            {
                return Err(Error::InvalidRequest(format!(
                    "item {i} ({}): discount {} is outside 0..=100",
                    item.name, item.discount_percent
                )));
            }
        }
        Ok(())
    }
}
