//! Quote arithmetic. Every stage rounds to whole currency units: each line
//! subtotal is rounded, the rounded subtotals are summed, and tax is computed
//! on that rounded net.

use crate::error::Error;
use crate::model::LineItem;

pub const DEFAULT_TAX_RATE: f64 = 0.19;

/// Largest `quantity × unit_price` accepted for one line. Keeps every line
/// exact in `f64` and leaves headroom for summing in `i64`.
pub const MAX_LINE_AMOUNT: f64 = 1e15;

/// `quantity × unit_price` before any discount.
pub fn line_gross(item: &LineItem) -> i64 {
    (item.quantity as f64 * item.unit_price).round() as i64
}

pub fn line_subtotal(item: &LineItem) -> i64 {
    let factor = 1.0 - item.discount_percent / 100.0;
    (item.quantity as f64 * item.unit_price * factor).round() as i64
}

fn overflow(what: &str) -> Error {
    Error::InvalidRequest(format!("{what} exceeds the representable amount"))
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Totals {
    pub gross: i64,
    pub discount: i64,
    pub net: i64,
    pub tax: i64,
    pub grand_total: i64,
}

impl Totals {
    pub fn compute(items: &[LineItem], tax_rate: f64) -> Result<Self, Error> {
        let mut running = RunningTotals::new(tax_rate);
        for item in items {
            running.add(item)?;
        }
        running.finish()
    }
}

/// Accumulates once per drawn row, independent of page breaks.
#[derive(Clone, Debug)]
pub struct RunningTotals {
    tax_rate: f64,
    gross: i64,
    net: i64,
}

impl RunningTotals {
    pub fn new(tax_rate: f64) -> Self {
        Self {
            tax_rate,
            gross: 0,
            net: 0,
        }
    }

    /// Adds the item and returns its rounded subtotal.
    pub fn add(&mut self, item: &LineItem) -> Result<i64, Error> {
        let gross = item.quantity as f64 * item.unit_price;
        if !gross.is_finite() || gross > MAX_LINE_AMOUNT {
            return Err(overflow(&format!("line total of {}", item.name)));
        }
        let subtotal = line_subtotal(item);
        self.gross = self
            .gross
            .checked_add(line_gross(item))
            .ok_or_else(|| overflow("gross total"))?;
        self.net = self
            .net
            .checked_add(subtotal)
            .ok_or_else(|| overflow("net total"))?;
        Ok(subtotal)
    }

    pub fn finish(&self) -> Result<Totals, Error> {
        let tax = (self.net as f64 * self.tax_rate).round();
        if !tax.is_finite() || tax >= i64::MAX as f64 {
            return Err(overflow("tax"));
        }
        let tax = tax as i64;
        Ok(Totals {
            gross: self.gross,
            discount: self.gross - self.net,
            net: self.net,
            tax,
            grand_total: self
                .net
                .checked_add(tax)
                .ok_or_else(|| overflow("grand total"))?,
        })
    }
}

fn group_thousands(mut value: u64) -> String {
    let mut groups = Vec::new();
    loop {
        if value < 1000 {
            groups.push(value.to_string());
            break;
        }
        groups.push(format!("{:03}", value % 1000));
        value /= 1000;
    }
    groups.reverse();
    groups.join(".")
}

/// `1234567 → "$1.234.567"`.
pub fn format_money(value: i64) -> String {
    let sign = if value < 0 { "-" } else { "" };
    format!("{sign}${}", group_thousands(value.unsigned_abs()))
}

/// `10.0 → "10%"`, `12.5 → "12,5%"`.
pub fn format_percent(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}%", value as i64)
    } else {
        format!("{}%", format!("{value:.1}").replace('.', ","))
    }
}

pub fn format_quantity(quantity: u32) -> String {
    group_thousands(quantity as u64)
}
