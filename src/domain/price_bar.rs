//! Daily closing price representation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub close: f64,
}

impl PriceBar {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        PriceBar { date, close }
    }
}

/// `round((peak - value) / peak * 100)`, half away from zero.
pub fn drawdown_pct(peak: f64, value: f64) -> f64 {
    ((peak - value) / peak * 100.0).round()
}
