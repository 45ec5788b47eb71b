use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::utils::decimal::{f64_lenient, opt_f64_lenient};

/// One trading day of prices
///
/// Bars are immutable once returned and arrive in ascending date order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockPriceBar {
    #[serde(alias = "price_date")]
    pub date: NaiveDate,

    #[serde(deserialize_with = "f64_lenient")]
    pub open: f64,

    #[serde(deserialize_with = "f64_lenient")]
    pub high: f64,

    #[serde(deserialize_with = "f64_lenient")]
    pub low: f64,

    #[serde(deserialize_with = "f64_lenient")]
    pub close: f64,

    pub volume: u64,

    #[serde(default, deserialize_with = "opt_f64_lenient")]
    pub adjusted_close: Option<f64>,
}

/// Response of `GET /stocks/{ticker}/prices`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceList {
    pub ticker: String,

    #[serde(alias = "total")]
    pub count: u64,

    pub prices: Vec<StockPriceBar>,
}

impl PriceList {
    pub fn latest(&self) -> Option<&StockPriceBar> {
        self.prices.last()
    }
}

/// Body of `POST /stocks/{ticker}/fetch`
#[derive(Debug, Clone, Serialize)]
pub struct PriceRefreshRequest {
    pub period: String,
}

/// Response of `POST /stocks/{ticker}/fetch`
///
/// The API reports how many bars it stored; the bars themselves are
/// optional in the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRefresh {
    pub ticker: String,

    #[serde(alias = "saved_count")]
    pub count: u64,

    #[serde(default)]
    pub prices: Vec<StockPriceBar>,

    #[serde(default)]
    pub message: Option<String>,
}
