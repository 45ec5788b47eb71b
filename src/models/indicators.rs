//! Technical indicator records returned by `GET /analysis/{ticker}/technical`
//!
//! Every indicator needs a minimum lookback window (20 days for SMA20, 14
//! for RSI, 200 for SMA200...), so leading records carry `None` until the
//! window is satisfied. Availability is usually monotonic, but consumers
//! must treat each field independently: a gap in the price history can
//! produce a `None` after a `Some`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A daily price bar extended with optional indicator values
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TechnicalIndicatorRecord {
    pub date: NaiveDate,

    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,

    // Moving averages
    #[serde(default, alias = "SMA_20")]
    pub sma_20: Option<f64>,

    #[serde(default, alias = "SMA_50")]
    pub sma_50: Option<f64>,

    #[serde(default, alias = "SMA_200")]
    pub sma_200: Option<f64>,

    // Momentum
    #[serde(default, alias = "RSI_14")]
    pub rsi_14: Option<f64>,

    #[serde(default, alias = "MACD_12_26_9")]
    pub macd: Option<f64>,

    #[serde(default, alias = "MACDs_12_26_9")]
    pub macd_signal: Option<f64>,

    #[serde(default, alias = "MACDh_12_26_9")]
    pub macd_hist: Option<f64>,

    // Bollinger bands (20, 2.0)
    #[serde(default, alias = "BBU_20_2.0")]
    pub bb_upper: Option<f64>,

    #[serde(default, alias = "BBM_20_2.0")]
    pub bb_middle: Option<f64>,

    #[serde(default, alias = "BBL_20_2.0")]
    pub bb_lower: Option<f64>,
}

impl TechnicalIndicatorRecord {
    /// Create a record with only OHLCV set
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
            ..Self::default()
        }
    }

    /// True once every moving average has enough history
    pub fn has_full_lookback(&self) -> bool {
        self.sma_20.is_some() && self.sma_50.is_some() && self.sma_200.is_some()
    }
}
