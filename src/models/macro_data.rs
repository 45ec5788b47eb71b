use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::utils::decimal::opt_f64_lenient;

/// A macro-economic indicator the API knows how to collect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroIndicatorInfo {
    pub key: String,
    pub name: String,
    pub series_id: String,
}

/// Response of `GET /macro`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroIndicatorList {
    pub indicators: Vec<MacroIndicatorInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroDataPoint {
    pub indicator_date: NaiveDate,

    #[serde(default, deserialize_with = "opt_f64_lenient")]
    pub value: Option<f64>,
}

/// Response of `GET /macro/{key}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroSeries {
    pub indicator: String,
    pub name: String,
    pub series_id: String,
    pub data: Vec<MacroDataPoint>,
    pub total: u64,
}

impl MacroSeries {
    /// Most recent observation that carries a value
    pub fn latest_value(&self) -> Option<(NaiveDate, f64)> {
        self.data
            .iter()
            .rev()
            .find_map(|p| p.value.map(|v| (p.indicator_date, v)))
    }
}

/// Body of `POST /macro/{key}/fetch`
#[derive(Debug, Clone, Serialize)]
pub struct MacroRefreshRequest {
    pub limit: u32,
}

/// Response of `POST /macro/{key}/fetch`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroRefresh {
    pub indicator: String,
    pub saved_count: u64,

    #[serde(default)]
    pub message: Option<String>,
}
