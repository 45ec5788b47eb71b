use serde::{Deserialize, Serialize};

/// Registered stock (identity record owned by the API)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stock {
    pub id: i64,

    /// Exchange-suffixed symbol, e.g. "7203.T"
    pub ticker: String,

    pub name: String,

    #[serde(default)]
    pub sector: Option<String>,

    #[serde(default)]
    pub market: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Response of `GET /stocks`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockList {
    pub stocks: Vec<Stock>,
    pub total: u64,
}

impl StockList {
    /// Find a stock by ticker
    pub fn find(&self, ticker: &str) -> Option<&Stock> {
        self.stocks.iter().find(|s| s.ticker == ticker)
    }
}

/// Body of `POST /stocks`
#[derive(Debug, Clone, Serialize)]
pub struct NewStock {
    pub ticker: String,
    pub name: String,
}
