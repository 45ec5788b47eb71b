//! Cache keys, cached payloads and invalidation filters
//!
//! A key is the operation plus every parameter that shapes the response,
//! so `Technical { days: 90 }` and `Technical { days: 180 }` are separate
//! entries that never share data.

use std::fmt;

use crate::constants::{
    DEFAULT_INDICATOR_DAYS, DEFAULT_MACRO_LIMIT, DEFAULT_NEWS_LIMIT, DEFAULT_PRICE_LIMIT,
    DEFAULT_TARGET_DAYS,
};
use crate::error::Result;
use crate::models::{
    HealthStatus, MacroIndicatorList, MacroSeries, NewsList, PredictionResult, PriceList, Stock,
    StockList, TechnicalIndicatorRecord,
};
use crate::services::api_client::ResourceClient;

/// Read operations the cache knows how to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Stocks,
    Stock,
    Prices,
    Technical,
    Prediction,
    News,
    MacroIndicators,
    Macro,
    Health,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Stocks => "stocks",
            Operation::Stock => "stock",
            Operation::Prices => "prices",
            Operation::Technical => "technical",
            Operation::Prediction => "prediction",
            Operation::News => "news",
            Operation::MacroIndicators => "macro_indicators",
            Operation::Macro => "macro",
            Operation::Health => "health",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Subjects are compared trimmed, the way they go out on the wire
fn trimmed(subject: impl Into<String>) -> String {
    let subject = subject.into();
    if subject.trim().len() == subject.len() {
        subject
    } else {
        subject.trim().to_string()
    }
}

/// Identity of one cached query: (operation, subject, parameters)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Stocks,
    Stock { ticker: String },
    Prices { ticker: String, limit: u32 },
    Technical { ticker: String, days: u32 },
    Prediction { ticker: String, target_days: u32 },
    News { query: String, limit: u32 },
    MacroIndicators,
    Macro { key: String, limit: u32 },
    Health,
}

impl QueryKey {
    pub fn stocks() -> Self {
        QueryKey::Stocks
    }

    pub fn stock(ticker: impl Into<String>) -> Self {
        QueryKey::Stock {
            ticker: trimmed(ticker),
        }
    }

    pub fn prices(ticker: impl Into<String>, limit: Option<u32>) -> Self {
        QueryKey::Prices {
            ticker: trimmed(ticker),
            limit: limit.unwrap_or(DEFAULT_PRICE_LIMIT),
        }
    }

    pub fn technical(ticker: impl Into<String>, days: Option<u32>) -> Self {
        QueryKey::Technical {
            ticker: trimmed(ticker),
            days: days.unwrap_or(DEFAULT_INDICATOR_DAYS),
        }
    }

    pub fn prediction(ticker: impl Into<String>, target_days: Option<u32>) -> Self {
        QueryKey::Prediction {
            ticker: trimmed(ticker),
            target_days: target_days.unwrap_or(DEFAULT_TARGET_DAYS),
        }
    }

    pub fn news(query: impl Into<String>, limit: Option<u32>) -> Self {
        QueryKey::News {
            query: trimmed(query),
            limit: limit.unwrap_or(DEFAULT_NEWS_LIMIT),
        }
    }

    pub fn macro_indicators() -> Self {
        QueryKey::MacroIndicators
    }

    pub fn macro_series(key: impl Into<String>, limit: Option<u32>) -> Self {
        QueryKey::Macro {
            key: trimmed(key),
            limit: limit.unwrap_or(DEFAULT_MACRO_LIMIT),
        }
    }

    pub fn health() -> Self {
        QueryKey::Health
    }

    /// Same key with its subject trimmed; keys built by hand may not be
    pub fn normalized(self) -> Self {
        match self {
            QueryKey::Stock { ticker } => QueryKey::stock(ticker),
            QueryKey::Prices { ticker, limit } => QueryKey::prices(ticker, Some(limit)),
            QueryKey::Technical { ticker, days } => QueryKey::technical(ticker, Some(days)),
            QueryKey::Prediction { ticker, target_days } => {
                QueryKey::prediction(ticker, Some(target_days))
            }
            QueryKey::News { query, limit } => QueryKey::news(query, Some(limit)),
            QueryKey::Macro { key, limit } => QueryKey::macro_series(key, Some(limit)),
            other => other,
        }
    }

    pub fn operation(&self) -> Operation {
        match self {
            QueryKey::Stocks => Operation::Stocks,
            QueryKey::Stock { .. } => Operation::Stock,
            QueryKey::Prices { .. } => Operation::Prices,
            QueryKey::Technical { .. } => Operation::Technical,
            QueryKey::Prediction { .. } => Operation::Prediction,
            QueryKey::News { .. } => Operation::News,
            QueryKey::MacroIndicators => Operation::MacroIndicators,
            QueryKey::Macro { .. } => Operation::Macro,
            QueryKey::Health => Operation::Health,
        }
    }

    /// Ticker, news query or macro key the request is about
    pub fn subject(&self) -> Option<&str> {
        match self {
            QueryKey::Stock { ticker }
            | QueryKey::Prices { ticker, .. }
            | QueryKey::Technical { ticker, .. }
            | QueryKey::Prediction { ticker, .. } => Some(ticker),
            QueryKey::News { query, .. } => Some(query),
            QueryKey::Macro { key, .. } => Some(key),
            QueryKey::Stocks | QueryKey::MacroIndicators | QueryKey::Health => None,
        }
    }

    /// A query bound to an empty subject must never run
    pub fn is_enabled(&self) -> bool {
        self.subject().map_or(true, |s| !s.trim().is_empty())
    }

    /// Run the request this key describes
    pub async fn execute(&self, client: &dyn ResourceClient) -> Result<QueryData> {
        match self {
            QueryKey::Stocks => client.list_stocks().await.map(QueryData::Stocks),
            QueryKey::Stock { ticker } => client.get_stock(ticker).await.map(QueryData::Stock),
            QueryKey::Prices { ticker, limit } => {
                client.get_prices(ticker, *limit).await.map(QueryData::Prices)
            }
            QueryKey::Technical { ticker, days } => client
                .get_technical_indicators(ticker, *days)
                .await
                .map(QueryData::Technical),
            QueryKey::Prediction { ticker, target_days } => client
                .predict_return(ticker, *target_days)
                .await
                .map(QueryData::Prediction),
            QueryKey::News { query, limit } => {
                client.get_news(query, *limit).await.map(QueryData::News)
            }
            QueryKey::MacroIndicators => client
                .list_macro_indicators()
                .await
                .map(QueryData::MacroIndicators),
            QueryKey::Macro { key, limit } => client
                .get_macro_indicator(key, *limit)
                .await
                .map(QueryData::Macro),
            QueryKey::Health => client.health().await.map(QueryData::Health),
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKey::Prices { ticker, limit } => write!(f, "prices:{}:limit={}", ticker, limit),
            QueryKey::Technical { ticker, days } => write!(f, "technical:{}:days={}", ticker, days),
            QueryKey::Prediction { ticker, target_days } => {
                write!(f, "prediction:{}:target_days={}", ticker, target_days)
            }
            QueryKey::News { query, limit } => write!(f, "news:{}:limit={}", query, limit),
            QueryKey::Macro { key, limit } => write!(f, "macro:{}:limit={}", key, limit),
            other => match other.subject() {
                Some(subject) => write!(f, "{}:{}", other.operation(), subject),
                None => write!(f, "{}", other.operation()),
            },
        }
    }
}

/// Payload stored for a key
#[derive(Debug, Clone, PartialEq)]
pub enum QueryData {
    Stocks(StockList),
    Stock(Stock),
    Prices(PriceList),
    Technical(Vec<TechnicalIndicatorRecord>),
    /// `None` is a settled "not enough history" answer, not a failure
    Prediction(Option<PredictionResult>),
    News(NewsList),
    MacroIndicators(MacroIndicatorList),
    Macro(MacroSeries),
    Health(HealthStatus),
}

impl QueryData {
    pub fn as_stocks(&self) -> Option<&StockList> {
        match self {
            QueryData::Stocks(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_stock(&self) -> Option<&Stock> {
        match self {
            QueryData::Stock(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_prices(&self) -> Option<&PriceList> {
        match self {
            QueryData::Prices(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_technical(&self) -> Option<&[TechnicalIndicatorRecord]> {
        match self {
            QueryData::Technical(v) => Some(v),
            _ => None,
        }
    }

    /// Outer `None`: wrong payload kind. Inner `None`: insufficient history.
    pub fn as_prediction(&self) -> Option<Option<&PredictionResult>> {
        match self {
            QueryData::Prediction(v) => Some(v.as_ref()),
            _ => None,
        }
    }

    pub fn as_news(&self) -> Option<&NewsList> {
        match self {
            QueryData::News(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_macro_indicators(&self) -> Option<&MacroIndicatorList> {
        match self {
            QueryData::MacroIndicators(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_macro(&self) -> Option<&MacroSeries> {
        match self {
            QueryData::Macro(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_health(&self) -> Option<&HealthStatus> {
        match self {
            QueryData::Health(v) => Some(v),
            _ => None,
        }
    }
}

/// Selects cache entries to invalidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryFilter {
    /// One exact key
    Exact(QueryKey),
    /// Every key of an operation, whatever the parameters
    Operation(Operation),
    /// Every key of an operation about one ticker / query / macro key
    Subject { operation: Operation, subject: String },
}

impl QueryFilter {
    pub fn subject(operation: Operation, subject: impl Into<String>) -> Self {
        QueryFilter::Subject {
            operation,
            subject: trimmed(subject),
        }
    }

    pub fn matches(&self, key: &QueryKey) -> bool {
        match self {
            QueryFilter::Exact(k) => k == key,
            QueryFilter::Operation(op) => key.operation() == *op,
            QueryFilter::Subject { operation, subject } => {
                key.operation() == *operation && key.subject() == Some(subject.as_str())
            }
        }
    }
}
