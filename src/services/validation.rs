//! Input checks run before any request is dispatched
//!
//! Limits match the API's own field constraints so a request that passes
//! here is not rejected for shape reasons server-side.

use crate::error::{AppError, Result};

pub const MAX_TICKER_LEN: usize = 20;
pub const MAX_NAME_LEN: usize = 200;
pub const MAX_SENTIMENT_TEXT_LEN: usize = 1000;
pub const MAX_PERIOD_LEN: usize = 8;

fn require(field: &str, value: &str, max_len: usize) -> Result<()> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{} must not be empty", field)));
    }
    if trimmed.chars().count() > max_len {
        return Err(AppError::Validation(format!(
            "{} must be at most {} characters",
            field, max_len
        )));
    }
    Ok(())
}

pub fn validate_ticker(ticker: &str) -> Result<()> {
    require("ticker", ticker, MAX_TICKER_LEN)
}

pub fn validate_new_stock(ticker: &str, name: &str) -> Result<()> {
    validate_ticker(ticker)?;
    require("name", name, MAX_NAME_LEN)
}

/// Lookback period such as `1mo` or `1y`
pub fn validate_period(period: &str) -> Result<()> {
    require("period", period, MAX_PERIOD_LEN)
}

pub fn validate_query(query: &str) -> Result<()> {
    require("query", query, usize::MAX)
}

pub fn validate_sentiment_text(text: &str) -> Result<()> {
    require("text", text, MAX_SENTIMENT_TEXT_LEN)
}
