//! Scripted in-memory `ResourceClient` for cache and mutation tests

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use crate::error::{AppError, Result};
use crate::models::{
    HealthStatus, MacroIndicatorInfo, MacroIndicatorList, MacroRefresh, MacroSeries, NewsArticle,
    NewsList, PredictionResult, PriceList, PriceRefresh, Sentiment, Stock, StockList,
    TechnicalIndicatorRecord,
};
use crate::services::api_client::ResourceClient;
use crate::services::validation::validate_new_stock;

/// Records every call as a label such as `technical:7203.T:90` and answers
/// with deterministic data. Delays and failures are scripted per operation
/// name (`technical`) or per full label.
#[derive(Default)]
pub struct ScriptedClient {
    calls: Mutex<Vec<String>>,
    stocks: Mutex<Vec<Stock>>,
    delays: Mutex<HashMap<String, Duration>>,
    failures: Mutex<HashSet<String>>,
    short_history: Mutex<HashSet<String>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delay(&self, label: &str, delay: Duration) {
        self.delays.lock().unwrap().insert(label.to_string(), delay);
    }

    pub fn fail(&self, label: &str) {
        self.failures.lock().unwrap().insert(label.to_string());
    }

    pub fn recover(&self, label: &str) {
        self.failures.lock().unwrap().remove(label);
    }

    /// Make predictions for `ticker` answer "not enough history"
    pub fn short_history(&self, ticker: &str) {
        self.short_history.lock().unwrap().insert(ticker.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls whose label starts with `prefix`
    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    /// Log the call, wait out any scripted delay, then apply scripted failure.
    /// Returns the 1-based sequence number of this call.
    async fn call(&self, operation: &str, label: String) -> Result<usize> {
        let seq = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(label.clone());
            calls.len()
        };

        let delay = {
            let delays = self.delays.lock().unwrap();
            delays.get(&label).or_else(|| delays.get(operation)).copied()
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failing = {
            let failures = self.failures.lock().unwrap();
            failures.contains(&label) || failures.contains(operation)
        };
        if failing {
            return Err(AppError::Network(format!("connection refused ({})", label)));
        }

        Ok(seq)
    }
}

fn day(offset: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(offset as i64)
}

#[async_trait]
impl ResourceClient for ScriptedClient {
    async fn list_stocks(&self) -> Result<StockList> {
        self.call("stocks", "stocks".to_string()).await?;
        let stocks = self.stocks.lock().unwrap().clone();
        Ok(StockList {
            total: stocks.len() as u64,
            stocks,
        })
    }

    async fn get_stock(&self, ticker: &str) -> Result<Stock> {
        self.call("stock", format!("stock:{}", ticker)).await?;
        self.stocks
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.ticker == ticker)
            .cloned()
            .ok_or_else(|| AppError::NotFound(ticker.to_string()))
    }

    async fn register_stock(&self, ticker: &str, name: &str) -> Result<Stock> {
        validate_new_stock(ticker, name)?;
        self.call("register", format!("register:{}", ticker)).await?;
        let mut stocks = self.stocks.lock().unwrap();
        let stock = Stock {
            id: stocks.len() as i64 + 1,
            ticker: ticker.to_string(),
            name: name.to_string(),
            sector: None,
            market: None,
            description: None,
            is_active: true,
        };
        stocks.push(stock.clone());
        Ok(stock)
    }

    async fn refresh_prices(&self, ticker: &str, period: &str) -> Result<PriceRefresh> {
        self.call("refresh", format!("refresh:{}:{}", ticker, period)).await?;
        Ok(PriceRefresh {
            ticker: ticker.to_string(),
            count: 245,
            prices: Vec::new(),
            message: None,
        })
    }

    async fn get_prices(&self, ticker: &str, limit: u32) -> Result<PriceList> {
        self.call("prices", format!("prices:{}:{}", ticker, limit)).await?;
        Ok(PriceList {
            ticker: ticker.to_string(),
            count: 0,
            prices: Vec::new(),
        })
    }

    /// `days / 30` records; every close equals the call's sequence number so
    /// tests can tell which request produced a cached value
    async fn get_technical_indicators(
        &self,
        ticker: &str,
        days: u32,
    ) -> Result<Vec<TechnicalIndicatorRecord>> {
        let seq = self
            .call("technical", format!("technical:{}:{}", ticker, days))
            .await?;
        let close = seq as f64;
        Ok((0..days / 30)
            .map(|i| TechnicalIndicatorRecord::new(day(i), close, close, close, close, 100.0))
            .collect())
    }

    async fn predict_return(
        &self,
        ticker: &str,
        target_days: u32,
    ) -> Result<Option<PredictionResult>> {
        self.call("prediction", format!("prediction:{}:{}", ticker, target_days))
            .await?;
        if self.short_history.lock().unwrap().contains(ticker) {
            return Ok(None);
        }
        Ok(Some(PredictionResult {
            ticker: ticker.to_string(),
            target_days,
            predicted_return: 0.042,
            confidence: None,
        }))
    }

    async fn get_news(&self, query: &str, limit: u32) -> Result<NewsList> {
        self.call("news", format!("news:{}:{}", query, limit)).await?;
        let articles: Vec<NewsArticle> = (0..limit.min(2))
            .map(|i| NewsArticle {
                title: format!("{} headline {}", query, i + 1),
                source: "Wire".to_string(),
                published: None,
                url: format!("https://news.example/{}", i),
                summary: String::new(),
            })
            .collect();
        Ok(NewsList {
            query: query.to_string(),
            count: articles.len() as u64,
            articles,
        })
    }

    async fn analyze_sentiment(&self, text: &str) -> Result<Sentiment> {
        self.call("sentiment", "sentiment".to_string()).await?;
        Ok(Sentiment {
            text: text.to_string(),
            label: "positive".to_string(),
            score: 0.9,
        })
    }

    async fn list_macro_indicators(&self) -> Result<MacroIndicatorList> {
        self.call("macro_indicators", "macro_indicators".to_string()).await?;
        Ok(MacroIndicatorList {
            indicators: vec![MacroIndicatorInfo {
                key: "cpi".to_string(),
                name: "CPI".to_string(),
                series_id: "CPIAUCSL".to_string(),
            }],
        })
    }

    async fn get_macro_indicator(&self, key: &str, limit: u32) -> Result<MacroSeries> {
        self.call("macro", format!("macro:{}:{}", key, limit)).await?;
        Ok(MacroSeries {
            indicator: key.to_string(),
            name: key.to_uppercase(),
            series_id: "SERIES".to_string(),
            data: Vec::new(),
            total: 0,
        })
    }

    async fn refresh_macro_indicator(&self, key: &str, limit: u32) -> Result<MacroRefresh> {
        self.call("macro_refresh", format!("macro_refresh:{}:{}", key, limit))
            .await?;
        Ok(MacroRefresh {
            indicator: key.to_string(),
            saved_count: limit as u64,
            message: None,
        })
    }

    async fn health(&self) -> Result<HealthStatus> {
        self.call("health", "health".to_string()).await?;
        Ok(HealthStatus {
            status: "healthy".to_string(),
            version: "0.1.0".to_string(),
            database: "healthy".to_string(),
        })
    }
}
