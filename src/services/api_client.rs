use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{AppError, Result};
use crate::models::{
    ClientConfig, HealthStatus, MacroIndicatorList, MacroRefresh, MacroRefreshRequest, MacroSeries,
    NewStock, NewsList, PredictionResult, PriceList, PriceRefresh, PriceRefreshRequest, Sentiment,
    SentimentRequest, Stock, StockList, TechnicalIndicatorRecord,
};
use crate::services::validation::{
    validate_new_stock, validate_period, validate_query, validate_sentiment_text, validate_ticker,
};

/// Typed contract of the stock analytics API
///
/// Implementations only shape requests and decode responses: no caching,
/// no retries. Errors are returned untouched to the caller.
#[async_trait]
pub trait ResourceClient: Send + Sync {
    async fn list_stocks(&self) -> Result<StockList>;

    async fn get_stock(&self, ticker: &str) -> Result<Stock>;

    async fn register_stock(&self, ticker: &str, name: &str) -> Result<Stock>;

    /// Pull fresh prices from the upstream data source (slow, mutating)
    async fn refresh_prices(&self, ticker: &str, period: &str) -> Result<PriceRefresh>;

    async fn get_prices(&self, ticker: &str, limit: u32) -> Result<PriceList>;

    async fn get_technical_indicators(
        &self,
        ticker: &str,
        days: u32,
    ) -> Result<Vec<TechnicalIndicatorRecord>>;

    /// `Ok(None)` means the ticker does not have enough history to predict
    async fn predict_return(
        &self,
        ticker: &str,
        target_days: u32,
    ) -> Result<Option<PredictionResult>>;

    async fn get_news(&self, query: &str, limit: u32) -> Result<NewsList>;

    async fn analyze_sentiment(&self, text: &str) -> Result<Sentiment>;

    async fn list_macro_indicators(&self) -> Result<MacroIndicatorList>;

    async fn get_macro_indicator(&self, key: &str, limit: u32) -> Result<MacroSeries>;

    async fn refresh_macro_indicator(&self, key: &str, limit: u32) -> Result<MacroRefresh>;

    async fn health(&self) -> Result<HealthStatus>;
}

/// `ResourceClient` over HTTP/JSON
pub struct HttpResourceClient {
    base_url: Url,
    client: reqwest::Client,
}

impl HttpResourceClient {
    /// Create a new API client
    ///
    /// # Arguments
    /// * `config` - base URL (e.g. "http://localhost:8000/api/v1") and request timeout
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| AppError::Config(format!("Invalid base_url '{}': {}", config.base_url, e)))?;

        if base_url.cannot_be_a_base() {
            return Err(AppError::Config(format!(
                "Invalid base_url '{}': cannot be a base",
                config.base_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            "Created HttpResourceClient: base_url='{}', timeout={:?}",
            base_url, config.timeout
        );

        Ok(Self { base_url, client })
    }

    /// Join path segments onto the base URL, percent-encoding each one
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| AppError::Config("base_url cannot be a base".to_string()))?;
            path.pop_if_empty();
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
        Ok(self.client.request(method, self.endpoint(segments)?))
    }

    async fn send(&self, operation: &str, builder: RequestBuilder) -> Result<Response> {
        let started = Instant::now();
        let response = builder.send().await.map_err(|e| {
            let err = AppError::from(e);
            warn!("{} failed after {:?}: {}", operation, started.elapsed(), err);
            err
        })?;

        debug!(
            "{} -> {} in {:?}",
            operation,
            response.status(),
            started.elapsed()
        );
        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(&self, operation: &str, response: Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, response).await);
        }

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| AppError::Parse(format!("Failed to parse {} response: {}", operation, e)))
    }
}

/// Map a non-2xx response to an error, preferring the API's `detail` field
async fn status_error(status: StatusCode, response: Response) -> AppError {
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read response body".to_string());

    let detail = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("detail").map(|d| match d {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }))
        .unwrap_or(body);

    if status == StatusCode::NOT_FOUND {
        AppError::NotFound(detail)
    } else {
        AppError::Api {
            status: status.as_u16(),
            detail,
        }
    }
}

#[async_trait]
impl ResourceClient for HttpResourceClient {
    async fn list_stocks(&self) -> Result<StockList> {
        let response = self
            .send("list_stocks", self.request(Method::GET, &["stocks"])?)
            .await?;
        self.decode("list_stocks", response).await
    }

    async fn get_stock(&self, ticker: &str) -> Result<Stock> {
        validate_ticker(ticker)?;
        let response = self
            .send("get_stock", self.request(Method::GET, &["stocks", ticker.trim()])?)
            .await?;
        self.decode("get_stock", response).await
    }

    async fn register_stock(&self, ticker: &str, name: &str) -> Result<Stock> {
        validate_new_stock(ticker, name)?;
        let body = NewStock {
            ticker: ticker.trim().to_string(),
            name: name.trim().to_string(),
        };
        let response = self
            .send(
                "register_stock",
                self.request(Method::POST, &["stocks"])?.json(&body),
            )
            .await?;
        self.decode("register_stock", response).await
    }

    async fn refresh_prices(&self, ticker: &str, period: &str) -> Result<PriceRefresh> {
        validate_ticker(ticker)?;
        validate_period(period)?;
        let body = PriceRefreshRequest {
            period: period.trim().to_string(),
        };
        let response = self
            .send(
                "refresh_prices",
                self.request(Method::POST, &["stocks", ticker.trim(), "fetch"])?
                    .json(&body),
            )
            .await?;
        self.decode("refresh_prices", response).await
    }

    async fn get_prices(&self, ticker: &str, limit: u32) -> Result<PriceList> {
        validate_ticker(ticker)?;
        let response = self
            .send(
                "get_prices",
                self.request(Method::GET, &["stocks", ticker.trim(), "prices"])?
                    .query(&[("limit", limit)]),
            )
            .await?;
        self.decode("get_prices", response).await
    }

    async fn get_technical_indicators(
        &self,
        ticker: &str,
        days: u32,
    ) -> Result<Vec<TechnicalIndicatorRecord>> {
        validate_ticker(ticker)?;
        let response = self
            .send(
                "get_technical_indicators",
                self.request(Method::GET, &["analysis", ticker.trim(), "technical"])?
                    .query(&[("days", days)]),
            )
            .await?;
        self.decode("get_technical_indicators", response).await
    }

    async fn predict_return(
        &self,
        ticker: &str,
        target_days: u32,
    ) -> Result<Option<PredictionResult>> {
        validate_ticker(ticker)?;
        let response = self
            .send(
                "predict_return",
                self.request(Method::POST, &["analysis", ticker.trim(), "predict"])?
                    .query(&[("target_days", target_days)]),
            )
            .await?;

        // 400 is how the API says "not enough history", which is a normal outcome
        if response.status() == StatusCode::BAD_REQUEST {
            let reason = status_error(StatusCode::BAD_REQUEST, response).await;
            info!("No prediction for {}: {}", ticker, reason);
            return Ok(None);
        }

        self.decode("predict_return", response).await.map(Some)
    }

    async fn get_news(&self, query: &str, limit: u32) -> Result<NewsList> {
        validate_query(query)?;
        let response = self
            .send(
                "get_news",
                self.request(Method::GET, &["news", query.trim()])?
                    .query(&[("limit", limit)]),
            )
            .await?;
        self.decode("get_news", response).await
    }

    async fn analyze_sentiment(&self, text: &str) -> Result<Sentiment> {
        validate_sentiment_text(text)?;
        let body = SentimentRequest {
            text: text.to_string(),
        };
        let response = self
            .send(
                "analyze_sentiment",
                self.request(Method::POST, &["analysis", "sentiment"])?
                    .json(&body),
            )
            .await?;
        self.decode("analyze_sentiment", response).await
    }

    async fn list_macro_indicators(&self) -> Result<MacroIndicatorList> {
        let response = self
            .send("list_macro_indicators", self.request(Method::GET, &["macro"])?)
            .await?;
        self.decode("list_macro_indicators", response).await
    }

    async fn get_macro_indicator(&self, key: &str, limit: u32) -> Result<MacroSeries> {
        validate_query(key)?;
        let response = self
            .send(
                "get_macro_indicator",
                self.request(Method::GET, &["macro", key.trim()])?
                    .query(&[("limit", limit)]),
            )
            .await?;
        self.decode("get_macro_indicator", response).await
    }

    async fn refresh_macro_indicator(&self, key: &str, limit: u32) -> Result<MacroRefresh> {
        validate_query(key)?;
        let body = MacroRefreshRequest { limit };
        let response = self
            .send(
                "refresh_macro_indicator",
                self.request(Method::POST, &["macro", key.trim(), "fetch"])?
                    .json(&body),
            )
            .await?;
        self.decode("refresh_macro_indicator", response).await
    }

    async fn health(&self) -> Result<HealthStatus> {
        let response = self
            .send("health", self.request(Method::GET, &["health"])?)
            .await?;
        self.decode("health", response).await
    }
}
