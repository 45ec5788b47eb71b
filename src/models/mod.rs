mod analysis;
mod chart;
mod client_config;
mod health;
mod macro_data;
mod news;
mod price;
mod stock;
pub mod indicators;

pub use analysis::{PredictionResult, Sentiment, SentimentRequest};
pub use chart::{ChartPoint, ChartSeries, RsiZone};
pub use client_config::ClientConfig;
pub use health::HealthStatus;
pub use indicators::TechnicalIndicatorRecord;
pub use macro_data::{
    MacroDataPoint, MacroIndicatorInfo, MacroIndicatorList, MacroRefresh, MacroRefreshRequest,
    MacroSeries,
};
pub use news::{NewsArticle, NewsList};
pub use price::{PriceList, PriceRefresh, PriceRefreshRequest, StockPriceBar};
pub use stock::{NewStock, Stock, StockList};
