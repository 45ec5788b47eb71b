use clap::{Parser, Subcommand};

use crate::commands::{self, App};
use crate::constants::{
    DEFAULT_FETCH_PERIOD, DEFAULT_INDICATOR_DAYS, DEFAULT_MACRO_LIMIT, DEFAULT_NEWS_LIMIT,
    DEFAULT_PRICE_LIMIT, DEFAULT_TARGET_DAYS,
};
use crate::models::ClientConfig;
use crate::utils::normalize_base_url;

#[derive(Parser)]
#[command(name = "stockscope")]
#[command(about = "Stock analytics API client", long_about = None)]
pub struct Cli {
    /// API base URL (overrides STOCKSCOPE_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List registered stocks
    Stocks,
    /// Register a ticker for tracking
    Register {
        /// Ticker symbol (e.g. 7203.T, AAPL)
        ticker: String,
        /// Company name
        name: String,
    },
    /// Pull fresh prices from the upstream source
    Refresh {
        ticker: String,
        /// Lookback period (1mo, 3mo, 6mo, 1y, 2y, 5y)
        #[arg(short, long, default_value = DEFAULT_FETCH_PERIOD)]
        period: String,
    },
    /// Show stored daily prices
    Prices {
        ticker: String,
        #[arg(short, long, default_value_t = DEFAULT_PRICE_LIMIT)]
        limit: u32,
    },
    /// Chart summary, prediction and news for one ticker
    Detail {
        ticker: String,
        /// Indicator window in days
        #[arg(short, long, default_value_t = DEFAULT_INDICATOR_DAYS)]
        days: u32,
        /// Prediction horizon in days
        #[arg(short, long, default_value_t = DEFAULT_TARGET_DAYS)]
        target_days: u32,
    },
    /// Search news
    News {
        query: String,
        #[arg(short, long, default_value_t = DEFAULT_NEWS_LIMIT)]
        limit: u32,
    },
    /// Classify the sentiment of a text
    Sentiment { text: String },
    /// List macro indicators, or show one series
    Macro {
        key: Option<String>,
        #[arg(short, long, default_value_t = DEFAULT_MACRO_LIMIT)]
        limit: u32,
        /// Pull the series from the upstream source first
        #[arg(long)]
        fetch: bool,
    },
    /// Check API health
    Health,
}

fn build_app(api_url: Option<String>) -> crate::Result<App> {
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = api_url {
        config.base_url = normalize_base_url(&url)?;
    }
    App::new(&config)
}

pub async fn run() {
    let cli = Cli::parse();

    let app = match build_app(cli.api_url) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            std::process::exit(1);
        }
    };

    match cli.command {
        Commands::Stocks => {
            commands::stocks::run(&app).await;
        }
        Commands::Register { ticker, name } => {
            commands::register::run(&app, &ticker, &name).await;
        }
        Commands::Refresh { ticker, period } => {
            commands::refresh::run(&app, &ticker, &period).await;
        }
        Commands::Prices { ticker, limit } => {
            commands::prices::run(&app, &ticker, limit).await;
        }
        Commands::Detail {
            ticker,
            days,
            target_days,
        } => {
            commands::detail::run(&app, &ticker, days, target_days).await;
        }
        Commands::News { query, limit } => {
            commands::news::run(&app, &query, limit).await;
        }
        Commands::Sentiment { text } => {
            commands::sentiment::run(&app, &text).await;
        }
        Commands::Macro { key, limit, fetch } => {
            commands::macro_series::run(&app, key.as_deref(), limit, fetch).await;
        }
        Commands::Health => {
            commands::health::run(&app).await;
        }
    }
}
