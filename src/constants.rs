//! API defaults and presentation constants
//!
//! Query defaults mirror what the analytics API itself assumes when a
//! parameter is omitted, so a cache key built from a default always matches
//! the request that was actually sent.

/// Default API base URL (origin + `/api/v1` base path)
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api/v1";

/// Environment variable overriding the API base URL
pub const ENV_API_URL: &str = "STOCKSCOPE_API_URL";

/// Environment variable overriding the per-request timeout (seconds)
pub const ENV_TIMEOUT_SECS: &str = "STOCKSCOPE_TIMEOUT_SECS";

/// Environment variable overriding the prediction freshness window (seconds)
pub const ENV_PREDICTION_STALE_SECS: &str = "STOCKSCOPE_PREDICTION_STALE_SECS";

/// Per-request timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Prediction results stay fresh for one hour
pub const DEFAULT_PREDICTION_STALE_SECS: u64 = 3600;

/// Number of daily price bars returned by the prices endpoint
pub const DEFAULT_PRICE_LIMIT: u32 = 365;

/// Trailing window of technical indicator records
pub const DEFAULT_INDICATOR_DAYS: u32 = 90;

/// Prediction horizon in trading days
pub const DEFAULT_TARGET_DAYS: u32 = 30;

/// Articles per news query
pub const DEFAULT_NEWS_LIMIT: u32 = 10;

/// Articles shown next to a single stock
pub const DETAIL_NEWS_LIMIT: u32 = 5;

/// Observations per macro indicator
pub const DEFAULT_MACRO_LIMIT: u32 = 120;

/// History period requested when forcing a price refresh
pub const DEFAULT_FETCH_PERIOD: &str = "1y";

/// Minimum history the prediction model needs before it answers
pub const MIN_DAYS_FOR_PREDICTION: usize = 100;

/// Unwatched, settled cache entries older than this are evicted
pub const CACHE_IDLE_EVICT_SECS: u64 = 600;

/// Eviction runs when a new key arrives and the cache holds at least this many
pub const CACHE_GC_MIN_ENTRIES: usize = 64;

/// RSI at or below this level is oversold
pub const RSI_OVERSOLD: f64 = 30.0;

/// RSI at or above this level is overbought
pub const RSI_OVERBOUGHT: f64 = 70.0;

/// Decimal places kept for prices in chart series
pub const PRICE_DECIMALS: u32 = 2;

/// Decimal places kept for RSI in chart series
pub const RSI_DECIMALS: u32 = 1;
