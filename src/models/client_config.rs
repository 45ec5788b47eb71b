use std::time::Duration;

use crate::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_PREDICTION_STALE_SECS, DEFAULT_TIMEOUT_SECS, ENV_API_URL,
    ENV_PREDICTION_STALE_SECS, ENV_TIMEOUT_SECS,
};
use crate::error::Result;
use crate::utils::{env_or, normalize_base_url};

/// Configuration for the API client and the query cache
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API base URL including the `/api/v1` base path
    pub base_url: String,

    /// Bound on every request
    pub timeout: Duration,

    /// How long a successful prediction is served without refetching
    pub prediction_stale_time: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            prediction_stale_time: Duration::from_secs(DEFAULT_PREDICTION_STALE_SECS),
        }
    }
}

impl ClientConfig {
    /// Create config for a base URL with default timings
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            ..Self::default()
        })
    }

    /// Build config from `STOCKSCOPE_*` environment variables
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var(ENV_API_URL).unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());
        let timeout_secs = env_or(ENV_TIMEOUT_SECS, DEFAULT_TIMEOUT_SECS);
        let stale_secs = env_or(ENV_PREDICTION_STALE_SECS, DEFAULT_PREDICTION_STALE_SECS);

        let config = Self {
            base_url: normalize_base_url(&base_url)?,
            timeout: Duration::from_secs(timeout_secs),
            prediction_stale_time: Duration::from_secs(stale_secs),
        };

        tracing::info!(
            "Client config: base_url={}, timeout={}s, prediction_stale={}s",
            config.base_url,
            timeout_secs,
            stale_secs
        );

        Ok(config)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_prediction_stale_time(mut self, stale: Duration) -> Self {
        self.prediction_stale_time = stale;
        self
    }
}
