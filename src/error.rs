use thiserror::Error as ThisError;

/// Errors surfaced by the API client, the query cache and the mutation coordinator.
///
/// Payloads are plain strings so one failure can be cloned out to every
/// subscriber waiting on the same query.
#[derive(ThisError, Debug, Clone, PartialEq)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("API error {status}: {detail}")]
    Api { status: u16, detail: String },

    #[error("Parse error: {0}")]
    Parse(String),

    /// A query's result was read before its request settled
    #[error("Query not settled: {0}")]
    NotSettled(String),
}

impl AppError {
    /// Transport level failures that only an explicit retry can recover from
    pub fn is_transport(&self) -> bool {
        matches!(self, AppError::Network(_) | AppError::Timeout(_))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Timeout(err.to_string())
        } else if err.is_decode() {
            AppError::Parse(err.to_string())
        } else {
            AppError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Parse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

// Alias for convenience
pub type Error = AppError;
