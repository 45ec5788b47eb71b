pub mod decimal;

use crate::error::{AppError, Result};

/// Initialize tracing output, honouring `RUST_LOG` (defaults to `info`)
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();
}

/// Trim whitespace and trailing slashes, and require an http(s) scheme
pub fn normalize_base_url(raw: &str) -> Result<String> {
    let base_url = raw.trim().trim_end_matches('/').to_string();

    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(AppError::Config(format!(
            "Invalid base_url: must start with http:// or https://, got: '{}'",
            base_url
        )));
    }

    Ok(base_url)
}

/// Read an environment variable and parse it, falling back to `default`
pub fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.trim().parse::<T>().ok())
        .unwrap_or(default)
}
