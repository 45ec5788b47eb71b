pub mod detail;
pub mod health;
pub mod macro_series;
pub mod news;
pub mod prices;
pub mod refresh;
pub mod register;
pub mod sentiment;
pub mod stocks;

use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::ClientConfig;
use crate::services::{
    HttpResourceClient, MutationCoordinator, QueryCache, QueryKey, ResourceClient,
};

/// Shared client, cache and coordinator for one CLI invocation
pub struct App {
    pub client: Arc<dyn ResourceClient>,
    pub cache: QueryCache,
    pub mutations: MutationCoordinator,
}

impl App {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client: Arc<dyn ResourceClient> = Arc::new(HttpResourceClient::new(config)?);
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: Arc<dyn ResourceClient>, config: &ClientConfig) -> Self {
        let cache = QueryCache::new(client.clone(), config);
        let mutations = MutationCoordinator::new(client.clone(), cache.clone());
        Self {
            client,
            cache,
            mutations,
        }
    }
}

/// Print the error and exit non-zero
pub fn exit_with(e: AppError) -> ! {
    eprintln!("❌ Error: {}", e);
    std::process::exit(1);
}

/// The cache answered a key with another operation's payload
pub fn unexpected_payload(key: &QueryKey) -> AppError {
    AppError::Parse(format!("unexpected payload for {}", key))
}

/// `1234567` -> `1,234,567`
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}
