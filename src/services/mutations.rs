//! State-changing operations and the cache invalidations they trigger
//!
//! A `Mutation` is a message: it carries its payload and declares which
//! cached queries it makes untrustworthy. The coordinator dispatches it and
//! hands the declared filters to the cache only once success is observed,
//! so a failed mutation never touches cached state.

use std::sync::Arc;
use tracing::{info, warn};

use crate::constants::{DEFAULT_FETCH_PERIOD, DEFAULT_MACRO_LIMIT};
use crate::error::{AppError, Result};
use crate::models::{MacroRefresh, PriceRefresh, Stock};
use crate::services::api_client::ResourceClient;
use crate::services::query_cache::QueryCache;
use crate::services::query_key::{Operation, QueryFilter, QueryKey};
use crate::services::validation::{
    validate_new_stock, validate_period, validate_query, validate_ticker,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Register { ticker: String, name: String },
    RefreshPrices { ticker: String, period: String },
    RefreshMacro { key: String, limit: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutput {
    Registered(Stock),
    PricesRefreshed(PriceRefresh),
    MacroRefreshed(MacroRefresh),
}

impl Mutation {
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::Register { .. } => "register",
            Mutation::RefreshPrices { .. } => "refresh_prices",
            Mutation::RefreshMacro { .. } => "refresh_macro",
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Mutation::Register { ticker, name } => validate_new_stock(ticker, name),
            Mutation::RefreshPrices { ticker, period } => {
                validate_ticker(ticker)?;
                validate_period(period)
            }
            Mutation::RefreshMacro { key, .. } => validate_query(key),
        }
    }

    /// Queries to invalidate on success, in the order they must refetch
    pub fn invalidates(&self) -> Vec<QueryFilter> {
        match self {
            Mutation::Register { ticker, .. } => vec![
                QueryFilter::Operation(Operation::Stocks),
                QueryFilter::Exact(QueryKey::stock(ticker.trim())),
            ],
            // indicators are derived from prices, so prices go first
            Mutation::RefreshPrices { ticker, .. } => vec![
                QueryFilter::subject(Operation::Prices, ticker.trim()),
                QueryFilter::subject(Operation::Technical, ticker.trim()),
            ],
            Mutation::RefreshMacro { key, .. } => {
                vec![QueryFilter::subject(Operation::Macro, key.trim())]
            }
        }
    }

    async fn dispatch(&self, client: &dyn ResourceClient) -> Result<MutationOutput> {
        match self {
            Mutation::Register { ticker, name } => client
                .register_stock(ticker, name)
                .await
                .map(MutationOutput::Registered),
            Mutation::RefreshPrices { ticker, period } => client
                .refresh_prices(ticker, period)
                .await
                .map(MutationOutput::PricesRefreshed),
            Mutation::RefreshMacro { key, limit } => client
                .refresh_macro_indicator(key, *limit)
                .await
                .map(MutationOutput::MacroRefreshed),
        }
    }
}

fn unexpected(mutation: &str) -> AppError {
    AppError::Parse(format!("unexpected output for {}", mutation))
}

pub struct MutationCoordinator {
    client: Arc<dyn ResourceClient>,
    cache: QueryCache,
}

impl MutationCoordinator {
    pub fn new(client: Arc<dyn ResourceClient>, cache: QueryCache) -> Self {
        Self { client, cache }
    }

    /// Uses the cache's client
    pub fn for_cache(cache: QueryCache) -> Self {
        Self::new(cache.client(), cache)
    }

    /// Register a ticker; the stocks list refetches on success
    pub async fn register(&self, ticker: &str, name: &str) -> Result<Stock> {
        let mutation = Mutation::Register {
            ticker: ticker.to_string(),
            name: name.to_string(),
        };
        match self.execute(mutation).await? {
            MutationOutput::Registered(stock) => Ok(stock),
            _ => Err(unexpected("register")),
        }
    }

    /// Pull one year of prices; prices then indicators refetch on success
    ///
    /// Overlapping calls for one ticker are not deduplicated. Each success
    /// re-issues the indicator request, superseding any still in flight.
    pub async fn force_refresh(&self, ticker: &str) -> Result<PriceRefresh> {
        self.force_refresh_period(ticker, DEFAULT_FETCH_PERIOD).await
    }

    pub async fn force_refresh_period(&self, ticker: &str, period: &str) -> Result<PriceRefresh> {
        let mutation = Mutation::RefreshPrices {
            ticker: ticker.to_string(),
            period: period.to_string(),
        };
        match self.execute(mutation).await? {
            MutationOutput::PricesRefreshed(refresh) => Ok(refresh),
            _ => Err(unexpected("refresh_prices")),
        }
    }

    pub async fn refresh_macro(&self, key: &str, limit: Option<u32>) -> Result<MacroRefresh> {
        let mutation = Mutation::RefreshMacro {
            key: key.to_string(),
            limit: limit.unwrap_or(DEFAULT_MACRO_LIMIT),
        };
        match self.execute(mutation).await? {
            MutationOutput::MacroRefreshed(refresh) => Ok(refresh),
            _ => Err(unexpected("refresh_macro")),
        }
    }

    /// Validate, dispatch, then on success invalidate what the mutation declares
    pub async fn execute(&self, mutation: Mutation) -> Result<MutationOutput> {
        mutation.validate()?;

        let output = match mutation.dispatch(self.client.as_ref()).await {
            Ok(output) => output,
            Err(e) => {
                warn!("{} failed, cache left untouched: {}", mutation.name(), e);
                return Err(e);
            }
        };

        let refetched = self.cache.invalidate(&mutation.invalidates()).await;
        info!(
            "{} succeeded, refetching {} queries",
            mutation.name(),
            refetched.len()
        );
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ClientConfig;
    use crate::services::testing::ScriptedClient;
    use std::time::Duration;

    fn setup() -> (Arc<ScriptedClient>, QueryCache, MutationCoordinator) {
        let client = Arc::new(ScriptedClient::new());
        let cache = QueryCache::new(client.clone(), &ClientConfig::default());
        let coordinator = MutationCoordinator::new(client.clone(), cache.clone());
        (client, cache, coordinator)
    }

    #[test]
    fn test_refresh_invalidates_prices_before_technical() {
        let mutation = Mutation::RefreshPrices {
            ticker: "7203.T".to_string(),
            period: "1y".to_string(),
        };
        assert_eq!(
            mutation.invalidates(),
            vec![
                QueryFilter::subject(Operation::Prices, "7203.T"),
                QueryFilter::subject(Operation::Technical, "7203.T"),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_force_refresh_then_refetches_indicators() {
        let (client, cache, coordinator) = setup();
        client.delay("refresh", Duration::from_secs(3));
        let mut sub = cache.subscribe(QueryKey::technical("7203.T", None)).await;
        sub.settled().await;

        let refresh = coordinator.force_refresh("7203.T").await.unwrap();
        assert_eq!(refresh.count, 245);

        let state = sub.settled().await;
        assert!(state.is_ready());
        assert_eq!(
            client.calls(),
            vec!["technical:7203.T:90", "refresh:7203.T:1y", "technical:7203.T:90"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_refresh_leaves_cache_untouched() {
        let (client, cache, coordinator) = setup();
        let key = QueryKey::technical("7203.T", None);
        let mut sub = cache.subscribe(key.clone()).await;
        let before = sub.settled().await;

        client.fail("refresh");
        let err = coordinator.force_refresh("7203.T").await.unwrap_err();
        assert!(err.is_transport());

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(client.count("technical"), 1);
        assert_eq!(cache.state(&key).await, before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_refreshes_settle_on_latest() {
        let (client, cache, coordinator) = setup();
        client.delay("refresh", Duration::from_secs(2));
        client.delay("technical", Duration::from_millis(500));
        let mut sub = cache.subscribe(QueryKey::technical("7203.T", None)).await;
        sub.settled().await;

        let (a, b) = tokio::join!(
            coordinator.force_refresh("7203.T"),
            coordinator.force_refresh("7203.T")
        );
        assert!(a.is_ok() && b.is_ok());

        let state = sub.settled().await;
        assert!(state.is_ready());
        assert_eq!(client.count("refresh"), 2);
        // the last issued request is the one whose data is kept
        let last_seq = client.calls().len() as f64;
        let closes: Vec<f64> = state
            .data
            .unwrap()
            .as_technical()
            .unwrap()
            .iter()
            .map(|r| r.close)
            .collect();
        assert_eq!(closes, vec![last_seq; 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_register_refetches_stock_list() {
        let (client, cache, coordinator) = setup();
        let mut sub = cache.subscribe(QueryKey::stocks()).await;
        let before = sub.settled().await;
        assert_eq!(before.data.unwrap().as_stocks().unwrap().total, 0);

        let stock = coordinator.register("7203.T", "Toyota").await.unwrap();
        assert_eq!(stock.ticker, "7203.T");

        let after = sub.settled().await;
        let list = after.data.unwrap();
        let list = list.as_stocks().unwrap();
        assert_eq!(list.total, 1);
        assert!(list.find("7203.T").is_some());
        assert_eq!(client.count("stocks"), 2);
    }

    #[tokio::test]
    async fn test_register_rejects_empty_name_before_dispatch() {
        let (client, cache, coordinator) = setup();
        let err = coordinator.register("7203.T", "  ").await.unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(client.count("register"), 0);
        assert!(cache.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_untrimmed_ticker_still_refetches_indicators() {
        let (client, cache, coordinator) = setup();
        let mut sub = cache.subscribe(QueryKey::technical("7203.T ", None)).await;
        sub.settled().await;

        coordinator.force_refresh(" 7203.T ").await.unwrap();
        assert!(sub.settled().await.is_ready());

        assert_eq!(client.count("technical:7203.T:90"), 2);
        assert_eq!(client.count("refresh"), 1);
    }

    #[tokio::test]
    async fn test_refresh_rejects_empty_period_before_dispatch() {
        let (client, _cache, coordinator) = setup();
        let err = coordinator.force_refresh_period("7203.T", "").await.unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(client.count("refresh"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_macro_refetches_series() {
        let (client, cache, coordinator) = setup();
        let mut sub = cache.subscribe(QueryKey::macro_series("cpi", None)).await;
        sub.settled().await;

        let refresh = coordinator.refresh_macro("cpi", None).await.unwrap();
        assert_eq!(refresh.saved_count, 120);
        sub.settled().await;

        assert_eq!(client.count("macro:cpi:120"), 2);
        assert_eq!(client.count("macro_refresh:cpi:120"), 1);
    }
}
