pub mod api_client;
pub mod api_logging;
pub mod mutations;
pub mod query_cache;
pub mod query_key;
pub mod query_observer;
pub mod validation;

#[cfg(test)]
pub mod testing;

pub use api_client::{HttpResourceClient, ResourceClient};
pub use api_logging::{write_request_log, DataSource, RequestMetrics, RequestStatus};
pub use mutations::{Mutation, MutationCoordinator, MutationOutput};
pub use query_cache::{ListenerHandle, QueryCache, QueryState, QueryStatus, QuerySubscription};
pub use query_key::{Operation, QueryData, QueryFilter, QueryKey};
pub use query_observer::QueryObserver;
