use chrono::{DateTime, Utc};

use crate::services::query_key::QueryKey;

/// Performance record for one query resolution
#[derive(Debug, Clone)]
pub struct RequestMetrics {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_ms: u64,
    pub status: RequestStatus,
    pub key: String,
    pub operation: &'static str,
    pub request_id: u64,
    pub data_source: DataSource,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestStatus {
    Success,
    Fail,
    /// Completed after a newer request for the same key was issued
    Superseded,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    /// Served from a fresh cache entry
    Cache,
    /// Waited on a request another consumer already issued
    InFlight,
    /// Issued a new request
    Network,
}

impl RequestMetrics {
    pub fn new(key: &QueryKey, request_id: u64, data_source: DataSource, start_time: DateTime<Utc>) -> Self {
        Self {
            start_time,
            end_time: Utc::now(),
            duration_ms: 0,
            status: RequestStatus::Success,
            key: key.to_string(),
            operation: key.operation().as_str(),
            request_id,
            data_source,
            error_message: None,
        }
    }

    pub fn fail(mut self, message: impl Into<String>) -> Self {
        self.status = RequestStatus::Fail;
        self.error_message = Some(message.into());
        self
    }

    pub fn superseded(mut self) -> Self {
        self.status = RequestStatus::Superseded;
        self
    }

    pub fn complete(&mut self) {
        self.end_time = Utc::now();
        self.duration_ms = (self.end_time - self.start_time).num_milliseconds().max(0) as u64;
    }

    /// Compact single-line form used in the request log
    pub fn log_line(&self) -> String {
        let status_str = match self.status {
            RequestStatus::Success => "OK",
            RequestStatus::Fail => "FAIL",
            RequestStatus::Superseded => "SUPERSEDED",
        };

        let data_source_str = match self.data_source {
            DataSource::Cache => "cache",
            DataSource::InFlight => "inflight",
            DataSource::Network => "network",
        };

        let duration_str = if self.duration_ms >= 1000 {
            format!("{}.{:01}s", self.duration_ms / 1000, (self.duration_ms % 1000) / 100)
        } else {
            format!("{}ms", self.duration_ms)
        };

        let error_info = if let Some(ref error) = self.error_message {
            format!(" error:{}", error)
        } else {
            String::new()
        };

        format!(
            "{} | {} | {} | {} | req:{} op:{} source:{}{}",
            self.start_time.format("%Y-%m-%d %H:%M:%S"),
            duration_str,
            self.key,
            status_str,
            self.request_id,
            self.operation,
            data_source_str,
            error_info
        )
    }
}

/// Complete the metrics and emit them through tracing
pub fn write_request_log(mut metrics: RequestMetrics) {
    metrics.complete();
    match metrics.status {
        RequestStatus::Fail => tracing::warn!("{}", metrics.log_line()),
        _ => tracing::info!("{}", metrics.log_line()),
    }
}
