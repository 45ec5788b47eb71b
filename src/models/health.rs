use serde::{Deserialize, Serialize};

/// Response of `GET /health`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub database: String,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy" && self.database == "healthy"
    }
}
