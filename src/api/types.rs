//! Response types for the non-analysis endpoints.

use serde::{Deserialize, Serialize};

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_seconds: u64,
    pub model: String,
    /// Whether the upstream credential is present. The value itself is
    /// never reported.
    pub credential_configured: bool,
}
