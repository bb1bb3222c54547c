//! Error types for upstream calls.

use thiserror::Error;

/// Errors that can occur during a single upstream call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    /// Upstream returned a non-success HTTP status.
    #[error("Upstream error {status}: {message}")]
    Status { status: u16, message: String },

    /// Network connectivity error (DNS, connection refused, etc.).
    #[error("Network error: {0}")]
    Network(String),

    /// Request exceeded the per-call deadline.
    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    /// Success response whose body doesn't match the expected format.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl UpstreamError {
    /// Status reported by the upstream itself, if it answered at all.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            UpstreamError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Status to surface to the caller.
    pub fn http_status(&self) -> u16 {
        match self {
            UpstreamError::Status { status, .. } => *status,
            UpstreamError::Network(_) | UpstreamError::InvalidResponse(_) => 502,
            UpstreamError::Timeout(_) => 504,
        }
    }

    /// Message safe to show to the caller.
    pub fn user_message(&self) -> String {
        match self {
            UpstreamError::Status { message, .. } => message.clone(),
            UpstreamError::Network(_) => "Upstream service is unreachable".to_string(),
            UpstreamError::Timeout(_) => "Upstream request timed out".to_string(),
            UpstreamError::InvalidResponse(_) => "Upstream returned an invalid response".to_string(),
        }
    }

    /// Build from a reqwest failure. The URL is stripped so the credential
    /// carried in the query string cannot reach logs or messages.
    pub fn from_transport(error: reqwest::Error, timeout_ms: u64) -> Self {
        if error.is_timeout() {
            UpstreamError::Timeout(timeout_ms)
        } else {
            UpstreamError::Network(error.without_url().to_string())
        }
    }
}
