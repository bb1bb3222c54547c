//! Failure taxonomy and its translation into user-facing reports.

use serde::Serialize;
use thiserror::Error;

/// Message returned when the upstream keeps rate-limiting after every retry.
pub const COOL_DOWN_MESSAGE: &str =
    "AIの利用上限に達しました。1分ほど時間をおいてから再度お試しください。";

pub const INVALID_PAYLOAD_MESSAGE: &str = "リクエストの形式が正しくありません。";

pub const MISSING_CREDENTIAL_MESSAGE: &str = "サーバー設定エラー: APIキーが設定されていません。";

pub const SHAPE_ERROR_MESSAGE: &str =
    "AIの応答を解析できませんでした。時間をおいて再度お試しください。";

pub const PAYLOAD_TOO_LARGE_MESSAGE: &str = "リクエストのサイズが大きすぎます。";

pub const DEADLINE_MESSAGE: &str =
    "AIの応答に時間がかかりすぎました。時間をおいて再度お試しください。";

pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Every way a single analysis request can fail.
///
/// Detail strings carried by `InvalidPayload`, `UpstreamShape` and
/// `Internal` are for logs only; [`AnalysisError::report`] replaces them
/// with fixed messages.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// Inbound body is not parseable as an analysis request.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// Inbound body exceeds `server.max_body_bytes`.
    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// The upstream credential is absent or blank.
    #[error("upstream credential is not configured")]
    MissingCredential,

    /// Non-retryable upstream failure, surfaced with the upstream's status.
    #[error("upstream error {status}: {message}")]
    UpstreamTransport { status: u16, message: String },

    /// Still rate-limited after the retry budget was spent.
    #[error("upstream rate limited after {attempts} attempts")]
    UpstreamRateLimited { attempts: u32 },

    /// Upstream succeeded but its content does not have the expected shape.
    #[error("unusable upstream content: {0}")]
    UpstreamShape(String),

    /// Whole-request deadline (`server.request_timeout_seconds`) passed,
    /// retries included.
    #[error("request did not finish within {seconds}s")]
    DeadlineExceeded { seconds: u64 },

    #[error("internal error: {0}")]
    Internal(String),
}

impl AnalysisError {
    /// Stable label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::InvalidPayload(_) => "invalid_payload",
            AnalysisError::PayloadTooLarge { .. } => "payload_too_large",
            AnalysisError::MissingCredential => "missing_credential",
            AnalysisError::UpstreamTransport { .. } => "upstream_transport",
            AnalysisError::UpstreamRateLimited { .. } => "upstream_rate_limited",
            AnalysisError::UpstreamShape(_) => "upstream_shape",
            AnalysisError::DeadlineExceeded { .. } => "deadline_exceeded",
            AnalysisError::Internal(_) => "internal",
        }
    }

    /// Translate into the externally visible failure.
    pub fn report(&self) -> FailureReport {
        match self {
            AnalysisError::InvalidPayload(_) => FailureReport::new(400, INVALID_PAYLOAD_MESSAGE),
            AnalysisError::PayloadTooLarge { .. } => {
                FailureReport::new(413, PAYLOAD_TOO_LARGE_MESSAGE)
            }
            AnalysisError::MissingCredential => {
                FailureReport::new(500, MISSING_CREDENTIAL_MESSAGE)
            }
            AnalysisError::UpstreamTransport { status, message } => {
                FailureReport::new(*status, message.clone())
            }
            AnalysisError::UpstreamRateLimited { .. } => FailureReport::new(429, COOL_DOWN_MESSAGE),
            AnalysisError::UpstreamShape(_) => FailureReport::new(500, SHAPE_ERROR_MESSAGE),
            AnalysisError::DeadlineExceeded { .. } => FailureReport::new(504, DEADLINE_MESSAGE),
            AnalysisError::Internal(_) => FailureReport::new(500, INTERNAL_ERROR_MESSAGE),
        }
    }
}

/// Externally visible error result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureReport {
    #[serde(skip)]
    pub http_status: u16,
    #[serde(rename = "error")]
    pub message: String,
}

impl FailureReport {
    pub fn new(http_status: u16, message: impl Into<String>) -> Self {
        Self {
            http_status,
            message: message.into(),
        }
    }
}
