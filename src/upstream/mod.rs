//! Upstream invocation layer.
//!
//! This module provides the [`UpstreamInvoker`] trait that performs exactly
//! one call to the text-generation endpoint, plus the credential plumbing
//! that feeds it.

use async_trait::async_trait;
use secrecy::SecretString;

pub mod credential;
pub mod error;
pub mod google;

pub use credential::{CredentialSource, EnvCredential, StaticCredential};
pub use error::UpstreamError;
pub use google::GeminiInvoker;

use crate::analysis::PromptSpec;

/// Text returned by a successful upstream call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamReply {
    pub status: u16,
    pub text: String,
}

impl UpstreamReply {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            status: 200,
            text: text.into(),
        }
    }
}

/// Outcome of one upstream attempt.
pub type UpstreamCallResult = Result<UpstreamReply, UpstreamError>;

/// Performs a single call to the generation endpoint.
///
/// Implementations must not retry on their own; retries are owned by
/// [`crate::resilience::RetryController`].
///
/// # Object Safety
///
/// Designed to be used as `Arc<dyn UpstreamInvoker>`.
#[async_trait]
pub trait UpstreamInvoker: Send + Sync + 'static {
    /// Model identifier used for logs and health output.
    fn model(&self) -> &str;

    /// Issue one call with the composed prompt.
    ///
    /// # Returns
    ///
    /// - `Ok(UpstreamReply)` on a 2xx response carrying text
    /// - `Err(UpstreamError::Status)` for any non-success status
    /// - `Err(UpstreamError::Network)` / `Err(UpstreamError::Timeout)` on transport failure
    /// - `Err(UpstreamError::InvalidResponse)` if a 2xx body has no usable text
    async fn invoke(&self, prompt: &PromptSpec, credential: &SecretString) -> UpstreamCallResult;
}
