//! The analysis pipeline.
//!
//! `credential → classify → retry controller → normalize`, with every
//! failure folded into [`AnalysisError`]. Used by both the HTTP handler and
//! the `analyze` CLI command.

use crate::analysis::{classify, AnalysisError, AnalysisRequest};
use crate::config::GatewayConfig;
use crate::logging::truncate_preview;
use crate::normalize::{normalize, NormalizedResponse};
use crate::resilience::{RetryController, RetryError, RetryPolicy, Sleeper, TOO_MANY_REQUESTS};
use crate::upstream::{
    credential, CredentialSource, EnvCredential, GeminiInvoker, UpstreamError, UpstreamInvoker,
};
use std::sync::Arc;

/// Request-scoped pipeline shared by all handlers.
pub struct AnalysisGateway {
    credentials: Arc<dyn CredentialSource>,
    controller: RetryController,
    content_logging: bool,
}

impl AnalysisGateway {
    pub fn new(
        invoker: Arc<dyn UpstreamInvoker>,
        credentials: Arc<dyn CredentialSource>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            credentials,
            controller: RetryController::new(invoker, policy),
            content_logging: false,
        }
    }

    /// Build the production pipeline: Gemini invoker, credential from the
    /// configured environment variable, retry policy from `[retry]`.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, UpstreamError> {
        let invoker = GeminiInvoker::from_config(&config.upstream)?;
        let credentials = EnvCredential::new(config.upstream.api_key_env.clone());
        Ok(Self::new(
            Arc::new(invoker),
            Arc::new(credentials),
            RetryPolicy::from(&config.retry),
        )
        .with_content_logging(config.logging.enable_content_logging))
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.controller = self.controller.with_sleeper(sleeper);
        self
    }

    pub fn with_content_logging(mut self, enabled: bool) -> Self {
        self.content_logging = enabled;
        self
    }

    pub fn model(&self) -> &str {
        self.controller.invoker().model()
    }

    /// Whether a usable credential is currently available.
    pub fn credential_configured(&self) -> bool {
        credential::resolve(self.credentials.as_ref()).is_some()
    }

    /// Run one request through the pipeline.
    pub async fn analyze(
        &self,
        request: &AnalysisRequest,
    ) -> Result<NormalizedResponse, AnalysisError> {
        let key = credential::resolve(self.credentials.as_ref())
            .ok_or(AnalysisError::MissingCredential)?;

        let prompt = classify(request);
        if let Some(preview) = truncate_preview(prompt.user_message(), self.content_logging) {
            tracing::debug!(category = %request.category, user_message = %preview, "composed prompt");
        }

        let reply = self
            .controller
            .run(&prompt, &key)
            .await
            .map_err(translate_retry_error)?;

        if let Some(preview) = truncate_preview(&reply.text, self.content_logging) {
            tracing::debug!(category = %request.category, upstream_text = %preview, "upstream text");
        }

        normalize(&reply.text, prompt.expected_shape())
            .map_err(|e| AnalysisError::UpstreamShape(e.to_string()))
    }
}

/// Map the controller's terminal state onto the failure taxonomy.
fn translate_retry_error(error: RetryError) -> AnalysisError {
    match error {
        RetryError::Exhausted { attempts, last }
            if last.upstream_status() == Some(TOO_MANY_REQUESTS) =>
        {
            AnalysisError::UpstreamRateLimited { attempts }
        }
        RetryError::Exhausted { last, .. } => translate_upstream_error(last),
        RetryError::Failed(error) => translate_upstream_error(error),
    }
}

fn translate_upstream_error(error: UpstreamError) -> AnalysisError {
    match error {
        UpstreamError::InvalidResponse(detail) => AnalysisError::UpstreamShape(detail),
        other => AnalysisError::UpstreamTransport {
            status: other.http_status(),
            message: other.user_message(),
        },
    }
}
