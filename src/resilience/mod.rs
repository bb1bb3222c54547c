//! Retry with backoff around the upstream invoker.
//!
//! Each request runs a small state machine:
//!
//! ```text
//! Attempting ──► Success
//!     │  ▲
//!     │  └── Retryable (sleep next delay)
//!     └────► Terminal
//! ```
//!
//! Only statuses listed in [`RetryPolicy::retry_on`] (429 by default) lead to
//! `Retryable`, and only while attempts remain. Attempts are strictly
//! sequential.

use crate::analysis::PromptSpec;
use crate::config::RetryConfig;
use crate::upstream::{UpstreamCallResult, UpstreamError, UpstreamInvoker, UpstreamReply};
use async_trait::async_trait;
use secrecy::SecretString;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Rate-limit status code.
pub const TOO_MANY_REQUESTS: u16 = 429;

/// Retry budget and backoff schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total calls allowed, including the first.
    pub max_attempts: u32,
    /// Delay before retry *n* is `delays[min(n - 1, len - 1)]`.
    pub delays: Vec<Duration>,
    /// Upstream statuses that may be retried.
    pub retry_on: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            delays: vec![
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(8),
            ],
            retry_on: vec![TOO_MANY_REQUESTS],
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            delays: config
                .delays_ms
                .iter()
                .map(|ms| Duration::from_millis(*ms))
                .collect(),
            retry_on: config.retry_on_status.clone(),
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after `attempt` failed and before the next one.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let index = (attempt.saturating_sub(1) as usize).min(self.delays.len().saturating_sub(1));
        self.delays.get(index).copied().unwrap_or_default()
    }

    pub fn is_retryable(&self, error: &UpstreamError) -> bool {
        error
            .upstream_status()
            .is_some_and(|status| self.retry_on.contains(&status))
    }

    /// Decide the next state from the outcome of `attempt` (1-based).
    pub fn next_state(&self, attempt: u32, result: UpstreamCallResult) -> AttemptState {
        match result {
            Ok(reply) => AttemptState::Success(reply),
            Err(error) if self.is_retryable(&error) => {
                if attempt < self.max_attempts {
                    AttemptState::Retryable {
                        attempt,
                        delay: self.delay_after(attempt),
                    }
                } else {
                    AttemptState::Terminal(RetryError::Exhausted {
                        attempts: attempt,
                        last: error,
                    })
                }
            }
            Err(error) => AttemptState::Terminal(RetryError::Failed(error)),
        }
    }
}

/// States of one request's retry loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptState {
    Attempting { attempt: u32 },
    Retryable { attempt: u32, delay: Duration },
    Success(UpstreamReply),
    Terminal(RetryError),
}

/// Why the retry loop gave up.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RetryError {
    /// Non-retryable failure on some attempt.
    #[error("{0}")]
    Failed(UpstreamError),

    /// Every attempt ended in a retryable status.
    #[error("retry budget exhausted after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: UpstreamError },
}

/// Suspends the current request between attempts.
#[async_trait]
pub trait Sleeper: Send + Sync + 'static {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Drives the invoker through the retry state machine.
#[derive(Clone)]
pub struct RetryController {
    invoker: Arc<dyn UpstreamInvoker>,
    sleeper: Arc<dyn Sleeper>,
    policy: RetryPolicy,
}

impl RetryController {
    pub fn new(invoker: Arc<dyn UpstreamInvoker>, policy: RetryPolicy) -> Self {
        Self {
            invoker,
            sleeper: Arc::new(TokioSleeper),
            policy,
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn invoker(&self) -> &Arc<dyn UpstreamInvoker> {
        &self.invoker
    }

    /// Run attempts until success, a terminal failure, or budget exhaustion.
    pub async fn run(
        &self,
        prompt: &PromptSpec,
        credential: &SecretString,
    ) -> Result<UpstreamReply, RetryError> {
        let mut state = AttemptState::Attempting { attempt: 1 };
        loop {
            state = match state {
                AttemptState::Attempting { attempt } => {
                    let result = self.invoker.invoke(prompt, credential).await;
                    let next = self.policy.next_state(attempt, result);
                    crate::metrics::record_attempt(&next);
                    next
                }
                AttemptState::Retryable { attempt, delay } => {
                    tracing::warn!(
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "upstream rate limited, backing off"
                    );
                    self.sleeper.sleep(delay).await;
                    AttemptState::Attempting {
                        attempt: attempt + 1,
                    }
                }
                AttemptState::Success(reply) => return Ok(reply),
                AttemptState::Terminal(error) => {
                    tracing::info!(error = %error, "upstream attempts ended");
                    return Err(error);
                }
            };
        }
    }
}
