//! Retry policy configuration

use super::ConfigError;
use serde::{Deserialize, Serialize};

/// Upper bound on `max_attempts`.
pub const MAX_ATTEMPTS_LIMIT: u32 = 10;

/// Rate-limit retry settings.
///
/// `max_attempts` counts every call including the first. The delay before
/// retry *n* is `delays_ms[n - 1]`, reusing the last entry once the schedule
/// runs out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub delays_ms: Vec<u64>,
    pub retry_on_status: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            delays_ms: vec![2000, 4000, 8000],
            retry_on_status: vec![429],
        }
    }
}

impl RetryConfig {
    /// Delay in milliseconds after `attempt` fails, reusing the last entry.
    pub fn delay_ms_after(&self, attempt: u32) -> u64 {
        let index = (attempt.saturating_sub(1) as usize).min(self.delays_ms.len().saturating_sub(1));
        self.delays_ms.get(index).copied().unwrap_or_default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 || self.max_attempts > MAX_ATTEMPTS_LIMIT {
            return Err(ConfigError::invalid(
                "retry.max_attempts",
                format!("must be between 1 and {}", MAX_ATTEMPTS_LIMIT),
            ));
        }
        if self.max_attempts > 1 && self.delays_ms.is_empty() {
            return Err(ConfigError::invalid(
                "retry.delays_ms",
                "a delay schedule is required when retries are enabled",
            ));
        }
        if self.delays_ms.windows(2).any(|pair| pair[1] < pair[0]) {
            return Err(ConfigError::invalid(
                "retry.delays_ms",
                "delays must be non-decreasing",
            ));
        }
        if let Some(status) = self
            .retry_on_status
            .iter()
            .find(|status| !(400..=599).contains(*status))
        {
            return Err(ConfigError::invalid(
                "retry.retry_on_status",
                format!("{} is not an error status", status),
            ));
        }
        Ok(())
    }
}
