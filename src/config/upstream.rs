//! Upstream endpoint configuration

use super::ConfigError;
use serde::{Deserialize, Serialize};

/// Generative-AI endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Per-call transport timeout.
    pub timeout_seconds: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-2.5-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            timeout_seconds: 60,
        }
    }
}

impl UpstreamConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::invalid(
                "upstream.base_url",
                "must start with http:// or https://",
            ));
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::invalid("upstream.model", "model cannot be empty"));
        }
        if self.api_key_env.trim().is_empty() {
            return Err(ConfigError::invalid(
                "upstream.api_key_env",
                "environment variable name cannot be empty",
            ));
        }
        if self.timeout_seconds == 0 {
            return Err(ConfigError::invalid(
                "upstream.timeout_seconds",
                "timeout must be non-zero",
            ));
        }
        Ok(())
    }
}
