//! Configuration module for the gateway
//!
//! Provides layered configuration loading from files, environment variables, and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`KABU_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! The upstream credential is never part of this configuration. Only the
//! *name* of the environment variable holding it is (`upstream.api_key_env`).
//!
//! # Example
//!
//! ```rust
//! use kabu::config::GatewayConfig;
//!
//! let config = GatewayConfig::default();
//! assert_eq!(config.server.port, 8000);
//!
//! let toml = r#"
//! [retry]
//! max_attempts = 5
//! delays_ms = [1000, 2000, 4000, 8000]
//! "#;
//! let config: GatewayConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.retry.max_attempts, 5);
//! ```

pub mod error;
pub mod logging;
pub mod retry;
pub mod server;
pub mod upstream;

pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use retry::RetryConfig;
pub use server::ServerConfig;
pub use upstream::UpstreamConfig;

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Unified configuration for the gateway.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Generative-AI endpoint settings
    pub upstream: UpstreamConfig,
    /// Rate-limit retry policy
    pub retry: RetryConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl GatewayConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supports KABU_* environment variables for common settings.
    /// Invalid values are silently ignored (defaults are kept).
    pub fn with_env_overrides(mut self) -> Self {
        // Server settings
        if let Ok(port) = std::env::var("KABU_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }
        if let Ok(host) = std::env::var("KABU_HOST") {
            self.server.host = host;
        }

        // Upstream settings
        if let Ok(model) = std::env::var("KABU_UPSTREAM_MODEL") {
            if !model.trim().is_empty() {
                self.upstream.model = model;
            }
        }
        if let Ok(base_url) = std::env::var("KABU_UPSTREAM_BASE_URL") {
            if !base_url.trim().is_empty() {
                self.upstream.base_url = base_url;
            }
        }

        // Logging settings
        if let Ok(level) = std::env::var("KABU_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("KABU_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }

        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation {
                field: "server.port".to_string(),
                message: "port must be non-zero".to_string(),
            });
        }
        if self.server.request_timeout_seconds == 0 {
            return Err(ConfigError::Validation {
                field: "server.request_timeout_seconds".to_string(),
                message: "request timeout must be non-zero".to_string(),
            });
        }
        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::Validation {
                field: "server.max_body_bytes".to_string(),
                message: "body limit must be non-zero".to_string(),
            });
        }

        self.upstream.validate()?;
        self.retry.validate()?;

        Ok(())
    }

    /// Longest one analysis can run when every attempt hits the upstream
    /// timeout and every retry waits out its full delay.
    pub fn worst_case_request_duration(&self) -> Duration {
        let attempts = self.retry.max_attempts.max(1);
        let calls = Duration::from_secs(self.upstream.timeout_seconds) * attempts;
        let waits: u64 = (1..attempts).map(|n| self.retry.delay_ms_after(n)).sum();
        calls + Duration::from_millis(waits)
    }

    /// True when retries can outlast `server.request_timeout_seconds`, which
    /// then cuts the request short with 504.
    pub fn retry_budget_exceeds_timeout(&self) -> bool {
        self.worst_case_request_duration()
            > Duration::from_secs(self.server.request_timeout_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_gateway_config_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.upstream.api_key_env, "GEMINI_API_KEY");
        assert_eq!(config.retry.max_attempts, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_parse_minimal_toml() {
        let toml = r#"
        [server]
        port = 9000
        "#;

        let config: GatewayConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0"); // Default
    }

    #[test]
    fn test_config_parse_example_toml() {
        let toml = include_str!("../../kabu.example.toml");
        let config: GatewayConfig = toml::from_str(toml).unwrap();
        assert!(config.server.port > 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_parse_retry_section() {
        let toml = r#"
        [retry]
        max_attempts = 5
        delays_ms = [1000, 2000, 4000, 8000, 16000]
        retry_on_status = [429, 503]
        "#;

        let config: GatewayConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.delays_ms.len(), 5);
        assert_eq!(config.retry.retry_on_status, vec![429, 503]);
    }

    #[test]
    fn test_config_load_from_file() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "[server]\nport = 8080").unwrap();

        let config = GatewayConfig::load(Some(temp.path())).unwrap();
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_config_missing_file_error() {
        let result = GatewayConfig::load(Some(Path::new("/nonexistent/kabu.toml")));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_config_invalid_toml_error() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "[server\nport = ").unwrap();

        let result = GatewayConfig::load(Some(temp.path()));
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_config_env_override_port() {
        std::env::set_var("KABU_PORT", "9999");
        let config = GatewayConfig::default().with_env_overrides();
        std::env::remove_var("KABU_PORT");

        assert_eq!(config.server.port, 9999);
    }

    #[test]
    fn test_config_env_override_upstream_model() {
        std::env::set_var("KABU_UPSTREAM_MODEL", "gemini-2.5-pro");
        let config = GatewayConfig::default().with_env_overrides();
        std::env::remove_var("KABU_UPSTREAM_MODEL");

        assert_eq!(config.upstream.model, "gemini-2.5-pro");
    }

    #[test]
    fn test_validate_rejects_zero_port() {
        let mut config = GatewayConfig::default();
        config.server.port = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation { ref field, .. }) if field == "server.port"
        ));
    }

    #[test]
    fn test_validate_rejects_zero_request_timeout() {
        let mut config = GatewayConfig::default();
        config.server.request_timeout_seconds = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation { ref field, .. })
                if field == "server.request_timeout_seconds"
        ));
    }

    #[test]
    fn test_worst_case_request_duration() {
        let config = GatewayConfig::default();
        // 4 calls of 60s plus waits of 2s, 4s and 8s.
        assert_eq!(config.worst_case_request_duration(), Duration::from_secs(254));
        assert!(!config.retry_budget_exceeds_timeout());

        let mut config = GatewayConfig::default();
        config.retry.max_attempts = 6;
        // Last delay is reused for retries 4 and 5.
        assert_eq!(
            config.worst_case_request_duration(),
            Duration::from_secs(6 * 60 + 2 + 4 + 8 + 8 + 8)
        );
        assert!(config.retry_budget_exceeds_timeout());
    }

    #[test]
    fn test_short_request_timeout_is_flagged() {
        let mut config = GatewayConfig::default();
        config.server.request_timeout_seconds = 30;
        assert!(config.validate().is_ok());
        assert!(config.retry_budget_exceeds_timeout());
    }

    #[test]
    fn test_validate_rejects_bad_retry() {
        let mut config = GatewayConfig::default();
        config.retry.delays_ms = vec![4000, 2000];
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation { ref field, .. }) if field == "retry.delays_ms"
        ));
    }
}
