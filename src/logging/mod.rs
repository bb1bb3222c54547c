//! Structured logging helpers
//!
//! Subscriber setup, filter directives, request ids and privacy-safe
//! content previews.

pub mod fields;
pub mod middleware;

pub use fields::truncate_preview;
pub use middleware::{generate_request_id, REQUEST_ID_HEADER};

use crate::config::{LogFormat, LoggingConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build filter directives string from LoggingConfig
///
/// Produces `"<level>,kabu::<component>=<level>,..."`.
///
/// # Examples
///
/// ```
/// use kabu::config::LoggingConfig;
/// use kabu::logging::build_filter_directives;
///
/// let mut config = LoggingConfig::default();
/// config
///     .component_levels
///     .insert("resilience".to_string(), "debug".to_string());
///
/// assert_eq!(build_filter_directives(&config), "info,kabu::resilience=debug");
/// ```
pub fn build_filter_directives(config: &LoggingConfig) -> String {
    let mut filter_str = config.level.clone();

    for (component, level) in &config.component_levels {
        filter_str.push_str(&format!(",kabu::{}={}", component, level));
    }

    filter_str
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG`, when set, takes precedence over the configured directives.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let filter_str = build_filter_directives(config);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    if config.enable_content_logging {
        eprintln!("WARNING: Content logging is enabled. Prompt and upstream previews will be logged.");
        eprintln!("         These may include user queries. Use only for debugging.");
    }

    match config.format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).pretty())
                .try_init()?;
        }
        LogFormat::Compact => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).compact())
                .try_init()?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).json())
                .try_init()?;
        }
    }

    Ok(())
}
