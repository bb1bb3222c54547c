//! Analyze command implementation
//!
//! Runs one request through the same pipeline the HTTP handler uses.

use crate::analysis::{AnalysisRequest, Category, FailureReport};
use crate::cli::AnalyzeArgs;
use crate::config::GatewayConfig;
use crate::gateway::AnalysisGateway;
use colored::Colorize;
use std::fmt;

/// Failure of the `analyze` command.
#[derive(Debug)]
pub enum AnalyzeCommandError {
    /// Configuration or startup problem before any request was made.
    Setup(String),
    /// The pipeline answered with an error result.
    Failed(FailureReport),
}

impl fmt::Display for AnalyzeCommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalyzeCommandError::Setup(message) => write!(f, "Error: {}", message),
            AnalyzeCommandError::Failed(report) => {
                write!(f, "Error ({}): {}", report.http_status, report.message)
            }
        }
    }
}

impl std::error::Error for AnalyzeCommandError {}

impl AnalyzeCommandError {
    /// Colored rendering for terminals.
    pub fn render(&self) -> String {
        self.to_string().red().to_string()
    }
}

/// Build the request from command-line arguments.
pub fn build_request(args: &AnalyzeArgs) -> AnalysisRequest {
    let mut request = AnalysisRequest::new(Category::from_type(args.category.as_deref()));
    if let Some(ref query) = args.query {
        request = request.with_query(query.clone());
    }
    if let Some(ref prompt) = args.prompt {
        request = request.with_custom_instruction(prompt.clone());
    }
    request
}

fn load_config(args: &AnalyzeArgs) -> Result<GatewayConfig, AnalyzeCommandError> {
    let config = if args.config.exists() {
        GatewayConfig::load(Some(&args.config))
            .map_err(|e| AnalyzeCommandError::Setup(e.to_string()))?
    } else {
        GatewayConfig::default()
    };
    let config = config.with_env_overrides();
    config
        .validate()
        .map_err(|e| AnalyzeCommandError::Setup(e.to_string()))?;
    Ok(config)
}

/// Handle `kabu-gateway analyze`; returns the rendered response body.
pub async fn run_analyze(args: &AnalyzeArgs) -> Result<String, AnalyzeCommandError> {
    let config = load_config(args)?;
    // Logs go to stderr; a second init (e.g. in tests) is harmless.
    let _ = crate::logging::init_tracing(&config.logging);

    let gateway = AnalysisGateway::from_config(&config)
        .map_err(|e| AnalyzeCommandError::Setup(e.to_string()))?;
    let request = build_request(args);
    tracing::info!(category = %request.category, model = %gateway.model(), "Running analysis");

    let body = gateway
        .analyze(&request)
        .await
        .map_err(|e| AnalyzeCommandError::Failed(e.report()))?
        .into_body();

    let rendered = if args.raw {
        serde_json::to_string(&body)
    } else {
        serde_json::to_string_pretty(&body)
    };
    rendered.map_err(|e| AnalyzeCommandError::Setup(e.to_string()))
}
