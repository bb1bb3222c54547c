//! Serve command implementation

use crate::api::{create_router, AppState};
use crate::cli::ServeArgs;
use crate::config::GatewayConfig;
use crate::gateway::AnalysisGateway;
use crate::logging::init_tracing;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Load configuration with CLI overrides
pub fn load_config_with_overrides(
    args: &ServeArgs,
) -> Result<GatewayConfig, Box<dyn std::error::Error>> {
    // Load from file if it exists, otherwise use defaults
    let mut config = if args.config.exists() {
        GatewayConfig::load(Some(&args.config))?
    } else {
        tracing::debug!("Config file not found, using defaults");
        GatewayConfig::default()
    };

    config = config.with_env_overrides();

    // CLI overrides (highest priority)
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(ref host) = args.host {
        config.server.host = host.clone();
    }
    if let Some(ref log_level) = args.log_level {
        config.logging.level = log_level.clone();
    }

    Ok(config)
}

/// Build API router with all endpoints
fn build_api_router(
    config: Arc<GatewayConfig>,
    gateway: Arc<AnalysisGateway>,
) -> (axum::Router, Arc<AppState>) {
    let app_state = Arc::new(AppState::new(config, gateway));
    let router = create_router(Arc::clone(&app_state));
    (router, app_state)
}

/// Wait for shutdown signal (SIGINT or SIGTERM)
async fn shutdown_signal(cancel_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install CTRL+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
        _ = cancel_token.cancelled() => {}
    }

    cancel_token.cancel();
}

/// Main serve command handler
pub async fn run_serve(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config_with_overrides(&args)?;
    config.validate()?;

    init_tracing(&config.logging)?;

    tracing::info!("Starting kabu gateway");
    tracing::debug!(?config, "Loaded configuration");
    if config.retry_budget_exceeds_timeout() {
        tracing::warn!(
            request_timeout_seconds = config.server.request_timeout_seconds,
            worst_case_seconds = config.worst_case_request_duration().as_secs(),
            "Retry budget can outlast the request timeout; slow requests will end with 504"
        );
    }

    let gateway = Arc::new(AnalysisGateway::from_config(&config)?);
    if !gateway.credential_configured() {
        tracing::warn!(
            env = %config.upstream.api_key_env,
            "Upstream credential is not set; analysis requests will fail with 500"
        );
    }

    let config_arc = Arc::new(config.clone());
    let (app, app_state) = build_api_router(config_arc, gateway);

    let cancel_token = CancellationToken::new();
    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!(
        addr = %addr,
        model = %app_state.gateway.model(),
        "Kabu gateway listening"
    );

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel_token.clone()))
        .await?;

    tracing::info!(
        uptime_seconds = app_state.metrics_collector.uptime_seconds(),
        "Kabu gateway stopped"
    );
    Ok(())
}
