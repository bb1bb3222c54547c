//! # HTTP API
//!
//! Thin axum surface over [`AnalysisGateway`].
//!
//! ## Endpoints
//!
//! - `POST /api/analyze` - Run one analysis request
//! - `GET /health` - Liveness plus upstream configuration summary
//! - `GET /metrics` - Prometheus metrics
//!
//! Any other method on `/api/analyze` answers 405 with
//! `{"error": "Method not allowed"}`. Bodies over `server.max_body_bytes`
//! answer 413 and requests still running after
//! `server.request_timeout_seconds` answer 504, both in the same shape.
//!
//! ## Example
//!
//! ```no_run
//! use kabu::api::{create_router, AppState};
//! use kabu::config::GatewayConfig;
//! use kabu::gateway::AnalysisGateway;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Arc::new(GatewayConfig::default());
//! let gateway = Arc::new(AnalysisGateway::from_config(&config)?);
//! let state = Arc::new(AppState::new(config, gateway));
//!
//! let app = create_router(state);
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Every failure body has the same shape:
//! ```json
//! { "error": "<message>" }
//! ```

mod analyze;
mod error;
mod health;
pub mod types;

pub use types::*;

use crate::analysis::error::INTERNAL_ERROR_MESSAGE;
use crate::config::GatewayConfig;
use crate::gateway::AnalysisGateway;
use crate::metrics::MetricsCollector;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::any::Any;
use std::sync::Arc;
use std::time::Instant;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, Any as AnyOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state accessible to all handlers.
pub struct AppState {
    pub gateway: Arc<AnalysisGateway>,
    pub config: Arc<GatewayConfig>,
    /// Server startup time for uptime tracking
    pub start_time: Instant,
    /// Metrics collector for observability
    pub metrics_collector: Arc<MetricsCollector>,
}

impl AppState {
    pub fn new(config: Arc<GatewayConfig>, gateway: Arc<AnalysisGateway>) -> Self {
        let start_time = Instant::now();
        let metrics_collector = Arc::new(MetricsCollector::install(start_time));

        Self {
            gateway,
            config,
            start_time,
            metrics_collector,
        }
    }
}

/// Create the main API router with all endpoints configured.
pub fn create_router(state: Arc<AppState>) -> Router {
    let server = &state.config.server;
    let body_limit = server.max_body_bytes;
    let cors = cors_layer(&server.cors_allowed_origins);

    Router::new()
        .route(
            "/api/analyze",
            post(analyze::handle).fallback(analyze::method_not_allowed),
        )
        .route("/health", get(health::handle))
        .route("/metrics", get(crate::metrics::handler::metrics_handler))
        // Enforced by the body extractor so the handler can answer 413 as JSON.
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Empty origin list (or `"*"`) allows any origin; otherwise only the
/// listed ones.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() || origins.iter().any(|o| o.trim() == "*") {
        AllowOrigin::from(AnyOrigin)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_origin(allow_origin)
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!(error = %detail, "Handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": INTERNAL_ERROR_MESSAGE })),
    )
        .into_response()
}
