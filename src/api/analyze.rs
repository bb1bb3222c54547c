//! Analysis endpoint handler.

use crate::analysis::{AnalysisError, AnalysisRequest, FailureReport};
use crate::api::AppState;
use crate::logging::{generate_request_id, REQUEST_ID_HEADER};
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn, Instrument};

/// Message for any non-POST method on the analysis route.
pub const METHOD_NOT_ALLOWED_MESSAGE: &str = "Method not allowed";

/// POST /api/analyze - Run one request through the analysis pipeline.
pub async fn handle(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let start_time = Instant::now();
    let request_id = generate_request_id();
    let span = tracing::info_span!("analyze", request_id = %request_id);

    let (category, mut response) = async {
        let request = match read_body(body, state.config.server.max_body_bytes)
            .and_then(|bytes| AnalysisRequest::from_slice(&bytes))
        {
            Ok(request) => request,
            Err(e) => {
                warn!(kind = e.kind(), error = %e, "Rejected analysis request");
                return ("invalid", e.report().into_response());
            }
        };
        let category = request.category.as_str();
        info!(category, "Analysis request");

        let seconds = state.config.server.request_timeout_seconds;
        let deadline = Duration::from_secs(seconds);
        let outcome = tokio::time::timeout(deadline, state.gateway.analyze(&request))
            .await
            .unwrap_or_else(|_| Err(AnalysisError::DeadlineExceeded { seconds }));

        match outcome {
            Ok(result) => {
                info!(
                    category,
                    kind = result.kind(),
                    latency_ms = start_time.elapsed().as_millis() as u64,
                    "Analysis complete"
                );
                (category, (StatusCode::OK, Json(result.into_body())).into_response())
            }
            Err(e) => {
                let report: FailureReport = e.report();
                warn!(
                    category,
                    kind = e.kind(),
                    status = report.http_status,
                    error = %e,
                    "Analysis failed"
                );
                (category, report.into_response())
            }
        }
    }
    .instrument(span)
    .await;

    crate::metrics::record_request(category, response.status().as_u16(), start_time.elapsed());

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }
    response
}

fn read_body(body: Result<Bytes, BytesRejection>, limit: usize) -> Result<Bytes, AnalysisError> {
    body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AnalysisError::PayloadTooLarge { limit }
        } else {
            AnalysisError::InvalidPayload(rejection.body_text())
        }
    })
}

/// Any other method on /api/analyze.
pub async fn method_not_allowed() -> Response {
    FailureReport::new(405, METHOD_NOT_ALLOWED_MESSAGE).into_response()
}
