//! Error responses.

use crate::analysis::FailureReport;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

impl IntoResponse for FailureReport {
    fn into_response(self) -> Response {
        // Upstream statuses are echoed; anything axum cannot represent
        // becomes a plain bad gateway.
        let status = StatusCode::from_u16(self.http_status).unwrap_or(StatusCode::BAD_GATEWAY);
        (status, Json(self)).into_response()
    }
}
