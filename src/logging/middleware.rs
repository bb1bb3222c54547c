//! Request ID generation

use uuid::Uuid;

/// Response header carrying the request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Generate a new request ID using UUID v4
///
/// Ties together every log line of one request, retries included.
///
/// # Examples
///
/// ```
/// use kabu::logging::generate_request_id;
///
/// let request_id = generate_request_id();
/// assert!(!request_id.is_empty());
/// ```
pub fn generate_request_id() -> String {
    Uuid::new_v4().to_string()
}
