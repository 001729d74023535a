//! Request logging middleware.
//!
//! Emits one structured event per completed request, after the inner
//! service has produced its response.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use axum::{extract::Request, middleware::Next, response::Response};

use crate::http::middleware::capture::ResponseCapture;
use crate::http::request::RequestIdExt;

/// Tracing target for request completion events.
pub const TRACING_TARGET_REQUEST: &str = "rest_service::request";

pub async fn log_request(request: Request, next: Next) -> Response {
    let started_at = SystemTime::now();
    let start = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().to_string();
    let request_id = request.request_id().unwrap_or("unknown").to_string();

    let response = next.run(request).await;
    let capture = ResponseCapture::of(&response);

    let time = started_at
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default();

    tracing::info!(
        target: TRACING_TARGET_REQUEST,
        time,
        method = %method,
        uri = %uri,
        status = capture.status.as_u16(),
        bytes = capture.bytes,
        duration = ?start.elapsed(),
        request_id = %request_id,
        "request completed"
    );

    response
}
