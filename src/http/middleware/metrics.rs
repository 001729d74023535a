//! Request metrics middleware.

use std::time::Instant;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::http::middleware::capture::ResponseCapture;
use crate::observability::Metrics;

pub async fn record_metrics(State(metrics): State<Metrics>, request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    let capture = ResponseCapture::of(&response);
    metrics.record_request(capture.status, &method, &path, start.elapsed());

    response
}
