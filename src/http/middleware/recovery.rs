//! Panic recovery.

use std::any::Any;

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::Response,
};

use crate::http::response::APPLICATION_JSON;

/// Tracing target for panic recovery.
const TRACING_TARGET_PANIC: &str = "rest_service::recovery::panic";

const PANIC_BODY: &str = r#"{"errors":["Internal Server Error"]}"#;

/// Turns a handler panic into a 500 envelope. Used with `CatchPanicLayer::custom`.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    if let Some(message) = err.downcast_ref::<String>() {
        tracing::error!(target: TRACING_TARGET_PANIC, "service panic: {}", message);
    } else if let Some(message) = err.downcast_ref::<&str>() {
        tracing::error!(target: TRACING_TARGET_PANIC, "service panic: {}", message);
    } else {
        tracing::error!(target: TRACING_TARGET_PANIC, "service panic: unknown panic type");
    }

    let mut response = Response::new(Body::from(PANIC_BODY));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response.headers_mut().insert(header::CONTENT_TYPE, APPLICATION_JSON);
    response
}
