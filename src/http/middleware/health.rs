//! Liveness check that answers before logging and metrics see the request.

use axum::{
    body::Body,
    extract::Request,
    http::{Method, StatusCode},
    middleware::Next,
    response::Response,
};

pub const HEALTH_PATH: &str = "/health";

pub async fn heartbeat(request: Request, next: Next) -> Response {
    let is_health_check = matches!(*request.method(), Method::GET | Method::HEAD)
        && request.uri().path() == HEALTH_PATH;

    if is_health_check {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::OK;
        return response;
    }

    next.run(request).await
}
