//! Request identification.
//!
//! # Responsibilities
//! - Assign a unique `x-request-id` (UUID v4) as early as possible
//! - Keep an id supplied by the client
//! - Echo the id on the response for correlation

use axum::http::{HeaderName, Request};
use tower_http::request_id::{
    MakeRequestUuid, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Error reported for a request body that is not the expected JSON.
pub const ERR_PARSING_REQUEST_BODY: &str = "Error parsing request body";

/// Layer that assigns a request id when the client did not send one.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid)
}

/// Layer that copies the request id onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(X_REQUEST_ID)
}

/// Access to the id assigned by [`set_request_id_layer`].
pub trait RequestIdExt {
    fn request_id(&self) -> Option<&str>;
}

impl<B> RequestIdExt for Request<B> {
    fn request_id(&self) -> Option<&str> {
        self.extensions()
            .get::<RequestId>()
            .and_then(|id| id.header_value().to_str().ok())
            .or_else(|| self.headers().get(X_REQUEST_ID).and_then(|v| v.to_str().ok()))
    }
}

impl RequestIdExt for axum::http::request::Parts {
    fn request_id(&self) -> Option<&str> {
        self.extensions
            .get::<RequestId>()
            .and_then(|id| id.header_value().to_str().ok())
            .or_else(|| self.headers.get(X_REQUEST_ID).and_then(|v| v.to_str().ok()))
    }
}
