//! Read-back of what a response will put on the wire.

use axum::http::StatusCode;
use axum::response::Response;
use hyper::body::Body as _;

/// Status and body size of a finished response, as seen by observability layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseCapture {
    pub status: StatusCode,
    pub bytes: u64,
}

impl ResponseCapture {
    /// Inspect a response without touching its content.
    ///
    /// Rendered responses are fully buffered, so the body's size hint is exact.
    /// For a streaming body the lower bound is reported.
    pub fn of(response: &Response) -> Self {
        let hint = response.body().size_hint();
        Self {
            status: response.status(),
            bytes: hint.exact().unwrap_or_else(|| hint.lower()),
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;

    use super::*;

    #[test]
    fn test_capture_buffered_body() {
        let response = Response::new(Body::from("hello"));
        let capture = ResponseCapture::of(&response);
        assert_eq!(capture.status, StatusCode::OK);
        assert_eq!(capture.bytes, 5);
    }

    #[test]
    fn test_capture_empty_body() {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        assert_eq!(
            ResponseCapture::of(&response),
            ResponseCapture {
                status: StatusCode::NO_CONTENT,
                bytes: 0
            }
        );
    }
}
