//! JSON rendering middleware.
//!
//! Attaches a fresh [`Reply`] to every request, runs the rest of the chain,
//! then renders the reply as the whole response. Nothing reaches the client
//! before the handler has returned.

use axum::{extract::Request, middleware::Next, response::IntoResponse, response::Response};
use axum::http::StatusCode;

use crate::http::response::{Reply, ResponseContext};

pub async fn render_json(mut request: Request, next: Next) -> Response {
    let reply = Reply::new();
    request.extensions_mut().insert(reply.clone());

    let inner = next.run(request).await;

    let mut context = reply.take();
    adopt_inner_status(&mut context, inner.status());
    context.into_response()
}

/// Carry over a status produced without going through the reply, such as an
/// extractor rejection. The inner body is discarded.
fn adopt_inner_status(context: &mut ResponseContext, status: StatusCode) {
    if context.status().is_some() || status == StatusCode::OK {
        return;
    }

    context.set_status(status);
    if (status.is_client_error() || status.is_server_error()) && context.errors().is_empty() {
        if let Some(reason) = status.canonical_reason() {
            context.add_error(reason);
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, body::to_bytes, middleware::from_fn, routing::get, Router};
    use tower::ServiceExt;

    use super::*;

    async fn call(router: Router, uri: &str) -> (StatusCode, String) {
        let response = router
            .layer(from_fn(render_json))
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_handler_payload_rendered() {
        let router = Router::new().route(
            "/",
            get(|reply: Reply| async move {
                reply.set_payload("hello world");
            }),
        );
        assert_eq!(
            call(router, "/").await,
            (StatusCode::OK, r#"{"data":"hello world"}"#.to_string())
        );
    }

    #[tokio::test]
    async fn test_direct_body_is_discarded() {
        let router = Router::new().route("/", get(|| async { "written directly" }));
        assert_eq!(call(router, "/").await, (StatusCode::OK, String::new()));
    }

    #[tokio::test]
    async fn test_inner_error_status_adopted() {
        let router = Router::new().route(
            "/",
            get(|| async { (StatusCode::UNPROCESSABLE_ENTITY, "bad") }),
        );
        assert_eq!(
            call(router, "/").await,
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                r#"{"errors":["Unprocessable Entity"]}"#.to_string()
            )
        );
    }

    #[tokio::test]
    async fn test_reply_status_beats_inner_status() {
        let router = Router::new().route(
            "/",
            get(|reply: Reply| async move {
                reply.fail(StatusCode::CONFLICT, "taken");
                StatusCode::BAD_REQUEST
            }),
        );
        assert_eq!(
            call(router, "/").await,
            (StatusCode::CONFLICT, r#"{"errors":["taken"]}"#.to_string())
        );
    }
}
