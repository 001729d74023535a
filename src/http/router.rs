//! Router assembly.
//!
//! Wraps a route table in the standard middleware chain and installs the
//! built-in not-found and method-not-allowed handlers.
//!
//! ```text
//! request ID → recovery → health → logging → metrics → CORS → render → routes
//! ```
//!
//! The request-ID layers only assign and copy a header, so they wrap panic
//! recovery and the 500 it produces still carries `x-request-id`.

use axum::{
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    Extension, Router,
};
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;

use crate::config::CorsConfig;
use crate::http::middleware::{cors, health, logging, metrics, recovery, render};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::http::response::Reply;
use crate::lifecycle::Drain;
use crate::observability::Metrics;

/// Everything the middleware chain needs besides the routes.
#[derive(Debug, Clone)]
pub struct RouterOptions {
    pub recorder: Metrics,
    pub cors: CorsConfig,
    pub drain: Drain,
}

/// Wrap `routes` with the fallbacks and the full middleware chain.
pub fn assemble(routes: Router, options: RouterOptions) -> Router {
    let RouterOptions {
        recorder,
        cors,
        drain,
    } = options;

    routes
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(Extension(drain))
        .layer(
            ServiceBuilder::new()
                .layer(set_request_id_layer())
                .layer(propagate_request_id_layer())
                .layer(CatchPanicLayer::custom(recovery::panic_response))
                .layer(from_fn(health::heartbeat))
                .layer(from_fn(logging::log_request))
                .layer(from_fn_with_state(recorder, metrics::record_metrics))
                .option_layer(cors::create_cors_layer(&cors))
                .layer(from_fn(render::render_json)),
        )
}

async fn not_found(reply: Reply) {
    reply.fail(StatusCode::NOT_FOUND, "Not Found");
}

async fn method_not_allowed(reply: Reply) {
    reply.fail(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
}
