//! REST service template.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ request id ▶ recovery ▶ health ▶ logging ▶ metrics ▶ cors ▶ render ▶ handler
//!                                                                                     │
//!                                                                  Reply (ResponseContext)
//!                                                                                     │
//!     Client Response ◀───────────────────────── JSON envelope {data, errors} ◀───────┘
//!
//!     Metrics listener ──▶ /metrics (Prometheus text)
//! ```
//!
//! Handlers never write responses directly. They mutate a [`http::Reply`]
//! and the rendering middleware turns the accumulated state into a single
//! JSON envelope once the handler returns.

// Core subsystems
pub mod config;
pub mod http;

// Application
pub mod app;
pub mod auth;
pub mod mail;
pub mod store;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use app::App;
pub use config::ServiceConfig;
pub use http::{Reply, Server};
pub use lifecycle::Drain;
