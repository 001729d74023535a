//! Cross-cutting request middleware.
//!
//! # Order (outer to inner)
//! ```text
//! recovery → request ID → health → logging → metrics → CORS → render → routes
//! ```

pub mod capture;
pub mod cors;
pub mod health;
pub mod logging;
pub mod metrics;
pub mod recovery;
pub mod render;

pub use capture::ResponseCapture;
pub use render::render_json;
