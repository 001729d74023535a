//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request middleware produces:
//!     → logging.rs (one structured event per completed request)
//!     → metrics.rs (counter + duration histogram)
//!
//! Consumers:
//!     → stdout (pretty in dev, JSON in prod)
//!     → metrics listener (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows from the request-ID layer into every log record
//! - Observability never alters response content
//! - Health checks are not recorded

pub mod logging;
pub mod metrics;

pub use self::metrics::{Metrics, MetricsError};
