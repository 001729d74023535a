//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (listeners, graceful shutdown)
//!     → router.rs (middleware chain + route table)
//!     → middleware/ (recovery, request ID, health, logging, metrics, CORS, render)
//!     → handler mutates its Reply (response.rs)
//!     → middleware/render.rs serializes the envelope
//!     → Send to client
//! ```

pub mod middleware;
pub mod request;
pub mod response;
pub mod router;
pub mod server;

pub use request::{RequestIdExt, ERR_PARSING_REQUEST_BODY, X_REQUEST_ID};
pub use response::{MissingReply, Reply, ResponseContext};
pub use router::{assemble, RouterOptions};
pub use server::{Server, ServerError};
