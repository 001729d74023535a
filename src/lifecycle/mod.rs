//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     Load config → Validate → Register metrics → Start listeners
//!
//! Shutdown:
//!     Signal received → Drain levers (bounded) → Stop accepting
//!         → Wait for connections (grace period) → Abandon stragglers (hard deadline)
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered shutdown: drain, stop accept, wait, exit
//! - Shutdown has timeout: forced exit after deadline

pub mod drain;
pub mod signals;
pub mod state;

pub use drain::{Drain, DrainError, Lever};
pub use state::ServerState;
