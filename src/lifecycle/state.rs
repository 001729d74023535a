//! Server lifecycle states.

use std::fmt;

/// `Created → Running → ShuttingDown → Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Configured, nothing bound yet.
    Created,
    /// Application listener accepting; signal watcher armed.
    Running,
    /// Draining work and connections.
    ShuttingDown,
    /// Terminal.
    Stopped,
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::ShuttingDown => "shutting_down",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}
