//! Error types for the registry engine

use thiserror::Error;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors surfaced by the registry engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// A merge input violated the resolver contract; the record was left
    /// unchanged
    #[error("invalid operation: {reason}")]
    InvalidOperation {
        /// What the resolver rejected
        reason: String,
    },

    /// The key was sent down a consistency path that does not serve it
    #[error("key {key} routed to the wrong consistency path")]
    Routing {
        /// The offending record key
        key: String,
    },

    /// The strongly-consistent backend failed a commit or read
    #[error("strong backend failure: {reason}")]
    Backend {
        /// What the backend reported
        reason: String,
    },

    /// The strongly-consistent backend is not ready to serve
    #[error("strong backend unavailable")]
    Unavailable,

    /// A change listener failed while handling a notification
    ///
    /// Isolated per listener by the dispatcher; never propagated to the
    /// merge or commit path.
    #[error("listener failed for {key}: {reason}")]
    ListenerFailed {
        /// Key the notification was for
        key: String,
        /// What the listener reported
        reason: String,
    },
}
