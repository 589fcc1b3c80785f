//! Error types for the registry client

use std::time::Duration;

use thiserror::Error;

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors surfaced by registry-client operations
///
/// Transport failures and timeouts are never fatal: the intent stays recorded
/// and the reconciler retries on its next tick. They are surfaced only to the
/// caller of the first synchronous attempt.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The underlying transport failed mid-call
    #[error("transport failure: {reason}")]
    Transport {
        /// What the transport reported
        reason: String,
    },

    /// The request did not complete within the configured timeout
    #[error("request timed out after {duration:?}")]
    Timeout {
        /// How long the request was allowed to run
        duration: Duration,
    },

    /// The server refused the request
    #[error("server rejected request: {reason}")]
    Rejected {
        /// Rejection detail from the server
        reason: String,
    },

    /// The client has been shut down
    #[error("client is shut down")]
    Shutdown,
}
