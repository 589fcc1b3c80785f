//! Transport abstraction consumed by the reconciliation engine
//!
//! The actual wire protocol (framing, TLS, reconnection detection) lives in a
//! transport crate; this module only defines the seam the client needs.

use async_trait::async_trait;

use roster_types::{RegistrationPayload, ServiceKey};

use crate::error::ClientResult;

/// The corrective operations the client issues against the server
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryRequest {
    /// Register the payload's instances under a service
    Register {
        /// Service to register under
        service: ServiceKey,
        /// Instances being registered
        payload: RegistrationPayload,
    },
    /// Remove the payload's instances from a service
    Deregister {
        /// Service to deregister from
        service: ServiceKey,
        /// Instances being removed
        payload: RegistrationPayload,
    },
    /// Start watching a service's instance set
    Subscribe {
        /// Service to watch
        service: ServiceKey,
        /// Comma-separated cluster filter, empty for all clusters
        clusters: String,
    },
    /// Stop watching a service's instance set
    Unsubscribe {
        /// Service to stop watching
        service: ServiceKey,
        /// Cluster filter the subscription was made with
        clusters: String,
    },
}

/// Connection to a registry server
///
/// `is_connected` gates whether a reconcile tick runs at all; `is_enabled`
/// gates whether an individual corrective request is attempted. A transport
/// may be connected but not yet enabled (e.g. while capabilities are still
/// being negotiated).
#[async_trait]
pub trait Connection: Send + Sync {
    /// Whether the transport currently holds a live connection
    fn is_connected(&self) -> bool;

    /// Whether the transport is willing to carry requests right now
    fn is_enabled(&self) -> bool;

    /// Issue one request and wait for the server's verdict
    async fn request(&self, request: RegistryRequest) -> ClientResult<()>;
}

/// Callbacks the transport fires on connection lifecycle changes
///
/// The transport must invoke `on_disconnected` synchronously with the
/// disconnect event, before any reconnect completes, so the tracker's bulk
/// reset is in place when the next reconcile tick runs.
pub trait ConnectionEventListener: Send + Sync {
    /// A connection has been established
    fn on_connected(&self);

    /// The connection has been lost
    fn on_disconnected(&self);
}
