//! Client configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the registry client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Fixed delay between reconciler ticks
    pub reconcile_interval: Duration,

    /// Timeout applied to every corrective RPC
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            reconcile_interval: Duration::from_secs(3),
            request_timeout: Duration::from_secs(5),
        }
    }
}
