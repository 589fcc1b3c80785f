//! Engine configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Engine configuration
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Conflict-resolution configuration
    pub conflict: ConflictConfig,

    /// Change-notification configuration
    pub notify: NotifyConfig,
}

/// Conflict-resolution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictConfig {
    /// Timestamp distance below which two writes are treated as concurrent
    ///
    /// A bound on assumed clock skew across the cluster, shared by both
    /// resolvers and tuned per deployment.
    pub tolerance: Duration,
}

impl Default for ConflictConfig {
    fn default() -> Self {
        Self {
            tolerance: Duration::from_millis(50),
        }
    }
}

/// Change-notification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Capacity of the queue between the merge path and the dispatcher
    pub queue_capacity: usize,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 4096,
        }
    }
}
