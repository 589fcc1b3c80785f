//! Service instance descriptors

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Default cluster an instance belongs to when none is given
pub const DEFAULT_CLUSTER: &str = "DEFAULT";

/// One endpoint of a service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    /// IP address the instance is reachable at
    pub ip: String,
    /// Port the instance is reachable at
    pub port: u16,
    /// Cluster the instance belongs to
    pub cluster: String,
    /// Load-balancing weight
    pub weight: f64,
    /// Whether the instance currently passes health checks
    pub healthy: bool,
    /// Whether the instance accepts traffic
    pub enabled: bool,
    /// Ephemeral instances live on the availability-favoring path and vanish
    /// with their client; persistent ones are committed to the strong store
    pub ephemeral: bool,
    /// Free-form metadata attached by the registering client
    pub metadata: HashMap<String, String>,
}

impl Instance {
    /// Create an instance with default cluster, weight and flags
    pub fn new(ip: impl Into<String>, port: u16) -> Self {
        Self {
            ip: ip.into(),
            port,
            cluster: DEFAULT_CLUSTER.to_string(),
            weight: 1.0,
            healthy: true,
            enabled: true,
            ephemeral: true,
            metadata: HashMap::new(),
        }
    }

    /// Set the cluster
    pub fn with_cluster(mut self, cluster: impl Into<String>) -> Self {
        self.cluster = cluster.into();
        self
    }

    /// Mark the instance persistent (strong-consistency path)
    pub fn persistent(mut self) -> Self {
        self.ephemeral = false;
        self
    }

    /// Identity of this instance inside a replicated member set
    pub fn member_id(&self) -> String {
        format!("{}#{}#{}", self.ip, self.port, self.cluster)
    }

    /// Socket address rendering
    pub fn address(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }
}
