//! Service identity and registration payloads

use serde::{Deserialize, Serialize};

use crate::instance::Instance;

/// Separator between the segments of a derived map key
pub const KEY_SEPARATOR: &str = "@@";

/// Identity of a service within a namespace
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceKey {
    /// Namespace the service lives in
    pub namespace: String,
    /// Group the service belongs to
    pub group: String,
    /// Service name
    pub service: String,
}

impl ServiceKey {
    /// Create a new service key
    pub fn new(
        namespace: impl Into<String>,
        group: impl Into<String>,
        service: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            group: group.into(),
            service: service.into(),
        }
    }

    /// Group-qualified service name, used as the registration map key
    pub fn grouped_name(&self) -> String {
        format!("{}{}{}", self.group, KEY_SEPARATOR, self.service)
    }

    /// Map key for a subscription with the given cluster filter
    ///
    /// An empty filter subscribes to all clusters and collapses to the
    /// grouped name.
    pub fn subscription_key(&self, clusters: &str) -> String {
        if clusters.is_empty() {
            self.grouped_name()
        } else {
            format!("{}{}{}", self.grouped_name(), KEY_SEPARATOR, clusters)
        }
    }
}

impl std::fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{}{}{}{}",
            self.namespace,
            KEY_SEPARATOR,
            self.group,
            KEY_SEPARATOR,
            self.service
        )
    }
}

/// What a registration carries: one instance or a batch
///
/// Batch registrations replace the whole instance set for the service on the
/// server side, so the two shapes share one intent entry per service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RegistrationPayload {
    /// A single instance
    Single(Instance),
    /// A batch of instances registered together
    Batch(Vec<Instance>),
}

impl RegistrationPayload {
    /// Number of instances carried by this payload
    pub fn instance_count(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Batch(instances) => instances.len(),
        }
    }

    /// Iterate the carried instances
    pub fn instances(&self) -> impl Iterator<Item = &Instance> {
        match self {
            Self::Single(instance) => std::slice::from_ref(instance).iter(),
            Self::Batch(instances) => instances.iter(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grouped_name() {
        let key = ServiceKey::new("public", "g1", "svcA");
        assert_eq!(key.grouped_name(), "g1@@svcA");
    }

    #[test]
    fn test_subscription_key() {
        let key = ServiceKey::new("public", "g1", "svcA");
        assert_eq!(key.subscription_key(""), "g1@@svcA");
        assert_eq!(key.subscription_key("c1,c2"), "g1@@svcA@@c1,c2");
    }

    #[test]
    fn test_payload_instances() {
        let single = RegistrationPayload::Single(Instance::new("10.0.0.1", 8080));
        assert_eq!(single.instance_count(), 1);

        let batch = RegistrationPayload::Batch(vec![
            Instance::new("10.0.0.1", 8080),
            Instance::new("10.0.0.2", 8080),
        ]);
        assert_eq!(batch.instance_count(), 2);
        assert_eq!(batch.instances().count(), 2);
    }
}
