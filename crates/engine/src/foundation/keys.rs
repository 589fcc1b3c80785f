//! Record-key naming conventions
//!
//! A record key encodes which store serves it: instance-list keys carrying
//! the ephemeral segment live on the availability-favoring path, everything
//! else goes through the strong backend. Service-metadata keys share a
//! prefix so one wildcard listener binding can cover all of them.

/// Prefix of every instance-list record key
pub const INSTANCE_LIST_PREFIX: &str = "roster.naming.instances.";

/// Segment marking an instance list as ephemeral
pub const EPHEMERAL_SEGMENT: &str = "ephemeral.";

/// Prefix of every service-metadata record key
///
/// A listener bound to this exact prefix is the wildcard binding: it
/// receives events for every metadata key except the switch record.
pub const META_KEY_PREFIX: &str = "roster.naming.meta.";

/// Distinguished service name of the global switch record
pub const SWITCH_SERVICE: &str = "00-roster-switch-00";

/// Separator between the namespace and the service segments of a key
const NAMESPACE_SEPARATOR: &str = "##";

/// Build the instance-list key for a grouped service name
pub fn instance_list_key(namespace: &str, grouped_name: &str, ephemeral: bool) -> String {
    if ephemeral {
        format!("{INSTANCE_LIST_PREFIX}{EPHEMERAL_SEGMENT}{namespace}{NAMESPACE_SEPARATOR}{grouped_name}")
    } else {
        format!("{INSTANCE_LIST_PREFIX}{namespace}{NAMESPACE_SEPARATOR}{grouped_name}")
    }
}

/// Build the metadata key for a service
pub fn meta_key(namespace: &str, service: &str) -> String {
    format!("{META_KEY_PREFIX}{namespace}{NAMESPACE_SEPARATOR}{service}")
}

/// Build the switch record key for a namespace
pub fn switch_key(namespace: &str) -> String {
    meta_key(namespace, SWITCH_SERVICE)
}

/// Whether the key names an ephemeral instance list (availability path)
pub fn is_ephemeral_key(key: &str) -> bool {
    key.strip_prefix(INSTANCE_LIST_PREFIX)
        .is_some_and(|rest| rest.starts_with(EPHEMERAL_SEGMENT))
}

/// Whether the key names an instance list at all
pub fn is_instance_list_key(key: &str) -> bool {
    key.starts_with(INSTANCE_LIST_PREFIX)
}

/// Whether the key names a service-metadata record
pub fn is_meta_key(key: &str) -> bool {
    key.len() > META_KEY_PREFIX.len() && key.starts_with(META_KEY_PREFIX)
}

/// Whether the key is the distinguished switch record
pub fn is_switch_key(key: &str) -> bool {
    key.ends_with(SWITCH_SERVICE)
}

/// Service segment of a key, if present
pub fn service_name_of(key: &str) -> Option<&str> {
    key.split_once(NAMESPACE_SEPARATOR).map(|(_, rest)| rest)
}

/// Namespace segment of a key, if present
pub fn namespace_of(key: &str) -> Option<&str> {
    let rest = key
        .strip_prefix(META_KEY_PREFIX)
        .or_else(|| key.strip_prefix(INSTANCE_LIST_PREFIX))
        .map(|rest| rest.strip_prefix(EPHEMERAL_SEGMENT).unwrap_or(rest))?;
    rest.split_once(NAMESPACE_SEPARATOR).map(|(ns, _)| ns)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ephemeral_routing() {
        let key = instance_list_key("public", "g1@@svcA", true);
        assert!(is_ephemeral_key(&key));
        assert!(is_instance_list_key(&key));

        let key = instance_list_key("public", "g1@@svcA", false);
        assert!(!is_ephemeral_key(&key));
        assert!(is_instance_list_key(&key));
    }

    #[test]
    fn test_meta_and_switch_keys() {
        let key = meta_key("public", "svcA");
        assert!(is_meta_key(&key));
        assert!(!is_switch_key(&key));
        // the prefix itself is a binding address, not a metadata key
        assert!(!is_meta_key(META_KEY_PREFIX));

        let switch = switch_key("public");
        assert!(is_meta_key(&switch));
        assert!(is_switch_key(&switch));
    }

    #[test]
    fn test_key_segments() {
        let key = instance_list_key("public", "g1@@svcA", true);
        assert_eq!(namespace_of(&key), Some("public"));
        assert_eq!(service_name_of(&key), Some("g1@@svcA"));

        let key = meta_key("tenant-7", "svcB");
        assert_eq!(namespace_of(&key), Some("tenant-7"));
        assert_eq!(service_name_of(&key), Some("svcB"));
    }
}
