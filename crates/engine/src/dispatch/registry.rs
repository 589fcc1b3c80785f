//! Key-to-listener bindings

use std::sync::Arc;

use dashmap::DashMap;

use crate::foundation::keys;

use super::RecordListener;

/// Thread-safe many-to-many map of record keys to listeners
///
/// A binding on [`keys::META_KEY_PREFIX`] itself acts as the wildcard: the
/// dispatcher delivers every metadata-key event to it first, except for the
/// switch record. Bindings are removed explicitly by their owners, never by
/// scanning.
pub struct ListenerRegistry {
    bindings: DashMap<String, Vec<Arc<dyn RecordListener>>>,
}

impl ListenerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            bindings: DashMap::new(),
        }
    }

    /// Bind a listener to a key; rebinding the same listener is a no-op
    pub fn listen(&self, key: &str, listener: Arc<dyn RecordListener>) {
        let mut entry = self.bindings.entry(key.to_string()).or_default();
        if entry.iter().any(|bound| Arc::ptr_eq(bound, &listener)) {
            return;
        }
        entry.push(listener);
    }

    /// Bind a wildcard listener for all service-metadata keys
    pub fn listen_meta(&self, listener: Arc<dyn RecordListener>) {
        self.listen(keys::META_KEY_PREFIX, listener);
    }

    /// Remove one listener binding from a key
    pub fn unlisten(&self, key: &str, listener: &Arc<dyn RecordListener>) {
        if let Some(mut entry) = self.bindings.get_mut(key) {
            entry.retain(|bound| !Arc::ptr_eq(bound, listener));
            if entry.is_empty() {
                drop(entry);
                self.bindings.remove_if(key, |_, bound| bound.is_empty());
            }
        }
    }

    /// Remove every binding for a key
    pub fn unlisten_all(&self, key: &str) {
        self.bindings.remove(key);
    }

    /// Listeners currently bound to a key
    pub fn listeners_for(&self, key: &str) -> Vec<Arc<dyn RecordListener>> {
        self.bindings
            .get(key)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Whether any listener is bound to a key
    pub fn has_listeners(&self, key: &str) -> bool {
        self.bindings.get(key).is_some_and(|entry| !entry.is_empty())
    }
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
