//! Tracks declared-vs-confirmed intent per registration and subscription

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

use roster_types::{RegistrationPayload, ServiceKey};

use crate::connection::ConnectionEventListener;

use super::intent::{IntentFlags, RegistrationIntent, SubscriptionIntent};

/// Single source of truth for work still owed to the server
///
/// Registrations are keyed by grouped service name, subscriptions by grouped
/// name plus cluster filter. Operations on a single key are atomic and
/// independent across keys; only the disconnect bulk-reset excludes
/// concurrent pending-scans, via the `scan_guard` (reset takes the write
/// side, scans the read side).
pub struct IntentTracker {
    registrations: DashMap<String, RegistrationIntent>,
    subscriptions: DashMap<String, SubscriptionIntent>,
    scan_guard: RwLock<()>,
    connected: AtomicBool,
}

impl IntentTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self {
            registrations: DashMap::new(),
            subscriptions: DashMap::new(),
            scan_guard: RwLock::new(()),
            connected: AtomicBool::new(false),
        }
    }

    /// Whether the transport last reported itself connected
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    // --- registrations ---

    /// Declare that the payload should be registered under `service`
    ///
    /// Re-declaring replaces the payload and re-arms the expected flag
    /// without touching the confirmed one.
    pub fn declare_register(&self, service: &ServiceKey, payload: RegistrationPayload) {
        let key = service.grouped_name();
        match self.registrations.entry(key) {
            Entry::Occupied(mut entry) => {
                let intent = entry.get_mut();
                intent.payload = payload;
                intent.flags.expected_registered = true;
                intent.flags.deregister_in_flight = false;
            }
            Entry::Vacant(entry) => {
                entry.insert(RegistrationIntent {
                    service: service.clone(),
                    payload,
                    flags: IntentFlags::fresh(),
                });
            }
        }
    }

    /// The server acknowledged the registration as present
    pub fn confirm_registered(&self, service: &ServiceKey) {
        if let Some(mut intent) = self.registrations.get_mut(&service.grouped_name()) {
            intent.flags.confirmed_registered = true;
            intent.flags.deregister_in_flight = false;
        }
    }

    /// Declare that the registration should be taken down
    pub fn declare_deregister(&self, service: &ServiceKey) {
        if let Some(mut intent) = self.registrations.get_mut(&service.grouped_name()) {
            intent.flags.expected_registered = false;
            intent.flags.deregister_in_flight = true;
        }
    }

    /// The server acknowledged the registration as gone
    ///
    /// Leaves the in-flight marker set; the reconciler's terminal branch
    /// performs the actual sweep.
    pub fn confirm_deregistered(&self, service: &ServiceKey) {
        if let Some(mut intent) = self.registrations.get_mut(&service.grouped_name()) {
            intent.flags.confirmed_registered = false;
            intent.flags.deregister_in_flight = true;
        }
    }

    /// Drop a drained registration entry
    ///
    /// Refused while the caller still wants the registration present.
    pub fn remove_registration(&self, service: &ServiceKey) {
        let key = service.grouped_name();
        self.registrations
            .remove_if(&key, |_, intent| !intent.flags.expected_registered);
    }

    /// Snapshot of one tracked registration
    pub fn registration(&self, service: &ServiceKey) -> Option<RegistrationIntent> {
        self.registrations
            .get(&service.grouped_name())
            .map(|entry| entry.value().clone())
    }

    /// Registrations the reconciler must act on
    pub fn pending_registrations(&self) -> Vec<RegistrationIntent> {
        let _scan = self.scan_guard.read();
        self.registrations
            .iter()
            .filter(|entry| entry.flags.needs_reconcile())
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Number of tracked registrations
    pub fn registration_count(&self) -> usize {
        self.registrations.len()
    }

    // --- subscriptions ---

    /// Declare interest in a service's instance set
    pub fn declare_subscribe(&self, service: &ServiceKey, clusters: &str) {
        let key = service.subscription_key(clusters);
        match self.subscriptions.entry(key) {
            Entry::Occupied(mut entry) => {
                let intent = entry.get_mut();
                intent.flags.expected_registered = true;
                intent.flags.deregister_in_flight = false;
            }
            Entry::Vacant(entry) => {
                entry.insert(SubscriptionIntent {
                    service: service.clone(),
                    clusters: clusters.to_string(),
                    flags: IntentFlags::fresh(),
                });
            }
        }
    }

    /// The server acknowledged the subscription
    pub fn confirm_subscribed(&self, service: &ServiceKey, clusters: &str) {
        if let Some(mut intent) = self.subscriptions.get_mut(&service.subscription_key(clusters)) {
            intent.flags.confirmed_registered = true;
            intent.flags.deregister_in_flight = false;
        }
    }

    /// Declare that the subscription should be dropped
    pub fn declare_unsubscribe(&self, service: &ServiceKey, clusters: &str) {
        if let Some(mut intent) = self.subscriptions.get_mut(&service.subscription_key(clusters)) {
            intent.flags.expected_registered = false;
            intent.flags.deregister_in_flight = true;
        }
    }

    /// The server acknowledged the subscription as gone
    pub fn confirm_unsubscribed(&self, service: &ServiceKey, clusters: &str) {
        if let Some(mut intent) = self.subscriptions.get_mut(&service.subscription_key(clusters)) {
            intent.flags.confirmed_registered = false;
            intent.flags.deregister_in_flight = true;
        }
    }

    /// Drop a drained subscription entry
    pub fn remove_subscription(&self, service: &ServiceKey, clusters: &str) {
        let key = service.subscription_key(clusters);
        self.subscriptions
            .remove_if(&key, |_, intent| !intent.flags.expected_registered);
    }

    /// Whether a subscription is currently confirmed by the server
    pub fn is_subscribed(&self, service: &ServiceKey, clusters: &str) -> bool {
        self.subscriptions
            .get(&service.subscription_key(clusters))
            .map(|intent| intent.flags.confirmed_registered)
            .unwrap_or(false)
    }

    /// Subscriptions the reconciler must act on
    pub fn pending_subscriptions(&self) -> Vec<SubscriptionIntent> {
        let _scan = self.scan_guard.read();
        self.subscriptions
            .iter()
            .filter(|entry| entry.flags.needs_reconcile())
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Number of tracked subscriptions
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Drop all tracked intent
    pub fn shutdown(&self) {
        info!(
            "clearing intent tracker ({} registrations, {} subscriptions)",
            self.registrations.len(),
            self.subscriptions.len()
        );
        self.registrations.clear();
        self.subscriptions.clear();
    }
}

impl ConnectionEventListener for IntentTracker {
    fn on_connected(&self) {
        self.connected.store(true, Ordering::Release);
        info!("registry connection established");
    }

    /// Force every confirmed flag back to false so reconnection triggers a
    /// full replay; declared intent is untouched. Holds the scan guard so a
    /// concurrent tick never observes a half-reset tracker.
    fn on_disconnected(&self) {
        self.connected.store(false, Ordering::Release);
        warn!("registry connection lost, marking all intent for replay");
        let _reset = self.scan_guard.write();
        for mut entry in self.registrations.iter_mut() {
            entry.flags.confirmed_registered = false;
        }
        for mut entry in self.subscriptions.iter_mut() {
            entry.flags.confirmed_registered = false;
        }
        debug!("replay marking completed");
    }
}

impl Default for IntentTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use roster_types::Instance;

    use super::*;

    fn svc(name: &str) -> ServiceKey {
        ServiceKey::new("public", "g1", name)
    }

    fn payload() -> RegistrationPayload {
        RegistrationPayload::Single(Instance::new("10.0.0.1", 8080))
    }

    #[test]
    fn test_declare_register_is_pending() {
        let tracker = IntentTracker::new();
        tracker.declare_register(&svc("a"), payload());

        let pending = tracker.pending_registrations();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].service, svc("a"));
    }

    #[test]
    fn test_confirm_settles_entry() {
        let tracker = IntentTracker::new();
        tracker.declare_register(&svc("a"), payload());
        tracker.confirm_registered(&svc("a"));

        assert!(tracker.pending_registrations().is_empty());
        assert_eq!(tracker.registration_count(), 1);
    }

    #[test]
    fn test_confirm_untracked_is_noop() {
        let tracker = IntentTracker::new();
        tracker.confirm_registered(&svc("ghost"));
        assert_eq!(tracker.registration_count(), 0);
    }

    #[test]
    fn test_redeclare_keeps_confirmed_flag() {
        let tracker = IntentTracker::new();
        tracker.declare_register(&svc("a"), payload());
        tracker.confirm_registered(&svc("a"));

        let batch = RegistrationPayload::Batch(vec![
            Instance::new("10.0.0.1", 8080),
            Instance::new("10.0.0.2", 8080),
        ]);
        tracker.declare_register(&svc("a"), batch.clone());

        let intent = tracker.registration(&svc("a")).unwrap();
        assert!(intent.flags.confirmed_registered);
        assert_eq!(intent.payload, batch);
    }

    #[test]
    fn test_remove_refused_while_expected() {
        let tracker = IntentTracker::new();
        tracker.declare_register(&svc("a"), payload());
        tracker.remove_registration(&svc("a"));
        assert_eq!(tracker.registration_count(), 1);

        tracker.declare_deregister(&svc("a"));
        tracker.remove_registration(&svc("a"));
        assert_eq!(tracker.registration_count(), 0);
    }

    #[test]
    fn test_deregister_lifecycle_flags() {
        let tracker = IntentTracker::new();
        tracker.declare_register(&svc("a"), payload());
        tracker.confirm_registered(&svc("a"));
        tracker.declare_deregister(&svc("a"));

        let flags = tracker.registration(&svc("a")).unwrap().flags;
        assert!(!flags.expected_registered);
        assert!(flags.deregister_in_flight);
        assert!(flags.confirmed_registered);

        tracker.confirm_deregistered(&svc("a"));
        let flags = tracker.registration(&svc("a")).unwrap().flags;
        assert!(!flags.confirmed_registered);
        // in-flight marker survives until the reconciler sweeps the entry
        assert!(flags.deregister_in_flight);
    }

    #[test]
    fn test_disconnect_resets_confirmed_only() {
        let tracker = IntentTracker::new();
        tracker.declare_register(&svc("a"), payload());
        tracker.confirm_registered(&svc("a"));
        tracker.declare_subscribe(&svc("b"), "");
        tracker.confirm_subscribed(&svc("b"), "");

        tracker.on_disconnected();

        let reg = tracker.registration(&svc("a")).unwrap().flags;
        assert!(reg.expected_registered);
        assert!(!reg.confirmed_registered);
        assert!(!tracker.is_subscribed(&svc("b"), ""));
        assert_eq!(tracker.pending_registrations().len(), 1);
        assert_eq!(tracker.pending_subscriptions().len(), 1);
        assert!(!tracker.is_connected());
    }

    #[test]
    fn test_subscription_lifecycle() {
        let tracker = IntentTracker::new();
        tracker.declare_subscribe(&svc("a"), "edge");
        assert!(!tracker.is_subscribed(&svc("a"), "edge"));

        tracker.confirm_subscribed(&svc("a"), "edge");
        assert!(tracker.is_subscribed(&svc("a"), "edge"));
        assert!(tracker.pending_subscriptions().is_empty());

        tracker.declare_unsubscribe(&svc("a"), "edge");
        tracker.confirm_unsubscribed(&svc("a"), "edge");
        tracker.remove_subscription(&svc("a"), "edge");
        assert_eq!(tracker.subscription_count(), 0);
    }
}
