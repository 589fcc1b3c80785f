//! End-to-end reconciliation scenarios against a scriptable connection

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use parking_lot::Mutex;

use roster_client::{
    ClientConfig, ClientError, ClientResult, Connection, ConnectionEventListener, IntentTracker,
    Reconciler, RegistryClient, RegistryRequest,
    reconcile::intent::IntentAction,
};
use roster_types::{Instance, RegistrationPayload, ServiceKey};

/// Connection whose health and verdicts are set by the test
struct ScriptedConnection {
    connected: AtomicBool,
    enabled: AtomicBool,
    fail_requests: AtomicBool,
    requests: Mutex<Vec<RegistryRequest>>,
}

impl ScriptedConnection {
    fn new() -> Self {
        Self {
            connected: AtomicBool::new(true),
            enabled: AtomicBool::new(true),
            fail_requests: AtomicBool::new(false),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    fn set_failing(&self, failing: bool) {
        self.fail_requests.store(failing, Ordering::SeqCst);
    }

    fn requests(&self) -> Vec<RegistryRequest> {
        self.requests.lock().clone()
    }

    fn clear_requests(&self) {
        self.requests.lock().clear();
    }
}

#[async_trait]
impl Connection for ScriptedConnection {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    async fn request(&self, request: RegistryRequest) -> ClientResult<()> {
        if self.fail_requests.load(Ordering::SeqCst) {
            return Err(ClientError::Transport {
                reason: "scripted failure".to_string(),
            });
        }
        self.requests.lock().push(request);
        Ok(())
    }
}

fn setup() -> (
    Arc<ScriptedConnection>,
    Arc<IntentTracker>,
    Reconciler<ScriptedConnection>,
) {
    let connection = Arc::new(ScriptedConnection::new());
    let tracker = Arc::new(IntentTracker::new());
    tracker.on_connected();
    let reconciler = Reconciler::new(
        tracker.clone(),
        connection.clone(),
        ClientConfig::default(),
    );
    (connection, tracker, reconciler)
}

fn svc(name: &str) -> ServiceKey {
    ServiceKey::new("public", "g1", name)
}

fn single(ip: &str) -> RegistrationPayload {
    RegistrationPayload::Single(Instance::new(ip, 8080))
}

#[tokio::test]
async fn test_register_then_deregister_walk() {
    let (connection, tracker, reconciler) = setup();
    let service = svc("svcA");

    // declared intent becomes one pending entry
    tracker.declare_register(&service, single("10.0.0.1"));
    assert_eq!(tracker.pending_registrations().len(), 1);

    // a healthy tick issues the register and settles the entry
    reconciler.tick().await;
    assert_eq!(connection.requests().len(), 1);
    assert!(matches!(
        connection.requests()[0],
        RegistryRequest::Register { .. }
    ));
    assert!(tracker.pending_registrations().is_empty());

    // deregistering makes the entry pending again
    tracker.declare_deregister(&service);
    assert_eq!(tracker.pending_registrations().len(), 1);

    connection.clear_requests();
    reconciler.tick().await;
    assert!(matches!(
        connection.requests()[0],
        RegistryRequest::Deregister { .. }
    ));

    // the entry is now terminal and the next tick sweeps it
    let flags = tracker.registration(&service).unwrap().flags;
    assert_eq!(flags.action(), IntentAction::Remove);

    reconciler.tick().await;
    assert!(tracker.registration(&service).is_none());
    assert_eq!(tracker.registration_count(), 0);
}

#[tokio::test]
async fn test_disconnected_tick_is_inert() {
    let (connection, tracker, reconciler) = setup();
    tracker.declare_register(&svc("svcA"), single("10.0.0.1"));
    connection.set_connected(false);

    let before = tracker.registration(&svc("svcA")).unwrap().flags;
    reconciler.tick().await;

    assert!(connection.requests().is_empty());
    let after = tracker.registration(&svc("svcA")).unwrap().flags;
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_disabled_connection_attempts_nothing() {
    let (connection, tracker, reconciler) = setup();
    tracker.declare_register(&svc("svcA"), single("10.0.0.1"));
    tracker.declare_subscribe(&svc("svcA"), "");
    connection.set_enabled(false);

    reconciler.tick().await;

    assert!(connection.requests().is_empty());
    assert_eq!(tracker.pending_registrations().len(), 1);
    assert_eq!(tracker.pending_subscriptions().len(), 1);
}

#[tokio::test]
async fn test_failed_request_keeps_entry_pending() {
    let (connection, tracker, reconciler) = setup();
    tracker.declare_register(&svc("svcA"), single("10.0.0.1"));
    connection.set_failing(true);

    reconciler.tick().await;
    assert_eq!(tracker.pending_registrations().len(), 1);

    // recovery: the next tick converges
    connection.set_failing(false);
    reconciler.tick().await;
    assert!(tracker.pending_registrations().is_empty());
}

#[tokio::test]
async fn test_one_entry_failure_does_not_block_others() {
    let (connection, tracker, reconciler) = setup();
    tracker.declare_register(&svc("svcA"), single("10.0.0.1"));
    tracker.declare_subscribe(&svc("svcB"), "");
    connection.set_failing(true);

    reconciler.tick().await;

    // both were attempted and both stay pending
    assert_eq!(tracker.pending_registrations().len(), 1);
    assert_eq!(tracker.pending_subscriptions().len(), 1);
}

#[tokio::test]
async fn test_disconnect_replays_exactly_once_per_entry() {
    let (connection, tracker, reconciler) = setup();
    let service = svc("svcA");
    tracker.declare_register(&service, single("10.0.0.1"));
    tracker.declare_subscribe(&service, "edge");
    reconciler.tick().await;
    assert_eq!(connection.requests().len(), 2);

    // drop and re-establish the connection
    tracker.on_disconnected();
    connection.set_connected(false);
    reconciler.tick().await;

    connection.clear_requests();
    connection.set_connected(true);
    tracker.on_connected();
    reconciler.tick().await;

    let replayed = connection.requests();
    assert_eq!(replayed.len(), 2);
    assert!(replayed
        .iter()
        .any(|r| matches!(r, RegistryRequest::Register { .. })));
    assert!(replayed
        .iter()
        .any(|r| matches!(r, RegistryRequest::Subscribe { .. })));

    // settled again: a further tick replays nothing
    connection.clear_requests();
    reconciler.tick().await;
    assert!(connection.requests().is_empty());
}

#[tokio::test]
async fn test_facade_failure_surfaces_but_keeps_intent() {
    let connection = Arc::new(ScriptedConnection::new());
    let client = RegistryClient::new(connection.clone(), ClientConfig::default());
    client.tracker().on_connected();
    let service = svc("svcA");

    connection.set_failing(true);
    let result = client.register(&service, Instance::new("10.0.0.1", 8080)).await;
    assert!(matches!(result, Err(ClientError::Transport { .. })));

    // the failed first attempt left the intent recorded for replay
    let tracker = client.tracker();
    assert_eq!(tracker.pending_registrations().len(), 1);

    connection.set_failing(false);
    let reconciler = Reconciler::new(
        tracker.clone(),
        connection.clone(),
        ClientConfig::default(),
    );
    reconciler.tick().await;
    assert!(tracker.pending_registrations().is_empty());
    assert!(client.is_registered(&service));
}

#[tracing_test::traced_test]
#[tokio::test]
async fn test_failed_reconcile_is_logged_and_swallowed() {
    let (connection, tracker, reconciler) = setup();
    tracker.declare_register(&svc("svcA"), single("10.0.0.1"));
    connection.set_failing(true);

    reconciler.tick().await;

    assert!(logs_contain("registration reconcile failed"));
    assert_eq!(tracker.pending_registrations().len(), 1);
}

#[tokio::test]
async fn test_facade_subscribe_confirms() {
    let connection = Arc::new(ScriptedConnection::new());
    let client = RegistryClient::new(connection.clone(), ClientConfig::default());
    let service = svc("svcA");

    client.subscribe(&service, "edge").await.unwrap();
    assert!(client.is_subscribed(&service, "edge"));

    client.unsubscribe(&service, "edge").await.unwrap();
    assert!(!client.is_subscribed(&service, "edge"));
}
