//! Queued delivery of record events to listeners

use std::sync::Arc;

use dashmap::DashSet;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::foundation::keys;
use crate::store::RecordStore;

use super::{RecordAction, RecordListener, registry::ListenerRegistry};

/// One queued notification
#[derive(Debug, Clone)]
struct RecordEvent {
    key: String,
    action: RecordAction,
}

/// Delivers change/delete events to bound listeners off the merge path
///
/// The merge/commit path only enqueues; a single dispatcher task drains the
/// queue and invokes listeners, reading the record at delivery time. Change
/// events deduplicate per key while queued, so a hot record costs one
/// delivery per drain rather than one per write.
pub struct ChangeDispatcher {
    registry: Arc<ListenerRegistry>,
    store: Arc<RecordStore>,
    tx: mpsc::Sender<RecordEvent>,
    rx: Mutex<Option<mpsc::Receiver<RecordEvent>>>,
    pending_changes: DashSet<String>,
}

impl ChangeDispatcher {
    /// Create a dispatcher over the given registry and store
    pub fn new(
        registry: Arc<ListenerRegistry>,
        store: Arc<RecordStore>,
        queue_capacity: usize,
    ) -> Self {
        let (tx, rx) = mpsc::channel(queue_capacity);
        Self {
            registry,
            store,
            tx,
            rx: Mutex::new(Some(rx)),
            pending_changes: DashSet::new(),
        }
    }

    /// Enqueue a notification for a key
    ///
    /// Never blocks the caller: a full queue drops the event with a warning.
    pub fn notify(&self, key: &str, action: RecordAction) {
        if action == RecordAction::Change && !self.pending_changes.insert(key.to_string()) {
            // a change for this key is already queued
            return;
        }

        let event = RecordEvent {
            key: key.to_string(),
            action,
        };
        if self.tx.try_send(event).is_err() {
            if action == RecordAction::Change {
                self.pending_changes.remove(key);
            }
            warn!(key, ?action, "notification queue full, dropping event");
        }
    }

    /// Number of change events queued and not yet delivered
    pub fn pending_changes(&self) -> usize {
        self.pending_changes.len()
    }

    /// Drain the queue until cancelled
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        let Some(mut rx) = self.rx.lock().take() else {
            error!("dispatcher started twice");
            return;
        };

        info!("change dispatcher started");
        loop {
            tokio::select! {
                event = rx.recv() => match event {
                    Some(event) => self.deliver(event).await,
                    None => break,
                },
                _ = cancel.cancelled() => {
                    info!("change dispatcher stopped");
                    break;
                }
            }
        }
    }

    /// Deliver one event to every interested listener
    ///
    /// Exposed for deterministic tests; production delivery goes through
    /// [`ChangeDispatcher::run`].
    pub async fn deliver_to_listeners(&self, key: &str, action: RecordAction) {
        self.deliver(RecordEvent {
            key: key.to_string(),
            action,
        })
        .await;
    }

    async fn deliver(&self, event: RecordEvent) {
        let RecordEvent { key, action } = event;
        if action == RecordAction::Change {
            self.pending_changes.remove(&key);
        }

        let record = match action {
            RecordAction::Change => match self.store.get(&key) {
                Some(record) => Some(record),
                None => {
                    debug!(key, "record gone before delivery, skipping");
                    return;
                }
            },
            RecordAction::Delete => None,
        };

        // wildcard listeners first, then exact-key bindings
        let mut targets: Vec<Arc<dyn RecordListener>> = Vec::new();
        if keys::is_meta_key(&key) && !keys::is_switch_key(&key) {
            targets.extend(self.registry.listeners_for(keys::META_KEY_PREFIX));
        }
        targets.extend(self.registry.listeners_for(&key));

        let mut delivered = 0usize;
        for listener in targets {
            let result = match (&action, &record) {
                (RecordAction::Change, Some(record)) => listener.on_change(&key, record).await,
                _ => listener.on_delete(&key).await,
            };
            match result {
                Ok(()) => delivered += 1,
                Err(e) => error!(key, ?action, "listener failed: {e}"),
            }
        }
        debug!(key, ?action, delivered, "record event dispatched");
    }
}
