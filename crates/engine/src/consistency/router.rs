//! Routes each record key to its consistency path

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{
    config::EngineConfig,
    consistency::strong::StrongBackend,
    dispatch::{ChangeDispatcher, ListenerRegistry, RecordAction, RecordListener},
    error::{EngineError, EngineResult},
    foundation::{
        keys,
        record::{MemberSet, OpKind, Operation, ReplicatedRecord, now_millis},
    },
    resolver::{AddWinsResolver, GrowOnlyResolver, MergeOutcome},
    store::RecordStore,
};

/// Facade over the availability-favoring and strongly-consistent paths
///
/// Ephemeral instance-list keys are conflict-resolved locally and replicated
/// by anti-entropy; every other key commits through the [`StrongBackend`].
/// The local record store doubles as the replica cache the dispatcher reads
/// at delivery time, for both paths.
///
/// [`StrongBackend`]: crate::consistency::StrongBackend
pub struct ConsistencyRouter {
    store: Arc<RecordStore>,
    registry: Arc<ListenerRegistry>,
    dispatcher: Arc<ChangeDispatcher>,
    add_wins: AddWinsResolver,
    grow_only: GrowOnlyResolver,
    strong: Arc<dyn StrongBackend>,
    cancel: CancellationToken,
}

impl ConsistencyRouter {
    /// Create a router over the given strong backend
    pub fn new(config: EngineConfig, strong: Arc<dyn StrongBackend>) -> Self {
        let store = Arc::new(RecordStore::new());
        let registry = Arc::new(ListenerRegistry::new());
        let dispatcher = Arc::new(ChangeDispatcher::new(
            registry.clone(),
            store.clone(),
            config.notify.queue_capacity,
        ));
        Self {
            store,
            registry,
            dispatcher,
            add_wins: AddWinsResolver::new(config.conflict.tolerance),
            grow_only: GrowOnlyResolver::new(config.conflict.tolerance),
            strong,
            cancel: CancellationToken::new(),
        }
    }

    /// Spawn the background dispatcher
    pub fn start(&self) {
        info!("starting consistency router");
        tokio::spawn(self.dispatcher.clone().run(self.cancel.child_token()));
    }

    /// Stop the background dispatcher
    pub fn shutdown(&self) {
        info!("shutting down consistency router");
        self.cancel.cancel();
    }

    /// Whether the strongly-consistent path can serve writes
    pub fn is_available(&self) -> bool {
        self.strong.is_ready()
    }

    /// Bind a listener to a key
    pub fn listen(&self, key: &str, listener: Arc<dyn RecordListener>) {
        self.registry.listen(key, listener);
    }

    /// Bind a wildcard listener for all service-metadata keys
    pub fn listen_meta(&self, listener: Arc<dyn RecordListener>) {
        self.registry.listen_meta(listener);
    }

    /// Remove one listener binding from a key
    pub fn unlisten(&self, key: &str, listener: &Arc<dyn RecordListener>) {
        self.registry.unlisten(key, listener);
    }

    /// Remove every binding for a key
    pub fn unlisten_all(&self, key: &str) {
        self.registry.unlisten_all(key);
    }

    /// Apply a discrete operation on the availability path
    pub async fn apply(&self, key: &str, operation: Operation) -> EngineResult<MergeOutcome> {
        if !keys::is_ephemeral_key(key) {
            return Err(EngineError::Routing {
                key: key.to_string(),
            });
        }

        // a remove against nothing has nothing to converge
        if operation.kind == OpKind::Remove && !self.store.contains(key) {
            debug!(key, "remove for absent record, ignoring");
            return Ok(MergeOutcome::Discarded);
        }

        let outcome = self
            .store
            .merge_with(key, |record| self.add_wins.merge(record, &operation))?;
        if outcome == MergeOutcome::Applied {
            self.dispatcher.notify(key, RecordAction::Change);
        }
        Ok(outcome)
    }

    /// Merge an anti-entropy snapshot on the availability path
    pub async fn merge_snapshot(&self, incoming: ReplicatedRecord) -> EngineResult<MergeOutcome> {
        let key = incoming.key().to_string();
        if !keys::is_ephemeral_key(&key) {
            return Err(EngineError::Routing { key });
        }

        let outcome = self
            .store
            .merge_with(&key, |record| self.grow_only.merge(record, &incoming))?;
        if outcome == MergeOutcome::Applied {
            self.dispatcher.notify(&key, RecordAction::Change);
        }
        Ok(outcome)
    }

    /// Routed write of a full member set
    ///
    /// Ephemeral keys become an add operation stamped now; other keys commit
    /// through the strong backend and the local replica cache is refreshed on
    /// success.
    pub async fn put(&self, key: &str, members: MemberSet) -> EngineResult<()> {
        if keys::is_ephemeral_key(key) {
            self.apply(key, Operation::add(members, now_millis())).await?;
            return Ok(());
        }

        if !self.strong.is_ready() {
            return Err(EngineError::Unavailable);
        }
        let record = ReplicatedRecord::with_members(key, members, now_millis());
        self.strong.commit(record.clone()).await?;
        self.store.put(record);
        self.dispatcher.notify(key, RecordAction::Change);
        Ok(())
    }

    /// Routed removal of a record
    pub async fn remove(&self, key: &str) -> EngineResult<()> {
        if keys::is_ephemeral_key(key) {
            if self.store.remove(key).is_none() {
                debug!(key, "remove for unknown record");
                return Ok(());
            }
        } else {
            self.strong.remove(key).await?;
            self.store.remove(key);
        }
        self.dispatcher.notify(key, RecordAction::Delete);
        Ok(())
    }

    /// Routed read of a record
    pub async fn get(&self, key: &str) -> EngineResult<Option<ReplicatedRecord>> {
        if keys::is_ephemeral_key(key) {
            Ok(self.store.get(key))
        } else {
            self.strong.get(key).await
        }
    }

    /// The local record store (replica cache for both paths)
    pub fn store(&self) -> &Arc<RecordStore> {
        &self.store
    }

    /// The dispatcher, for deterministic delivery in tests
    pub fn dispatcher(&self) -> &Arc<ChangeDispatcher> {
        &self.dispatcher
    }
}
