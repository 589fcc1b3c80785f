//! Seam to the strongly-consistent replication backend

use async_trait::async_trait;

use crate::error::EngineResult;
use crate::foundation::record::ReplicatedRecord;

/// The linearizable replication backend behind the consistency router
///
/// Leader election, log replication and persistence live behind this trait;
/// the engine only needs committed-or-not answers. A commit that returns
/// `Ok` must be durable on a quorum.
#[async_trait]
pub trait StrongBackend: Send + Sync {
    /// Commit a record, replacing any previous committed value for its key
    async fn commit(&self, record: ReplicatedRecord) -> EngineResult<()>;

    /// Read the committed record for a key
    async fn get(&self, key: &str) -> EngineResult<Option<ReplicatedRecord>>;

    /// Remove the committed record for a key
    async fn remove(&self, key: &str) -> EngineResult<()>;

    /// Whether the backend can currently serve writes
    fn is_ready(&self) -> bool;
}
