//! In-memory strong backend for tests and single-node runs

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::{EngineError, EngineResult};
use crate::foundation::record::ReplicatedRecord;

use super::strong::StrongBackend;

/// Strong backend backed by a local map
///
/// Commits are trivially "durable"; readiness can be toggled to exercise
/// unavailability handling.
pub struct MemoryStrongBackend {
    records: DashMap<String, ReplicatedRecord>,
    ready: AtomicBool,
}

impl MemoryStrongBackend {
    /// Create a ready backend
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            ready: AtomicBool::new(true),
        }
    }

    /// Toggle readiness
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Number of committed records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing has been committed
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl StrongBackend for MemoryStrongBackend {
    async fn commit(&self, record: ReplicatedRecord) -> EngineResult<()> {
        if !self.is_ready() {
            return Err(EngineError::Unavailable);
        }
        self.records.insert(record.key().to_string(), record);
        Ok(())
    }

    async fn get(&self, key: &str) -> EngineResult<Option<ReplicatedRecord>> {
        Ok(self.records.get(key).map(|entry| entry.value().clone()))
    }

    async fn remove(&self, key: &str) -> EngineResult<()> {
        if !self.is_ready() {
            return Err(EngineError::Unavailable);
        }
        self.records.remove(key);
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}

impl Default for MemoryStrongBackend {
    fn default() -> Self {
        Self::new()
    }
}
