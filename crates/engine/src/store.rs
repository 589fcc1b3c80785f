//! In-memory store of replicated records

use dashmap::DashMap;

use crate::error::EngineResult;
use crate::foundation::record::ReplicatedRecord;
use crate::resolver::MergeOutcome;

/// Sharded map of record key to replicated record
///
/// Merges run inside the entry lock: two merges on the same key are
/// serialized, merges on different keys proceed in parallel.
pub struct RecordStore {
    records: DashMap<String, ReplicatedRecord>,
}

impl RecordStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    /// Snapshot of one record
    pub fn get(&self, key: &str) -> Option<ReplicatedRecord> {
        self.records.get(key).map(|entry| entry.value().clone())
    }

    /// Whether a record exists for the key
    pub fn contains(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }

    /// All record keys
    pub fn keys(&self) -> Vec<String> {
        self.records.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Install a record wholesale, replacing any previous one
    pub fn put(&self, record: ReplicatedRecord) {
        self.records.insert(record.key().to_string(), record);
    }

    /// Drop a record
    pub fn remove(&self, key: &str) -> Option<ReplicatedRecord> {
        self.records.remove(key).map(|(_, record)| record)
    }

    /// Merge into the record under the entry lock, creating it if absent
    ///
    /// The closure either applies fully or errors with the record untouched;
    /// its verdict is passed through.
    pub fn merge_with<F>(&self, key: &str, merge: F) -> EngineResult<MergeOutcome>
    where
        F: FnOnce(&mut ReplicatedRecord) -> EngineResult<MergeOutcome>,
    {
        let mut entry = self
            .records
            .entry(key.to_string())
            .or_insert_with(|| ReplicatedRecord::new(key));
        merge(entry.value_mut())
    }
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}
