//! Grow-only merge of whole snapshots
//!
//! Used when anti-entropy sync hands a replica a full snapshot of a record.
//! Snapshots far enough apart in time are trusted as ordered: the later one
//! wins wholesale. Snapshots within the tolerance window are concurrent and
//! never shadow each other; their member sets are unioned.

use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::foundation::record::ReplicatedRecord;

use super::MergeOutcome;

/// Merges record snapshots with grow-only semantics
#[derive(Debug, Clone)]
pub struct GrowOnlyResolver {
    tolerance_ms: u64,
}

impl GrowOnlyResolver {
    /// Create a resolver with the given clock-skew tolerance
    pub fn new(tolerance: std::time::Duration) -> Self {
        Self {
            tolerance_ms: tolerance.as_millis() as u64,
        }
    }

    /// Merge an incoming snapshot into the current record
    pub fn merge(
        &self,
        current: &mut ReplicatedRecord,
        incoming: &ReplicatedRecord,
    ) -> EngineResult<MergeOutcome> {
        if incoming.timestamp() == 0 {
            return Err(EngineError::InvalidOperation {
                reason: "snapshot carries no timestamp".to_string(),
            });
        }

        let diff = current.timestamp().abs_diff(incoming.timestamp());
        if diff > self.tolerance_ms {
            // causally ordered: the later snapshot supersedes the earlier
            if incoming.timestamp() > current.timestamp() {
                current.install(incoming.value().clone(), incoming.timestamp());
                Ok(MergeOutcome::Applied)
            } else {
                debug!(key = current.key(), "stale snapshot discarded");
                Ok(MergeOutcome::Discarded)
            }
        } else {
            let mut value = current.value().clone();
            value.union(incoming.value());
            let timestamp = current.timestamp().max(incoming.timestamp());
            current.install(value, timestamp);
            Ok(MergeOutcome::Applied)
        }
    }
}
