//! Add-wins merge of discrete operations
//!
//! Used for availability-path membership sets where losing a live member is
//! worse than briefly retaining a stale one. Adds are a plain or-set union;
//! removes only apply when the operation is clearly sequential relative to
//! the record's clock. A remove within the tolerance window is
//! indistinguishable from a concurrent add it cannot see, so it is discarded.

use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::foundation::record::{OpKind, Operation, ReplicatedRecord};

use super::MergeOutcome;

/// Merges operations into records with add-wins semantics
#[derive(Debug, Clone)]
pub struct AddWinsResolver {
    tolerance_ms: u64,
}

impl AddWinsResolver {
    /// Create a resolver with the given clock-skew tolerance
    pub fn new(tolerance: std::time::Duration) -> Self {
        Self {
            tolerance_ms: tolerance.as_millis() as u64,
        }
    }

    /// Merge one operation into the record
    pub fn merge(
        &self,
        record: &mut ReplicatedRecord,
        operation: &Operation,
    ) -> EngineResult<MergeOutcome> {
        if operation.timestamp == 0 {
            return Err(EngineError::InvalidOperation {
                reason: "operation carries no timestamp".to_string(),
            });
        }

        match operation.kind {
            OpKind::Add => {
                let mut value = record.value().clone();
                value.union(&operation.members);
                let timestamp = record.timestamp().max(operation.timestamp);
                record.install(value, timestamp);
                Ok(MergeOutcome::Applied)
            }
            OpKind::Remove => {
                let diff = record.timestamp().abs_diff(operation.timestamp);
                if diff <= self.tolerance_ms {
                    debug!(
                        key = record.key(),
                        diff, "remove within tolerance window, discarding"
                    );
                    return Ok(MergeOutcome::Discarded);
                }
                let mut value = record.value().clone();
                value.remove_members(&operation.members);
                let timestamp = record.timestamp().max(operation.timestamp);
                record.install(value, timestamp);
                Ok(MergeOutcome::Applied)
            }
        }
    }
}
