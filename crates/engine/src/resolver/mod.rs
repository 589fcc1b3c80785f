//! Conflict resolution for replicated records
//!
//! Two strategies share one clock-skew tolerance: add-wins merges discrete
//! operations into a record, grow-only merges whole snapshots during
//! anti-entropy. Both are pure over their inputs and either apply fully or
//! leave the record untouched.

pub mod add_wins;
pub mod grow_only;

pub use add_wins::AddWinsResolver;
pub use grow_only::GrowOnlyResolver;

/// What a merge did to the current record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The record's value and clock were updated
    Applied,
    /// The input lost the merge; the record is unchanged
    Discarded,
}
