//! Server-side engine for the Roster service registry
//!
//! This crate provides:
//! - Replicated records and the two conflict resolvers that keep
//!   uncoordinated writes converging without data loss of live registrations
//! - Listener dispatch for change/delete notifications
//! - The consistency router that sends each key down the
//!   availability-favoring or the strongly-consistent path

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod consistency;
pub mod dispatch;
pub mod error;
pub mod foundation;
pub mod resolver;
pub mod store;

pub use {
    config::EngineConfig,
    consistency::{ConsistencyRouter, MemoryStrongBackend, StrongBackend},
    dispatch::{ListenerRegistry, RecordAction, RecordListener},
    error::{EngineError, EngineResult},
    foundation::record::{MemberSet, OpKind, Operation, ReplicatedRecord},
    resolver::{AddWinsResolver, GrowOnlyResolver, MergeOutcome},
    store::RecordStore,
};
