//! Consistency routing
//!
//! Each record key is served by exactly one path: ephemeral instance lists
//! converge through conflict resolution on the availability-favoring path,
//! everything else commits through the strongly-consistent backend. Both
//! paths republish value changes to listener dispatch after the write lands.

pub mod memory;
pub mod router;
pub mod strong;

pub use memory::MemoryStrongBackend;
pub use router::ConsistencyRouter;
pub use strong::StrongBackend;
