//! Replicated records and the operations that mutate them

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use roster_types::Instance;

/// Ordered set of instances keyed by member id
///
/// Iteration order is deterministic, which keeps anti-entropy payloads and
/// test assertions stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemberSet {
    members: BTreeMap<String, Instance>,
}

impl MemberSet {
    /// Create an empty member set
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one instance, replacing any previous entry with the same id
    pub fn insert(&mut self, instance: Instance) {
        self.members.insert(instance.member_id(), instance);
    }

    /// Union the other set into this one
    pub fn union(&mut self, other: &MemberSet) {
        for (id, instance) in &other.members {
            self.members.insert(id.clone(), instance.clone());
        }
    }

    /// Remove every member present in the other set, returning how many were
    pub fn remove_members(&mut self, other: &MemberSet) -> usize {
        let mut removed = 0;
        for id in other.members.keys() {
            if self.members.remove(id).is_some() {
                removed += 1;
            }
        }
        removed
    }

    /// Whether a member id is present
    pub fn contains(&self, member_id: &str) -> bool {
        self.members.contains_key(member_id)
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Iterate the members in id order
    pub fn iter(&self) -> impl Iterator<Item = &Instance> {
        self.members.values()
    }

    /// Iterate the member ids in order
    pub fn member_ids(&self) -> impl Iterator<Item = &str> {
        self.members.keys().map(String::as_str)
    }
}

impl FromIterator<Instance> for MemberSet {
    fn from_iter<I: IntoIterator<Item = Instance>>(iter: I) -> Self {
        let mut set = Self::new();
        for instance in iter {
            set.insert(instance);
        }
        set
    }
}

/// One logically-replicated key: a member set plus its merge clock
///
/// Value and timestamp only ever change together, inside a resolver merge;
/// a rejected merge leaves both untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicatedRecord {
    key: String,
    value: MemberSet,
    timestamp: u64,
}

impl ReplicatedRecord {
    /// Create an empty record for a key
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: MemberSet::new(),
            timestamp: 0,
        }
    }

    /// Create a record with an initial member set and clock
    pub fn with_members(key: impl Into<String>, value: MemberSet, timestamp: u64) -> Self {
        Self {
            key: key.into(),
            value,
            timestamp,
        }
    }

    /// The record key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The current member set
    pub fn value(&self) -> &MemberSet {
        &self.value
    }

    /// The merge clock, used only for conflict resolution
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Install a merged value and clock together
    pub(crate) fn install(&mut self, value: MemberSet, timestamp: u64) {
        self.value = value;
        self.timestamp = timestamp;
    }
}

/// Kind of a discrete replication operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpKind {
    /// Add members to the record
    Add,
    /// Remove members from the record
    Remove,
}

/// A discrete operation against one replicated record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// Whether members are being added or removed
    pub kind: OpKind,
    /// The members the operation targets
    pub members: MemberSet,
    /// Issuer's clock at operation time, in milliseconds
    pub timestamp: u64,
}

impl Operation {
    /// An add operation
    pub fn add(members: MemberSet, timestamp: u64) -> Self {
        Self {
            kind: OpKind::Add,
            members,
            timestamp,
        }
    }

    /// A remove operation
    pub fn remove(members: MemberSet, timestamp: u64) -> Self {
        Self {
            kind: OpKind::Remove,
            members,
            timestamp,
        }
    }
}

/// Current wall-clock time in milliseconds
pub fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64
}
