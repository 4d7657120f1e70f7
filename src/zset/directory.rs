use std::collections::HashMap;

use xxhash_rust::xxh3::Xxh3Builder;

use super::skiplist::NodeId;

/// Member name → node handle in the owning set's skip list.
///
/// Handles are non-owning. The set updates this map in the same call as
/// every skip list insert or delete, so no entry ever names a freed slot.
#[derive(Debug)]
pub struct MemberDirectory {
    entries: HashMap<String, NodeId, Xxh3Builder>,
}

impl MemberDirectory {
    pub fn new() -> Self {
        MemberDirectory {
            entries: HashMap::with_hasher(Xxh3Builder::new()),
        }
    }

    pub fn get(&self, member: &str) -> Option<NodeId> {
        self.entries.get(member).copied()
    }

    pub fn contains(&self, member: &str) -> bool {
        self.entries.contains_key(member)
    }

    /// Record a new member.
    pub fn insert(&mut self, member: String, id: NodeId) {
        self.entries.insert(member, id);
    }

    /// Point an existing member at a new node. Returns false if the member
    /// is unknown.
    pub fn relink(&mut self, member: &str, id: NodeId) -> bool {
        match self.entries.get_mut(member) {
            Some(slot) => {
                *slot = id;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, member: &str) -> Option<NodeId> {
        self.entries.remove(member)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.entries.iter().map(|(m, id)| (m.as_str(), *id))
    }
}

impl Default for MemberDirectory {
    fn default() -> Self {
        Self::new()
    }
}
