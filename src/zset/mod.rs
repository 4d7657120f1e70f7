pub mod directory;
pub mod level;
mod range;
pub mod skiplist;

use directory::MemberDirectory;
use level::{LevelGenerator, RandomLevel};
use skiplist::{SkipList, SkipListIterator};

use crate::types::{AddOutcome, Entry, Order, ScoreRange, canonical_score, same_score};

/// One key's ranked collection: unique members ordered by score.
///
/// Wraps a [`SkipList`] for ordering and a [`MemberDirectory`] for O(1)
/// member lookup. The directory decides whether an `add` inserts, moves, or
/// only replaces a payload; the skip list never sees duplicate members.
///
/// Ranks at this level are 0-based.
pub struct SortedSet<V, G = RandomLevel> {
    index: SkipList<V, G>,
    members: MemberDirectory,
}

impl<V> SortedSet<V> {
    /// Create an empty set with entropy-seeded level generation.
    pub fn new() -> Self {
        Self::with_levels(RandomLevel::default())
    }
}

impl<V, G: LevelGenerator> SortedSet<V, G> {
    /// Create an empty set drawing node heights from `levels`.
    pub fn with_levels(levels: G) -> Self {
        SortedSet {
            index: SkipList::with_generator(levels),
            members: MemberDirectory::new(),
        }
    }

    /// Insert `member`, or update its score and payload if present.
    ///
    /// Same score: the payload is replaced in place and the order is
    /// untouched. Different score: the element is deleted and re-inserted
    /// at its new position. `-0.0` and `0.0` are the same score.
    pub fn add(&mut self, member: &str, score: f64, payload: V) -> AddOutcome {
        let score = canonical_score(score);
        let Some(id) = self.members.get(member) else {
            let id = self.index.insert(score, member.to_owned(), payload);
            self.members.insert(member.to_owned(), id);
            return AddOutcome::Inserted;
        };

        let old_score = self.index.score(id);
        if same_score(old_score, score) {
            if let Some(slot) = self.index.payload_mut(id) {
                *slot = payload;
            }
        } else {
            let removed = self.index.delete(old_score, member);
            debug_assert!(removed.is_some(), "directory names {member:?} but the index lacks it");
            let name = match removed {
                Some(old) => old.member,
                None => member.to_owned(),
            };
            let id = self.index.insert(score, name, payload);
            let relinked = self.members.relink(member, id);
            debug_assert!(relinked, "directory lost {member:?} during a score move");
        }
        AddOutcome::Updated
    }

    /// Remove `member`. Returns false if it was not present.
    pub fn remove(&mut self, member: &str) -> bool {
        self.take(member).is_some()
    }

    /// Remove `member` and hand back its element.
    pub fn take(&mut self, member: &str) -> Option<Entry<V>> {
        let id = self.members.remove(member)?;
        let score = self.index.score(id);
        self.index.delete(score, member)
    }

    /// Score of `member`, O(1).
    pub fn score(&self, member: &str) -> Option<f64> {
        self.members.get(member).map(|id| self.index.score(id))
    }

    pub fn payload(&self, member: &str) -> Option<&V> {
        let id = self.members.get(member)?;
        self.index.payload(id)
    }

    pub fn payload_mut(&mut self, member: &str) -> Option<&mut V> {
        let id = self.members.get(member)?;
        self.index.payload_mut(id)
    }

    pub fn contains(&self, member: &str) -> bool {
        self.members.contains(member)
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// 0-based position of `member`, lowest score first.
    pub fn rank(&self, member: &str) -> Option<usize> {
        let id = self.members.get(member)?;
        self.index
            .rank(self.index.score(id), member)
            .map(|rank| rank - 1)
    }

    /// 0-based position of `member`, highest score first.
    pub fn rev_rank(&self, member: &str) -> Option<usize> {
        let id = self.members.get(member)?;
        self.index
            .rank(self.index.score(id), member)
            .map(|rank| self.index.len() - rank)
    }

    /// Element at a 0-based position counted in `order`.
    pub fn member_at_rank(&self, rank: usize, order: Order) -> Option<(&str, f64)> {
        let target = match order {
            Order::Ascending => rank.checked_add(1)?,
            Order::Descending => self.index.len().checked_sub(rank)?,
        };
        let id = self.index.node_at_rank(target)?;
        Some((self.index.member(id), self.index.score(id)))
    }

    /// Elements between positions `start` and `stop` (inclusive, negative
    /// counts from the end) in `order`.
    pub fn range(&self, start: i64, stop: i64, order: Order) -> SkipListIterator<'_, V, G> {
        self.index.range_by_rank(start, stop, order)
    }

    /// Elements whose score falls in `range`, clamped to the scores present.
    pub fn range_by_score(
        &self,
        range: ScoreRange,
        order: Order,
    ) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.index.range_by_score(range, order)
    }

    /// Remove the lowest (`Ascending`) or highest (`Descending`) element.
    pub fn pop(&mut self, order: Order) -> Option<Entry<V>> {
        let id = match order {
            Order::Ascending => self.index.first(),
            Order::Descending => self.index.last(),
        }?;
        let member = self.index.member(id).to_owned();
        self.take(&member)
    }

    pub fn pop_min(&mut self) -> Option<Entry<V>> {
        self.pop(Order::Ascending)
    }

    pub fn pop_max(&mut self) -> Option<Entry<V>> {
        self.pop(Order::Descending)
    }

    /// All elements as `(member, score)`, lowest first.
    pub fn iter(&self) -> SkipListIterator<'_, V, G> {
        self.index.iter()
    }

    #[cfg(test)]
    pub(crate) fn index(&self) -> &SkipList<V, G> {
        &self.index
    }

    /// Check the skip list and the directory against each other.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        self.index.check_invariants();
        assert_eq!(self.members.len(), self.index.len(), "directory size != index size");
        for (member, id) in self.members.iter() {
            assert_eq!(self.index.member(id), member, "directory points at wrong node");
            assert!(self.index.payload(id).is_some(), "directory points at freed node");
        }
    }
}

impl<V> Default for SortedSet<V> {
    fn default() -> Self {
        Self::new()
    }
}
