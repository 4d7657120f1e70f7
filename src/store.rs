use std::collections::HashMap;

use tracing::{debug, trace};
use xxhash_rust::xxh3::Xxh3Builder;

use crate::error::{Error, Result};
use crate::options::Options;
use crate::types::{Entry, Order, ScoreRange};
use crate::zset::SortedSet;
use crate::zset::level::RandomLevel;

/// Keyed collection of sorted sets.
///
/// A set springs into existence on the first `add` for its key and lives
/// until `clear`. Removing the last member leaves an empty set behind.
///
/// Lookups on a missing key or member answer with `None`, `false`, `0` or an
/// empty list. Only the pops fail on a missing key, since they have nothing
/// to return.
///
/// Not synchronized: mutation takes `&mut self`, so callers sharing a store
/// across threads wrap it in their own lock.
pub struct Store<V> {
    sets: HashMap<String, SortedSet<V>, Xxh3Builder>,
    options: Options,
    /// Sets created so far; mixed into the seed of each new set.
    created: u64,
}

impl<V> Store<V> {
    /// Create an empty store with default options.
    pub fn new() -> Self {
        Store {
            sets: HashMap::with_hasher(Xxh3Builder::new()),
            options: Options::default(),
            created: 0,
        }
    }

    /// Create an empty store, rejecting invalid options.
    pub fn with_options(options: Options) -> Result<Self> {
        options.validate()?;
        Ok(Store {
            sets: HashMap::with_hasher(Xxh3Builder::new()),
            options,
            created: 0,
        })
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    fn new_set(&mut self) -> SortedSet<V> {
        let seed = self.options.seed.map(|seed| seed.wrapping_add(self.created));
        self.created += 1;
        SortedSet::with_levels(RandomLevel::new(
            self.options.probability,
            self.options.max_level,
            seed,
        ))
    }

    /// Add or update `member` in the set at `key`, creating the set if needed.
    ///
    /// Returns 1 if the member is new, 0 if it was updated.
    pub fn add(&mut self, key: &str, score: f64, member: &str, payload: V) -> usize {
        if let Some(set) = self.sets.get_mut(key) {
            return set.add(member, score, payload).count();
        }

        debug!(key, "creating sorted set");
        let mut set = self.new_set();
        let added = set.add(member, score, payload).count();
        self.sets.insert(key.to_owned(), set);
        added
    }

    /// Score of `member`.
    pub fn score(&self, key: &str, member: &str) -> Option<f64> {
        self.sets.get(key)?.score(member)
    }

    /// Payload stored with `member`.
    pub fn payload(&self, key: &str, member: &str) -> Option<&V> {
        self.sets.get(key)?.payload(member)
    }

    /// Number of members; 0 for a missing key.
    pub fn card(&self, key: &str) -> usize {
        self.sets.get(key).map_or(0, SortedSet::len)
    }

    /// 0-based rank, lowest score first.
    pub fn rank(&self, key: &str, member: &str) -> Option<usize> {
        self.sets.get(key)?.rank(member)
    }

    /// 0-based rank, highest score first.
    pub fn rev_rank(&self, key: &str, member: &str) -> Option<usize> {
        self.sets.get(key)?.rev_rank(member)
    }

    /// Remove `member`. False if the key or member is missing.
    pub fn remove(&mut self, key: &str, member: &str) -> bool {
        self.sets
            .get_mut(key)
            .is_some_and(|set| set.remove(member))
    }

    /// Members at positions `start..=stop`, lowest score first.
    /// Negative positions count from the end.
    pub fn range(&self, key: &str, start: i64, stop: i64) -> Vec<String> {
        self.members_by_rank(key, start, stop, Order::Ascending)
    }

    /// Like [`range`](Self::range), paired with scores.
    pub fn range_with_scores(&self, key: &str, start: i64, stop: i64) -> Vec<(String, f64)> {
        self.scored_by_rank(key, start, stop, Order::Ascending)
    }

    /// Members at positions `start..=stop`, highest score first.
    pub fn rev_range(&self, key: &str, start: i64, stop: i64) -> Vec<String> {
        self.members_by_rank(key, start, stop, Order::Descending)
    }

    /// Like [`rev_range`](Self::rev_range), paired with scores.
    pub fn rev_range_with_scores(&self, key: &str, start: i64, stop: i64) -> Vec<(String, f64)> {
        self.scored_by_rank(key, start, stop, Order::Descending)
    }

    fn members_by_rank(&self, key: &str, start: i64, stop: i64, order: Order) -> Vec<String> {
        match self.sets.get(key) {
            Some(set) => set
                .range(start, stop, order)
                .map(|(member, _)| member.to_owned())
                .collect(),
            None => Vec::new(),
        }
    }

    fn scored_by_rank(&self, key: &str, start: i64, stop: i64, order: Order) -> Vec<(String, f64)> {
        match self.sets.get(key) {
            Some(set) => set
                .range(start, stop, order)
                .map(|(member, score)| (member.to_owned(), score))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Members with scores in `range`, lowest first.
    ///
    /// Bounds outside the set's scores are clamped to its lowest and highest
    /// score rather than producing an empty result.
    pub fn range_by_score(&self, key: &str, range: ScoreRange) -> Vec<(String, f64)> {
        self.scored_by_score(key, range, Order::Ascending)
    }

    /// Members with scores in `range`, highest first.
    pub fn rev_range_by_score(&self, key: &str, range: ScoreRange) -> Vec<(String, f64)> {
        self.scored_by_score(key, range, Order::Descending)
    }

    fn scored_by_score(&self, key: &str, range: ScoreRange, order: Order) -> Vec<(String, f64)> {
        match self.sets.get(key) {
            Some(set) => set
                .range_by_score(range, order)
                .map(|(member, score)| (member.to_owned(), score))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Member and score at a 0-based rank, lowest first.
    pub fn member_at_rank(&self, key: &str, rank: usize) -> Option<(String, f64)> {
        let (member, score) = self.sets.get(key)?.member_at_rank(rank, Order::Ascending)?;
        Some((member.to_owned(), score))
    }

    /// Member and score at a 0-based rank, highest first.
    pub fn rev_member_at_rank(&self, key: &str, rank: usize) -> Option<(String, f64)> {
        let (member, score) = self.sets.get(key)?.member_at_rank(rank, Order::Descending)?;
        Some((member.to_owned(), score))
    }

    /// Remove and return the lowest element.
    ///
    /// Errors if the key does not exist; `Ok(None)` if the set is empty.
    pub fn pop_min(&mut self, key: &str) -> Result<Option<Entry<V>>> {
        self.pop(key, Order::Ascending)
    }

    /// Remove and return the highest element.
    pub fn pop_max(&mut self, key: &str) -> Result<Option<Entry<V>>> {
        self.pop(key, Order::Descending)
    }

    fn pop(&mut self, key: &str, order: Order) -> Result<Option<Entry<V>>> {
        let set = self
            .sets
            .get_mut(key)
            .ok_or_else(|| Error::KeyNotFound(key.to_owned()))?;
        let popped = set.pop(order);
        if let Some(entry) = &popped {
            trace!(key, member = %entry.member, score = entry.score, "popped element");
        }
        Ok(popped)
    }

    /// Whether a set exists at `key`, even an empty one.
    pub fn exists(&self, key: &str) -> bool {
        self.sets.contains_key(key)
    }

    /// Drop the whole set at `key`. Returns false if there was none.
    pub fn clear(&mut self, key: &str) -> bool {
        let removed = self.sets.remove(key).is_some();
        if removed {
            debug!(key, "cleared sorted set");
        }
        removed
    }

    /// All keys, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.sets.keys().map(String::as_str)
    }

    /// Read access to the set at `key`.
    pub fn get(&self, key: &str) -> Option<&SortedSet<V>> {
        self.sets.get(key)
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        for set in self.sets.values() {
            set.check_invariants();
        }
    }
}

impl<V> Default for Store<V> {
    fn default() -> Self {
        Self::new()
    }
}
