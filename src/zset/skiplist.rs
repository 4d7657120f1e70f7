use std::cmp::Ordering;
use std::fmt;

use tracing::trace;

use super::level::{LevelGenerator, MAX_LEVEL, RandomLevel};
use crate::types::{Entry, Order, canonical_score, compare_keys};

/// Stable handle to a node in the skip list arena.
///
/// A handle stays valid until its node is deleted. Slots of deleted nodes
/// are recycled, so a handle must not outlive the element it was issued for.
/// Handles are arena indexes at full width, so no slot can wrap onto the head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    #[inline]
    fn index(self) -> usize {
        self.0
    }
}

/// The head sentinel always occupies slot 0.
const HEAD: NodeId = NodeId(0);

/// One forward link. `span` counts how many level-0 steps the link covers.
///
/// For a link with no forward node, `span` is the number of elements after
/// its owner, so `rank(owner) + span == len` holds for every tail link.
#[derive(Debug, Clone, Copy, Default)]
struct SkipLevel {
    forward: Option<NodeId>,
    span: usize,
}

/// A single node in the skip list.
///
/// Each node has `levels.len()` forward links, fixed at creation. Level 0
/// contains all nodes (a doubly linked list via `backward`). Higher levels
/// skip over nodes and record how many they skipped.
///
/// ```text
/// Level 2:  HEAD ─────────(3)─────────► c ──────(2)──────► NIL
/// Level 1:  HEAD ──(1)──► a ────(2)───► c ──(1)──► d ─(1)► NIL
/// Level 0:  HEAD ──(1)──► a ─(1)► b ─(1)► c ─(1)► d ─(1)► e ─(0)► NIL
/// ```
struct SkipNode<V> {
    member: String,
    score: f64,
    /// `None` only for the head sentinel and for freed slots.
    payload: Option<V>,
    backward: Option<NodeId>,
    levels: Vec<SkipLevel>,
}

impl<V> SkipNode<V> {
    fn head() -> Self {
        SkipNode {
            member: String::new(),
            score: 0.0,
            payload: None,
            backward: None,
            levels: vec![SkipLevel::default(); MAX_LEVEL],
        }
    }
}

/// A ranked skip list ordered by `(score, member)`.
///
/// Nodes live in an arena and link to each other through [`NodeId`]
/// handles. Every forward link carries a span, which turns rank lookups and
/// positional access into O(log n) walks.
///
/// The list does not de-duplicate members: callers guarantee that a member
/// is absent before inserting it (see [`SortedSet`](super::SortedSet)).
pub struct SkipList<V, G = RandomLevel> {
    nodes: Vec<SkipNode<V>>,
    free: Vec<NodeId>,
    tail: Option<NodeId>,
    len: usize,
    /// Number of levels currently in use, `1..=MAX_LEVEL`.
    level: usize,
    heights: G,
}

impl<V> SkipList<V> {
    /// Create an empty list with entropy-seeded level generation.
    pub fn new() -> Self {
        Self::with_generator(RandomLevel::default())
    }
}

impl<V> Default for SkipList<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, G: LevelGenerator> SkipList<V, G> {
    /// Create an empty list drawing node heights from `heights`.
    pub fn with_generator(heights: G) -> Self {
        SkipList {
            nodes: vec![SkipNode::head()],
            free: Vec::new(),
            tail: None,
            len: 0,
            level: 1,
            heights,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of levels currently in use.
    pub fn level(&self) -> usize {
        self.level
    }

    /// Lowest element.
    pub fn first(&self) -> Option<NodeId> {
        self.forward(HEAD, 0)
    }

    /// Highest element, O(1).
    pub fn last(&self) -> Option<NodeId> {
        self.tail
    }

    pub fn member(&self, id: NodeId) -> &str {
        &self.node(id).member
    }

    pub fn score(&self, id: NodeId) -> f64 {
        self.node(id).score
    }

    pub fn payload(&self, id: NodeId) -> Option<&V> {
        self.node(id).payload.as_ref()
    }

    /// Payloads can change in place; they play no part in the order.
    pub fn payload_mut(&mut self, id: NodeId) -> Option<&mut V> {
        self.node_mut(id).payload.as_mut()
    }

    /// Level-0 successor.
    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        self.forward(id, 0)
    }

    /// Level-0 predecessor. `None` for the first element.
    pub fn prev(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).backward
    }

    /// Height of a node, fixed when it was inserted.
    pub fn height(&self, id: NodeId) -> usize {
        self.node(id).levels.len()
    }

    // --- Node access helpers ---

    #[inline]
    fn node(&self, id: NodeId) -> &SkipNode<V> {
        &self.nodes[id.index()]
    }

    #[inline]
    fn node_mut(&mut self, id: NodeId) -> &mut SkipNode<V> {
        &mut self.nodes[id.index()]
    }

    #[inline]
    pub(super) fn forward(&self, id: NodeId, level: usize) -> Option<NodeId> {
        self.node(id).levels[level].forward
    }

    #[inline]
    fn span(&self, id: NodeId, level: usize) -> usize {
        self.node(id).levels[level].span
    }

    #[inline]
    pub(super) fn head(&self) -> NodeId {
        HEAD
    }

    /// Compare the key stored at `id` against `(score, member)`.
    #[inline]
    fn cmp_key(&self, id: NodeId, score: f64, member: &str) -> Ordering {
        let node = self.node(id);
        compare_keys(node.score, &node.member, score, member)
    }

    fn alloc(&mut self, height: usize, score: f64, member: String, payload: V) -> NodeId {
        let node = SkipNode {
            member,
            score,
            payload: Some(payload),
            backward: None,
            levels: vec![SkipLevel::default(); height],
        };
        match self.free.pop() {
            Some(id) => {
                self.nodes[id.index()] = node;
                id
            }
            None => {
                let id = NodeId(self.nodes.len());
                self.nodes.push(node);
                id
            }
        }
    }

    /// Empty a slot and hand it to the free list.
    fn release(&mut self, id: NodeId) -> Option<Entry<V>> {
        let node = self.node_mut(id);
        let member = std::mem::take(&mut node.member);
        let payload = node.payload.take();
        let score = node.score;
        node.levels.clear();
        node.backward = None;
        self.free.push(id);
        payload.map(|payload| Entry {
            member,
            score,
            payload,
        })
    }

    // --- Core operations ---

    /// Insert a new element and return its handle.
    ///
    /// The member must not already be present. `-0.0` is stored as `0.0`.
    ///
    /// Algorithm:
    ///   1. Descend from the top level, recording per level the last node
    ///      before the insertion point and the rank reached there
    ///   2. Draw a height; new levels start at the head spanning the whole list
    ///   3. Splice the node in at each of its levels, splitting the
    ///      predecessor's span around it
    ///   4. Levels above its height now skip one more element
    pub fn insert(&mut self, score: f64, member: String, payload: V) -> NodeId {
        let score = canonical_score(score);
        let mut update = [HEAD; MAX_LEVEL];
        let mut rank = [0usize; MAX_LEVEL];
        let mut x = HEAD;

        for i in (0..self.level).rev() {
            rank[i] = if i + 1 == self.level { 0 } else { rank[i + 1] };
            while let Some(next) = self.forward(x, i) {
                if self.cmp_key(next, score, &member) != Ordering::Less {
                    break;
                }
                rank[i] += self.span(x, i);
                x = next;
            }
            update[i] = x;
        }
        debug_assert!(
            self.forward(x, 0)
                .is_none_or(|next| self.cmp_key(next, score, &member) != Ordering::Equal),
            "duplicate key inserted into skip list"
        );

        let height = self.heights.next_level().clamp(1, MAX_LEVEL);
        if height > self.level {
            for i in self.level..height {
                rank[i] = 0;
                update[i] = HEAD;
                self.node_mut(HEAD).levels[i].span = self.len;
            }
            trace!(from = self.level, to = height, "raised skip list level");
            self.level = height;
        }

        let id = self.alloc(height, score, member, payload);
        for i in 0..height {
            let pred = update[i];
            let covered = rank[0] - rank[i];
            let old = self.node(pred).levels[i];
            self.node_mut(id).levels[i] = SkipLevel {
                forward: old.forward,
                span: old.span - covered,
            };
            self.node_mut(pred).levels[i] = SkipLevel {
                forward: Some(id),
                span: covered + 1,
            };
        }
        for i in height..self.level {
            self.node_mut(update[i]).levels[i].span += 1;
        }

        self.node_mut(id).backward = if update[0] == HEAD { None } else { Some(update[0]) };
        match self.forward(id, 0) {
            Some(next) => self.node_mut(next).backward = Some(id),
            None => self.tail = Some(id),
        }

        self.len += 1;
        id
    }

    /// Remove the element with exactly this `(score, member)` key.
    ///
    /// Returns `None` and leaves the list untouched if no such element exists.
    pub fn delete(&mut self, score: f64, member: &str) -> Option<Entry<V>> {
        let score = canonical_score(score);
        let mut update = [HEAD; MAX_LEVEL];
        let mut x = HEAD;

        for i in (0..self.level).rev() {
            while let Some(next) = self.forward(x, i) {
                if self.cmp_key(next, score, member) != Ordering::Less {
                    break;
                }
                x = next;
            }
            update[i] = x;
        }

        let target = self.forward(x, 0)?;
        if self.cmp_key(target, score, member) != Ordering::Equal {
            return None;
        }
        self.unlink(target, &update);
        self.release(target)
    }

    /// Detach `target` given its predecessor at every active level.
    fn unlink(&mut self, target: NodeId, update: &[NodeId; MAX_LEVEL]) {
        for i in 0..self.level {
            let pred = update[i];
            if self.forward(pred, i) == Some(target) {
                let removed = self.node(target).levels[i];
                let link = &mut self.node_mut(pred).levels[i];
                link.span = link.span + removed.span - 1;
                link.forward = removed.forward;
            } else {
                self.node_mut(pred).levels[i].span -= 1;
            }
        }

        let prev = self.node(target).backward;
        match self.forward(target, 0) {
            Some(next) => self.node_mut(next).backward = prev,
            None => self.tail = prev,
        }

        let before = self.level;
        while self.level > 1 && self.forward(HEAD, self.level - 1).is_none() {
            self.level -= 1;
        }
        if self.level != before {
            trace!(from = before, to = self.level, "lowered skip list level");
        }

        self.len -= 1;
    }

    /// 1-based rank of the element with exactly this key.
    ///
    /// `None` means the key is absent; a present element never has rank 0.
    pub fn rank(&self, score: f64, member: &str) -> Option<usize> {
        let score = canonical_score(score);
        let mut rank = 0;
        let mut x = HEAD;

        for i in (0..self.level).rev() {
            while let Some(next) = self.forward(x, i) {
                if self.cmp_key(next, score, member) == Ordering::Greater {
                    break;
                }
                rank += self.span(x, i);
                x = next;
            }
            if x != HEAD && self.cmp_key(x, score, member) == Ordering::Equal {
                return Some(rank);
            }
        }
        None
    }

    /// Element at a 1-based rank. Rank 0 or past the end yields `None`.
    pub fn node_at_rank(&self, rank: usize) -> Option<NodeId> {
        if rank == 0 || rank > self.len {
            return None;
        }

        let mut traversed = 0;
        let mut x = HEAD;
        for i in (0..self.level).rev() {
            while let Some(next) = self.forward(x, i) {
                let span = self.span(x, i);
                if traversed + span > rank {
                    break;
                }
                traversed += span;
                x = next;
            }
            if traversed == rank {
                return Some(x);
            }
        }
        None
    }

    /// All elements, lowest first.
    pub fn iter(&self) -> SkipListIterator<'_, V, G> {
        SkipListIterator::new(self, self.first(), Order::Ascending, self.len)
    }

    /// All elements, highest first.
    pub fn iter_rev(&self) -> SkipListIterator<'_, V, G> {
        SkipListIterator::new(self, self.last(), Order::Descending, self.len)
    }

    // --- Invariant checking ---

    /// Walk every level and panic on any broken invariant.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        use std::collections::HashMap;

        let mut ranks: HashMap<NodeId, usize> = HashMap::new();
        let mut prev: Option<NodeId> = None;
        let mut cursor = self.first();
        let mut count = 0;
        while let Some(id) = cursor {
            count += 1;
            let node = self.node(id);
            assert!(node.payload.is_some(), "live node without payload");
            assert!((1..=MAX_LEVEL).contains(&node.levels.len()));
            assert_eq!(node.backward, prev, "bad backward link at rank {count}");
            if let Some(p) = prev {
                assert_eq!(
                    self.cmp_key(p, node.score, &node.member),
                    Ordering::Less,
                    "order violated at rank {count}"
                );
            }
            ranks.insert(id, count);
            prev = Some(id);
            cursor = self.forward(id, 0);
        }
        assert_eq!(count, self.len, "level-0 count != len");
        assert_eq!(self.tail, prev, "tail is not the last node");

        assert!((1..=MAX_LEVEL).contains(&self.level));
        if self.level > 1 {
            assert!(self.forward(HEAD, self.level - 1).is_some(), "empty top level");
        }
        for i in self.level..MAX_LEVEL {
            assert!(self.forward(HEAD, i).is_none(), "link above active level {i}");
        }

        for i in 0..self.level {
            let mut x = HEAD;
            let mut x_rank = 0;
            loop {
                let span = self.span(x, i);
                match self.forward(x, i) {
                    Some(next) => {
                        assert!(self.height(next) > i, "node linked above its height");
                        let next_rank = ranks[&next];
                        assert_eq!(x_rank + span, next_rank, "bad span at level {i}");
                        x = next;
                        x_rank = next_rank;
                    }
                    None => {
                        assert_eq!(x_rank + span, self.len, "bad tail span at level {i}");
                        break;
                    }
                }
            }
        }

        assert_eq!(self.nodes.len() - 1 - self.free.len(), self.len, "arena leak");
    }
}

impl<V, G: LevelGenerator> fmt::Debug for SkipList<V, G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Walks level 0 in either direction, yielding `(member, score)`.
///
/// Stops after `remaining` elements or at the end of the list.
pub struct SkipListIterator<'a, V, G = RandomLevel> {
    list: &'a SkipList<V, G>,
    cursor: Option<NodeId>,
    order: Order,
    remaining: usize,
}

impl<'a, V, G: LevelGenerator> SkipListIterator<'a, V, G> {
    pub(super) fn new(
        list: &'a SkipList<V, G>,
        start: Option<NodeId>,
        order: Order,
        remaining: usize,
    ) -> Self {
        SkipListIterator {
            list,
            cursor: start,
            order,
            remaining,
        }
    }

    pub(super) fn empty(list: &'a SkipList<V, G>) -> Self {
        Self::new(list, None, Order::Ascending, 0)
    }
}

impl<'a, V, G: LevelGenerator> Iterator for SkipListIterator<'a, V, G> {
    type Item = (&'a str, f64);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.cursor?;
        self.remaining -= 1;
        self.cursor = match self.order {
            Order::Ascending => self.list.next(id),
            Order::Descending => self.list.prev(id),
        };
        Some((self.list.member(id), self.list.score(id)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.cursor {
            Some(_) => (0, Some(self.remaining.min(self.list.len()))),
            None => (0, Some(0)),
        }
    }
}
