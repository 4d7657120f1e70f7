//! Range queries over a [`SkipList`]: by position and by score.
//!
//! Both kinds locate their starting element by descending the levels, so
//! the cost is O(log n) plus the number of elements returned.

use std::cmp::Ordering;

use super::level::LevelGenerator;
use super::skiplist::{NodeId, SkipList, SkipListIterator};
use crate::types::{Order, ScoreRange, canonical_score};

/// Resolve a possibly negative position against `len`.
///
/// Negative positions count from the end (`-1` is the last element) and
/// saturate at 0.
pub(crate) fn normalize_index(index: i64, len: i64) -> i64 {
    if index < 0 {
        index.saturating_add(len).max(0)
    } else {
        index
    }
}

/// Score bounds after clamping to the scores present in a list.
#[derive(Debug, Clone, Copy)]
struct ScoreBounds {
    min: f64,
    max: f64,
    exclude_min: bool,
    exclude_max: bool,
}

impl ScoreBounds {
    fn above_min(&self, score: f64) -> bool {
        match score.total_cmp(&self.min) {
            Ordering::Greater => true,
            Ordering::Equal => !self.exclude_min,
            Ordering::Less => false,
        }
    }

    fn below_max(&self, score: f64) -> bool {
        match score.total_cmp(&self.max) {
            Ordering::Less => true,
            Ordering::Equal => !self.exclude_max,
            Ordering::Greater => false,
        }
    }
}

/// Pull a requested bound into `[lowest, highest]`.
///
/// A bound that had to move lands exactly on an element, so it becomes
/// inclusive regardless of the requested exclusivity.
fn clamp_bound(value: f64, exclude: bool, lowest: f64, highest: f64) -> (f64, bool) {
    if value.total_cmp(&lowest) == Ordering::Less {
        (lowest, false)
    } else if value.total_cmp(&highest) == Ordering::Greater {
        (highest, false)
    } else {
        (value, exclude)
    }
}

impl<V, G: LevelGenerator> SkipList<V, G> {
    /// Elements between 0-based positions `start` and `stop`, inclusive.
    ///
    /// Positions count in the direction of `order`, so `(0, 0)` with
    /// [`Order::Descending`] is the highest element. Negative positions count
    /// from the end. An inverted or out-of-bounds window yields nothing;
    /// `stop` past the end is cut to the last element.
    pub fn range_by_rank(&self, start: i64, stop: i64, order: Order) -> SkipListIterator<'_, V, G> {
        let len = self.len() as i64;
        let start = normalize_index(start, len);
        let stop = normalize_index(stop, len);
        if start > stop || start >= len {
            return SkipListIterator::empty(self);
        }
        let stop = stop.min(len - 1);

        let rank = match order {
            Order::Ascending => start + 1,
            Order::Descending => len - start,
        };
        let first = self.node_at_rank(rank as usize);
        SkipListIterator::new(self, first, order, (stop - start + 1) as usize)
    }

    /// Elements whose score lies in `range`, as `(member, score)`.
    ///
    /// `range.min > range.max` yields nothing. Otherwise both bounds are
    /// clamped into the lowest and highest scores present, so a request
    /// entirely above the data returns the highest element and one entirely
    /// below returns the lowest. [`Order::Descending`] walks down from the
    /// upper bound. At most `range.limit` elements are produced.
    pub fn range_by_score(
        &self,
        range: ScoreRange,
        order: Order,
    ) -> impl Iterator<Item = (&str, f64)> + '_ {
        let bounds = self.clamp_bounds(&range);
        let start = bounds.and_then(|b| match order {
            Order::Ascending => self.first_in_range(&b),
            Order::Descending => self.last_in_range(&b),
        });
        let remaining = range.limit.unwrap_or(usize::MAX);

        SkipListIterator::new(self, start, order, remaining).take_while(move |&(_, score)| {
            bounds.is_some_and(|b| match order {
                Order::Ascending => b.below_max(score),
                Order::Descending => b.above_min(score),
            })
        })
    }

    fn clamp_bounds(&self, range: &ScoreRange) -> Option<ScoreBounds> {
        // Fields are public, so bounds may not have gone through `ScoreRange::new`.
        let (min, max) = (canonical_score(range.min), canonical_score(range.max));
        if min.total_cmp(&max) == Ordering::Greater {
            return None;
        }
        let lowest = self.score(self.first()?);
        let highest = self.score(self.last()?);

        let (min, exclude_min) = clamp_bound(min, range.exclude_min, lowest, highest);
        let (max, exclude_max) = clamp_bound(max, range.exclude_max, lowest, highest);
        Some(ScoreBounds {
            min,
            max,
            exclude_min,
            exclude_max,
        })
    }

    /// First element at or above the lower bound.
    fn first_in_range(&self, bounds: &ScoreBounds) -> Option<NodeId> {
        let mut x = self.head();
        for i in (0..self.level()).rev() {
            while let Some(next) = self.forward(x, i) {
                if bounds.above_min(self.score(next)) {
                    break;
                }
                x = next;
            }
        }
        self.forward(x, 0)
    }

    /// Last element at or below the upper bound.
    fn last_in_range(&self, bounds: &ScoreBounds) -> Option<NodeId> {
        let head = self.head();
        let mut x = head;
        for i in (0..self.level()).rev() {
            while let Some(next) = self.forward(x, i) {
                if !bounds.below_max(self.score(next)) {
                    break;
                }
                x = next;
            }
        }
        (x != head).then_some(x)
    }
}
