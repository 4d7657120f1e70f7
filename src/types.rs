use std::cmp::Ordering;

/// Fold `-0.0` into `0.0` so both zeros are one score.
///
/// Every score entering an index or a range bound passes through here.
#[inline]
pub fn canonical_score(score: f64) -> f64 {
    if score == 0.0 { 0.0 } else { score }
}

/// Total order over `(score, member)` keys.
///
/// Ordering: (score ASC, member ASC).
/// Scores use `f64::total_cmp`, so every value has a place: NaN sorts after
/// `+inf`. Callers pass canonical scores, so the two zeros never meet here.
/// Members only break ties between equal scores.
pub fn compare_keys(a_score: f64, a_member: &str, b_score: f64, b_member: &str) -> Ordering {
    a_score
        .total_cmp(&b_score)
        .then_with(|| a_member.cmp(b_member))
}

/// Whether two scores are the same position in the order.
#[inline]
pub(crate) fn same_score(a: f64, b: f64) -> bool {
    canonical_score(a).total_cmp(&canonical_score(b)) == Ordering::Equal
}

/// Direction of a range walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    /// Lowest `(score, member)` first, following level-0 forward links.
    #[default]
    Ascending,
    /// Highest first, following backward links.
    Descending,
}

/// What `add` did with the member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// The member was new to the set.
    Inserted,
    /// The member existed; its score and/or payload were replaced.
    Updated,
}

impl AddOutcome {
    /// Insertion count in the style of a command reply: 1 for new members.
    pub fn count(self) -> usize {
        match self {
            AddOutcome::Inserted => 1,
            AddOutcome::Updated => 0,
        }
    }
}

/// An element removed from a set.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry<V> {
    pub member: String,
    pub score: f64,
    pub payload: V,
}

/// A score interval for range queries.
///
/// Bounds are inclusive unless excluded. Requests that reach past the
/// scores present in a set are clamped to the set's lowest and highest
/// scores, so `[10, 20]` over scores `1..=5` yields the element scored 5.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreRange {
    pub min: f64,
    pub max: f64,
    pub exclude_min: bool,
    pub exclude_max: bool,
    /// Maximum number of elements returned. `None` means no cap.
    pub limit: Option<usize>,
}

impl ScoreRange {
    /// Inclusive range `[min, max]` with no limit.
    pub fn new(min: f64, max: f64) -> Self {
        ScoreRange {
            min: canonical_score(min),
            max: canonical_score(max),
            exclude_min: false,
            exclude_max: false,
            limit: None,
        }
    }

    /// `[-inf, +inf]`.
    pub fn all() -> Self {
        Self::new(f64::NEG_INFINITY, f64::INFINITY)
    }

    /// Make the lower bound exclusive: `(min, ...`.
    pub fn exclude_min(mut self) -> Self {
        self.exclude_min = true;
        self
    }

    /// Make the upper bound exclusive: `..., max)`.
    pub fn exclude_max(mut self) -> Self {
        self.exclude_max = true;
        self
    }

    /// Return at most `n` elements.
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }
}

impl Default for ScoreRange {
    fn default() -> Self {
        Self::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_orders_before_member() {
        assert_eq!(compare_keys(1.0, "z", 2.0, "a"), Ordering::Less);
        assert_eq!(compare_keys(2.0, "a", 1.0, "z"), Ordering::Greater);
    }

    #[test]
    fn member_breaks_ties() {
        assert_eq!(compare_keys(3.0, "a", 3.0, "b"), Ordering::Less);
        assert_eq!(compare_keys(3.0, "b", 3.0, "b"), Ordering::Equal);
    }

    #[test]
    fn nan_sorts_last() {
        assert_eq!(compare_keys(f64::NAN, "a", f64::INFINITY, "a"), Ordering::Greater);
        assert!(same_score(f64::NAN, f64::NAN));
    }

    #[test]
    fn negative_zero_is_zero() {
        assert!(canonical_score(-0.0).is_sign_positive());
        assert!(same_score(-0.0, 0.0));
        assert_eq!(
            compare_keys(canonical_score(-0.0), "a", canonical_score(0.0), "a"),
            Ordering::Equal
        );
        assert_eq!(canonical_score(-1.5), -1.5);
        assert!(canonical_score(f64::NAN).is_nan());

        let range = ScoreRange::new(-0.0, -0.0);
        assert!(range.min.is_sign_positive());
        assert!(range.max.is_sign_positive());
    }

    #[test]
    fn add_outcome_counts() {
        assert_eq!(AddOutcome::Inserted.count(), 1);
        assert_eq!(AddOutcome::Updated.count(), 0);
    }

    #[test]
    fn score_range_builder() {
        let range = ScoreRange::new(1.0, 5.0).exclude_min().limit(3);
        assert!(range.exclude_min);
        assert!(!range.exclude_max);
        assert_eq!(range.limit, Some(3));
        assert_eq!(ScoreRange::default(), ScoreRange::all());
    }
}
