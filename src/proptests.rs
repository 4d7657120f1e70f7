use super::*;
use crate::types::compare_keys;
use crate::zset::level::{CycleLevels, RandomLevel};
use crate::zset::skiplist::SkipList;

use proptest::prelude::*;
use std::collections::BTreeMap;

/// Reference model: member -> (score, payload).
type Model = BTreeMap<String, (f64, u32)>;

#[derive(Clone, Debug)]
enum Op {
    Add { member: u8, score: i8, payload: u32 },
    Remove { member: u8 },
    PopMin,
    PopMax,
}

fn arbitrary_op() -> impl Strategy<Value = Op> {
    // Few members and few scores so updates and ties are common.
    prop_oneof![
        6 => (0u8..24, -6i8..6, any::<u32>())
            .prop_map(|(member, score, payload)| Op::Add { member, score, payload }),
        2 => (0u8..24).prop_map(|member| Op::Remove { member }),
        1 => Just(Op::PopMin),
        1 => Just(Op::PopMax),
    ]
}

fn name(member: u8) -> String {
    format!("m{member:02}")
}

fn sorted(model: &Model) -> Vec<(String, f64)> {
    let mut items: Vec<_> = model.iter().map(|(m, (s, _))| (m.clone(), *s)).collect();
    items.sort_by(|a, b| compare_keys(a.1, &a.0, b.1, &b.0));
    items
}

fn apply(set: &mut SortedSet<u32>, model: &mut Model, op: &Op) {
    match op {
        Op::Add { member, score, payload } => {
            let member = name(*member);
            let outcome = set.add(&member, *score as f64, *payload);
            let existed = model.insert(member, (*score as f64, *payload)).is_some();
            let expected = if existed { AddOutcome::Updated } else { AddOutcome::Inserted };
            assert_eq!(outcome, expected);
        }
        Op::Remove { member } => {
            let member = name(*member);
            assert_eq!(set.remove(&member), model.remove(&member).is_some());
        }
        Op::PopMin | Op::PopMax => {
            let items = sorted(model);
            let expected = match op {
                Op::PopMin => items.first(),
                _ => items.last(),
            }
            .cloned();
            let popped = match op {
                Op::PopMin => set.pop_min(),
                _ => set.pop_max(),
            };
            assert_eq!(popped.as_ref().map(|e| (e.member.clone(), e.score)), expected);
            if let Some(entry) = popped {
                let (_, payload) = model.remove(&entry.member).unwrap();
                assert_eq!(entry.payload, payload);
            }
        }
    }
}

/// Expected result of a clamped score query over the model.
fn model_score_range(items: &[(String, f64)], range: ScoreRange, order: Order) -> Vec<(String, f64)> {
    if items.is_empty() || range.min > range.max {
        return Vec::new();
    }
    let lowest = items[0].1;
    let highest = items[items.len() - 1].1;
    let clamp = |v: f64, exclude: bool| {
        if v < lowest {
            (lowest, false)
        } else if v > highest {
            (highest, false)
        } else {
            (v, exclude)
        }
    };
    let (min, exclude_min) = clamp(range.min, range.exclude_min);
    let (max, exclude_max) = clamp(range.max, range.exclude_max);
    let inside = |s: f64| {
        (if exclude_min { s > min } else { s >= min }) && (if exclude_max { s < max } else { s <= max })
    };
    let mut hits: Vec<_> = items.iter().filter(|(_, s)| inside(*s)).cloned().collect();
    if order == Order::Descending {
        hits.reverse();
    }
    hits.truncate(range.limit.unwrap_or(usize::MAX));
    hits
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// After any sequence of operations the set matches the model and every
    /// structural invariant holds.
    #[test]
    fn set_matches_model(ops in prop::collection::vec(arbitrary_op(), 1..200), seed in any::<u64>()) {
        let mut set = SortedSet::with_levels(RandomLevel::seeded(seed));
        let mut model = Model::new();

        for op in &ops {
            apply(&mut set, &mut model, op);
        }
        set.check_invariants();

        let items = sorted(&model);
        let got: Vec<_> = set.iter().map(|(m, s)| (m.to_owned(), s)).collect();
        prop_assert_eq!(&got, &items);
        prop_assert_eq!(set.len(), model.len());

        for (i, (member, score)) in items.iter().enumerate() {
            prop_assert_eq!(set.rank(member), Some(i));
            prop_assert_eq!(set.rev_rank(member), Some(items.len() - 1 - i));
            prop_assert_eq!(set.score(member), Some(*score));
            prop_assert_eq!(set.payload(member), model.get(member).map(|(_, p)| p));
        }
    }

    /// Rank windows agree with slicing the sorted model.
    #[test]
    fn rank_window_matches_slice(
        ops in prop::collection::vec(arbitrary_op(), 0..120),
        start in -30i64..30,
        stop in -30i64..30,
    ) {
        let mut set = SortedSet::with_levels(RandomLevel::seeded(1));
        let mut model = Model::new();
        for op in &ops {
            apply(&mut set, &mut model, op);
        }

        let items = sorted(&model);
        let len = items.len() as i64;
        let norm = |i: i64| if i < 0 { (i + len).max(0) } else { i };
        let (s, e) = (norm(start), norm(stop).min(len - 1));
        let expected: Vec<_> = if s > e || s >= len {
            Vec::new()
        } else {
            items[s as usize..=e as usize].to_vec()
        };

        let asc: Vec<_> = set.range(start, stop, Order::Ascending).map(|(m, s)| (m.to_owned(), s)).collect();
        prop_assert_eq!(&asc, &expected);

        let mut reversed = items.clone();
        reversed.reverse();
        let expected_rev: Vec<_> = if s > e || s >= len {
            Vec::new()
        } else {
            reversed[s as usize..=e as usize].to_vec()
        };
        let desc: Vec<_> = set.range(start, stop, Order::Descending).map(|(m, s)| (m.to_owned(), s)).collect();
        prop_assert_eq!(&desc, &expected_rev);
    }

    /// Score windows agree with filtering the model under the clamping policy.
    #[test]
    fn score_window_matches_filter(
        ops in prop::collection::vec(arbitrary_op(), 0..120),
        min in -9i8..9,
        max in -9i8..9,
        exclude_min in any::<bool>(),
        exclude_max in any::<bool>(),
        limit in prop::option::of(0usize..10),
    ) {
        let mut set = SortedSet::with_levels(RandomLevel::seeded(2));
        let mut model = Model::new();
        for op in &ops {
            apply(&mut set, &mut model, op);
        }
        let items = sorted(&model);

        let mut range = ScoreRange::new(min as f64, max as f64);
        range.exclude_min = exclude_min;
        range.exclude_max = exclude_max;
        range.limit = limit;

        for order in [Order::Ascending, Order::Descending] {
            let got: Vec<_> = set.range_by_score(range, order).map(|(m, s)| (m.to_owned(), s)).collect();
            prop_assert_eq!(got, model_score_range(&items, range, order));
        }
    }

    /// Insert then remove leaves every other rank where it was.
    #[test]
    fn insert_remove_round_trip(
        ops in prop::collection::vec(arbitrary_op(), 0..80),
        score in -6i8..6,
    ) {
        let mut set = SortedSet::with_levels(RandomLevel::seeded(3));
        let mut model = Model::new();
        for op in &ops {
            apply(&mut set, &mut model, op);
        }
        let before: Vec<_> = set.iter().map(|(m, _)| (m.to_owned(), set.rank(m))).collect();

        set.add("fresh", score as f64, 0);
        prop_assert!(set.remove("fresh"));
        set.check_invariants();

        prop_assert_eq!(set.len(), before.len());
        for (member, rank) in &before {
            prop_assert_eq!(set.rank(member), *rank);
        }
    }

    /// Fixed height patterns exercise span bookkeeping without randomness.
    #[test]
    fn scripted_heights_keep_spans_exact(
        heights in prop::collection::vec(1usize..8, 1..12),
        keys in prop::collection::vec((0u8..40, -4i8..4), 1..80),
        removals in prop::collection::vec(0u8..40, 0..40),
    ) {
        let mut list: SkipList<(), CycleLevels> = SkipList::with_generator(CycleLevels::new(heights));
        let mut present: BTreeMap<String, f64> = BTreeMap::new();

        for (member, score) in keys {
            let member = name(member);
            if present.contains_key(&member) {
                continue;
            }
            list.insert(score as f64, member.clone(), ());
            present.insert(member, score as f64);
            list.check_invariants();
        }
        for member in removals {
            let member = name(member);
            if let Some(score) = present.remove(&member) {
                prop_assert!(list.delete(score, &member).is_some());
                list.check_invariants();
            }
        }

        for rank in 1..=list.len() {
            let id = list.node_at_rank(rank).unwrap();
            prop_assert_eq!(list.rank(list.score(id), list.member(id)), Some(rank));
        }
    }
}

#[test]
fn store_lifecycle_keeps_sets_independent() {
    let mut store: Store<u32> = Store::with_options(Options::default().seed(5)).unwrap();
    for i in 0..100u32 {
        store.add(if i % 2 == 0 { "even" } else { "odd" }, i as f64, &format!("m{i}"), i);
    }
    store.check_invariants();
    assert_eq!(store.card("even"), 50);
    assert_eq!(store.card("odd"), 50);
    assert!(store.clear("even"));
    assert_eq!(store.card("odd"), 50);
    assert_eq!(store.keys().collect::<Vec<_>>(), vec!["odd"]);
}
