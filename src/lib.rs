//! # Ranked sorted-set engine
//!
//! In-memory sorted sets in the style of Redis ZSETs: each key holds unique
//! members ordered by an `f64` score, with members breaking ties.
//!
//! ## Core idea
//! Every set is a skip list whose forward links also record how many
//! elements they jump over ("span"). Summing spans along a search path gives
//! an element's rank, so rank lookups and positional slices cost O(log n)
//! instead of a linear scan. A hash map from member to node handle gives
//! O(1) score lookups and keeps members unique.
//!
//! ```rust
//! use rank_zset::{ScoreRange, Store};
//!
//! let mut store = Store::new();
//! store.add("board", 5.0, "m1", ());
//! store.add("board", 2.0, "m2", ());
//! store.add("board", 7.0, "m3", ());
//!
//! assert_eq!(store.rank("board", "m1"), Some(1));
//! assert_eq!(store.rev_rank("board", "m2"), Some(2));
//! assert_eq!(store.range("board", 0, -1), vec!["m2", "m1", "m3"]);
//! assert_eq!(
//!     store.range_by_score("board", ScoreRange::new(10.0, 20.0)),
//!     vec![("m3".to_string(), 7.0)],
//! );
//! ```

pub mod error;
pub mod options;
pub mod store;
pub mod types;
pub mod zset;

#[cfg(test)]
mod proptests;

// Public re-exports for the top-level API
pub use error::{Error, Result};
pub use options::Options;
pub use store::Store;
pub use types::{AddOutcome, Entry, Order, ScoreRange};
pub use zset::SortedSet;
