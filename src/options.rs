use crate::error::{Error, Result};
use crate::zset::level::{LEVEL_PROBABILITY, MAX_LEVEL};

/// Tuning knobs for a [`Store`](crate::Store).
///
/// Defaults follow Redis: 32 levels, promotion probability 1/4.
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    /// Tallest node any index may build. Valid range: `1..=32`.
    pub max_level: usize,
    /// Chance that a node is promoted one level higher. Valid range: `(0, 1)`.
    pub probability: f64,
    /// Seed for level generation. `None` draws from OS entropy.
    ///
    /// With a seed, the n-th set created by a store gets its own generator
    /// derived from `(seed, n)`, so a replayed workload builds identical
    /// indexes.
    pub seed: Option<u64>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            max_level: MAX_LEVEL,
            probability: LEVEL_PROBABILITY,
            seed: None,
        }
    }
}

impl Options {
    /// Reject settings the index cannot honor.
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_LEVEL).contains(&self.max_level) {
            return Err(Error::InvalidOptions(format!(
                "max_level must be in 1..={MAX_LEVEL}, got {}",
                self.max_level
            )));
        }
        if !(self.probability > 0.0 && self.probability < 1.0) {
            return Err(Error::InvalidOptions(format!(
                "probability must be in (0, 1), got {}",
                self.probability
            )));
        }
        Ok(())
    }

    /// Set the level cap.
    pub fn max_level(mut self, max_level: usize) -> Self {
        self.max_level = max_level;
        self
    }

    /// Set the promotion probability.
    pub fn probability(mut self, probability: f64) -> Self {
        self.probability = probability;
        self
    }

    /// Make level generation reproducible.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
