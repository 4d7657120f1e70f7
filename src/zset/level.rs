use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Maximum height of any node. Redis uses 32, enough for 2^64 elements at p = 1/4.
pub const MAX_LEVEL: usize = 32;

/// Chance that a node reaches the next level (Redis and LevelDB both use 1/4).
pub const LEVEL_PROBABILITY: f64 = 0.25;

/// Source of node heights for a skip list.
///
/// Each index owns its generator, so there is no shared global RNG and a
/// test can swap in a fixed sequence to pin the exact shape of the list.
pub trait LevelGenerator {
    /// Height for the next inserted node. The index clamps the result to
    /// `1..=MAX_LEVEL`.
    fn next_level(&mut self) -> usize;
}

/// Geometric level distribution backed by a seedable RNG.
///
/// Height `h` is drawn with probability `p^(h-1) * (1-p)`, capped at
/// `max_level`. Expected height is `1 / (1 - p)`, about 1.33 for p = 1/4.
#[derive(Debug, Clone)]
pub struct RandomLevel {
    rng: StdRng,
    probability: f64,
    max_level: usize,
}

impl RandomLevel {
    pub fn new(probability: f64, max_level: usize, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        RandomLevel {
            rng,
            probability,
            max_level: max_level.clamp(1, MAX_LEVEL),
        }
    }

    /// Default distribution with a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self::new(LEVEL_PROBABILITY, MAX_LEVEL, Some(seed))
    }

    /// Default distribution seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self::new(LEVEL_PROBABILITY, MAX_LEVEL, None)
    }
}

impl Default for RandomLevel {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl LevelGenerator for RandomLevel {
    fn next_level(&mut self) -> usize {
        let mut level = 1;
        while level < self.max_level && self.rng.r#gen::<f64>() < self.probability {
            level += 1;
        }
        level
    }
}

/// Replays a fixed list of heights, wrapping around at the end.
///
/// Used to build lists of a known shape so span arithmetic can be checked
/// without depending on randomness.
#[derive(Debug, Clone)]
pub struct CycleLevels {
    heights: Vec<usize>,
    pos: usize,
}

impl CycleLevels {
    pub fn new(heights: impl Into<Vec<usize>>) -> Self {
        CycleLevels {
            heights: heights.into(),
            pos: 0,
        }
    }
}

impl LevelGenerator for CycleLevels {
    fn next_level(&mut self) -> usize {
        if self.heights.is_empty() {
            return 1;
        }
        let height = self.heights[self.pos % self.heights.len()];
        self.pos += 1;
        height
    }
}
