//! The single injectable source of randomness used by a simulation.

use std::fmt;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Source of every random decision made during a match.
pub trait RandomSource: fmt::Debug {
    /// Uniform roll in `[0, 100)`.
    fn roll_percent(&mut self) -> f32;

    /// Uniform index in `[0, len)`; returns zero when `len` is zero.
    fn pick_index(&mut self, len: usize) -> usize;

    /// Uniform value in `[low, high)`; returns `low` for an empty range.
    fn range_f32(&mut self, low: f32, high: f32) -> f32;
}

/// Seeded ChaCha8 generator; identical seeds replay identical matches.
#[derive(Clone, Debug)]
pub struct ChaChaSource {
    rng: ChaCha8Rng,
}

impl ChaChaSource {
    /// Creates a generator from a 64-bit seed.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for ChaChaSource {
    fn roll_percent(&mut self) -> f32 {
        self.rng.gen_range(0.0..100.0)
    }

    fn pick_index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        self.rng.gen_range(0..len)
    }

    fn range_f32(&mut self, low: f32, high: f32) -> f32 {
        if high <= low {
            return low;
        }
        self.rng.gen_range(low..high)
    }
}

#[cfg(any(test, feature = "scripted_rng"))]
/// Replays a fixed script of rolls so tests can pin exact outcomes.
///
/// Exhausted scripts fall back to `99.0` for percent rolls, index `0` for
/// picks, and the lower bound for ranges.
#[derive(Clone, Debug, Default)]
pub struct ScriptedSource {
    percents: std::collections::VecDeque<f32>,
    picks: std::collections::VecDeque<usize>,
}

#[cfg(any(test, feature = "scripted_rng"))]
impl ScriptedSource {
    /// Creates an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends percent rolls to the script.
    #[must_use]
    pub fn with_percents(mut self, rolls: impl IntoIterator<Item = f32>) -> Self {
        self.percents.extend(rolls);
        self
    }

    /// Appends index picks to the script.
    #[must_use]
    pub fn with_picks(mut self, picks: impl IntoIterator<Item = usize>) -> Self {
        self.picks.extend(picks);
        self
    }
}

#[cfg(any(test, feature = "scripted_rng"))]
impl RandomSource for ScriptedSource {
    fn roll_percent(&mut self) -> f32 {
        self.percents.pop_front().unwrap_or(99.0)
    }

    fn pick_index(&mut self, len: usize) -> usize {
        let pick = self.picks.pop_front().unwrap_or(0);
        if len == 0 {
            0
        } else {
            pick % len
        }
    }

    fn range_f32(&mut self, low: f32, _high: f32) -> f32 {
        low
    }
}
