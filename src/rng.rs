//! Random sources for petal spawning.
//!
//! Every randomized petal attribute is drawn through [`RandomSource`], so the
//! loop can run on a real RNG in the hosts and on a scripted sequence in
//! tests where exact derived values are asserted.
//!
//! ```ignore
//! // Production: seeded from the clock.
//! let rng = SmallRngSource::from_clock();
//!
//! // Tests: every draw returns 0.5.
//! let rng = ScriptedSource::new(vec![0.5]);
//! ```

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Largest `f32` strictly below 1.0.
pub(crate) const UNIT_CEIL: f32 = 1.0 - f32::EPSILON / 2.0;

/// A source of uniform samples in `[0, 1)`.
pub trait RandomSource {
    /// Uniform sample in `[0, 1)`.
    fn next_unit(&mut self) -> f32;

    /// Uniform sample in `[min, max)`.
    #[inline]
    fn range(&mut self, min: f32, max: f32) -> f32 {
        min + (max - min) * self.next_unit()
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    #[inline]
    fn next_unit(&mut self) -> f32 {
        (**self).next_unit()
    }
}

impl<R: RandomSource + ?Sized> RandomSource for Box<R> {
    #[inline]
    fn next_unit(&mut self) -> f32 {
        (**self).next_unit()
    }
}

/// [`RandomSource`] backed by rand's `SmallRng`.
#[derive(Debug, Clone)]
pub struct SmallRngSource {
    rng: SmallRng,
}

impl SmallRngSource {
    /// Seed from the system clock, different for every run.
    pub fn from_clock() -> Self {
        let seed = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(42);
        Self::seeded(seed)
    }

    /// Reproducible source for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SmallRngSource {
    #[inline]
    fn next_unit(&mut self) -> f32 {
        // gen::<f32>() is already [0, 1); min() guards the contract anyway.
        self.rng.gen::<f32>().min(UNIT_CEIL)
    }
}

/// Replays a fixed list of samples, wrapping around at the end.
///
/// Values are clamped into `[0, 1)` so a script can never push a petal out
/// of its documented attribute ranges.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    values: Vec<f32>,
    cursor: usize,
}

impl ScriptedSource {
    /// An empty list behaves like a constant `0.0`.
    pub fn new(values: Vec<f32>) -> Self {
        Self { values, cursor: 0 }
    }

    /// Source that always yields `value`.
    pub fn constant(value: f32) -> Self {
        Self::new(vec![value])
    }

    /// Number of samples drawn so far.
    pub fn drawn(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for ScriptedSource {
    fn next_unit(&mut self) -> f32 {
        if self.values.is_empty() {
            self.cursor += 1;
            return 0.0;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, UNIT_CEIL)
        }
    }
}
