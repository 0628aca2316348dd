//! Seedable uniform sampling for particle jitter

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;

/// Random source owned by each emitter
#[derive(Clone)]
pub struct ParticleRng {
    inner: StdRng,
}

impl ParticleRng {
    /// Deterministic generator, for reproducible effects and tests
    pub fn new(seed: u64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            inner: StdRng::from_os_rng(),
        }
    }

    /// Returns a float in [0, 1)
    pub fn next_f32(&mut self) -> f32 {
        self.inner.random::<f32>()
    }

    /// Returns a float in [min, max). Returns `min` when the range is empty.
    pub fn range(&mut self, min: f32, max: f32) -> f32 {
        if min >= max || min.is_nan() || max.is_nan() {
            return min;
        }
        self.inner.random_range(min..max)
    }

    /// Returns a float in [base - amplitude, base + amplitude]
    pub fn spread(&mut self, base: f32, amplitude: f32) -> f32 {
        if amplitude <= 0.0 || amplitude.is_nan() {
            return base;
        }
        self.inner.random_range(base - amplitude..=base + amplitude)
    }
}

impl fmt::Debug for ParticleRng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParticleRng").finish_non_exhaustive()
    }
}
