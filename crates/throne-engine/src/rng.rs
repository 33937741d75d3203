//! The single injectable source of randomness.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Randomness used by selection and effect sampling. Sessions own exactly one.
pub trait RandomSource {
    /// Uniform integer in `[min, max]`, inclusive. Callers guarantee `min <= max`.
    fn roll_range(&mut self, min: i32, max: i32) -> i32;
    /// Uniform float in `[0, 1)`.
    fn roll_unit(&mut self) -> f64;
    /// Restart the stream from `seed`. Sources without a seed ignore this.
    fn reseed(&mut self, _seed: u64) {}
}

/// Seeded ChaCha8 stream; the same seed reproduces the same rolls.
#[derive(Clone, Debug)]
pub struct SeededRng(ChaCha8Rng);

impl SeededRng {
    pub fn from_seed(seed: u64) -> Self {
        Self(ChaCha8Rng::seed_from_u64(seed))
    }
}

impl RandomSource for SeededRng {
    fn roll_range(&mut self, min: i32, max: i32) -> i32 {
        if min >= max {
            return min;
        }
        self.0.gen_range(min..=max)
    }

    fn roll_unit(&mut self) -> f64 {
        self.0.gen::<f64>()
    }

    fn reseed(&mut self, seed: u64) {
        self.0 = ChaCha8Rng::seed_from_u64(seed);
    }
}
