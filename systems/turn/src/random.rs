//! Seeded random source used for local rule resolution.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use torus_core::RandomSource;

/// ChaCha8-backed [`RandomSource`] that reproduces the same draws for the same seed.
#[derive(Clone, Debug)]
pub struct SeededRandom {
    rng: ChaCha8Rng,
}

impl SeededRandom {
    /// Creates a source seeded with `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_index(&mut self, bound: usize) -> usize {
        if bound == 0 {
            return 0;
        }
        self.rng.gen_range(0..bound)
    }
}
