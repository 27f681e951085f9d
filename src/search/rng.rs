//! Explicit randomness source for mutation and acceptance.

use rand::prelude::*;

/// Random number generator wrapper passed into every mutation call.
///
/// Each search run owns exactly one, so runs replay bit-for-bit from the
/// same seed and parallel runs never share state.
pub struct SearchRng {
    rng: StdRng,
    seed: u64,
}

impl SearchRng {
    /// Create from seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    /// Seed this generator was created from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform index in `0..len`. `len` must be non-zero.
    pub fn index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }

    /// Two distinct indices in `0..len`, or `None` when `len < 2`.
    pub fn distinct_pair(&mut self, len: usize) -> Option<(usize, usize)> {
        if len < 2 {
            return None;
        }
        let first = self.rng.gen_range(0..len);
        // Draw from the remaining len - 1 positions and skip over `first`.
        let mut second = self.rng.gen_range(0..len - 1);
        if second >= first {
            second += 1;
        }
        Some((first, second))
    }

    /// Uniform integer in `low..=high`.
    pub fn range_inclusive(&mut self, low: usize, high: usize) -> usize {
        self.rng.gen_range(low..=high)
    }

    /// Uniform float in `[0, 1)`.
    pub fn unit(&mut self) -> f64 {
        self.rng.r#gen::<f64>()
    }

    /// Shuffle a slice in place.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.rng);
    }

    /// Draw from any distribution.
    pub fn sample<T, D: rand_distr::Distribution<T>>(&mut self, distribution: &D) -> T {
        distribution.sample(&mut self.rng)
    }
}
