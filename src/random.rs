//! Source of the random draws behind coupon rewards.
//!
//! Production uses the thread RNG; tests seed a generator or script the
//! exact draws they need.

use std::sync::Mutex;

use rand::{Rng, SeedableRng, rngs::StdRng};

pub trait RandomSource: Send + Sync {
    /// Uniform integer in `low..=high`.
    fn uniform(&self, low: i64, high: i64) -> i64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn uniform(&self, low: i64, high: i64) -> i64 {
        rand::thread_rng().gen_range(low..=high)
    }
}

/// Reproducible source for tests and local replays.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn uniform(&self, low: i64, high: i64) -> i64 {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        rng.gen_range(low..=high)
    }
}
