//! Injected random capability.
//!
//! Every randomized draw in the crate (sequence contents, pointer targets,
//! scroll deltas, site/pool picks) goes through [`RandomSource`] so a seeded
//! source can make whole runs deterministic under test.

use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};

pub trait RandomSource: Send {
    /// Next uniform float in `[0, 1)`.
    fn next_f64(&mut self) -> f64;
}

/// Handle shared between the run loop, the session runner, and in-flight
/// action tasks. Locked only for the duration of a draw, never across awaits.
pub type SharedRandom = Arc<Mutex<dyn RandomSource>>;

pub fn shared(rng: impl RandomSource + 'static) -> SharedRandom {
    Arc::new(Mutex::new(rng))
}

/// OS-seeded source used outside tests.
pub struct SystemRandom {
    inner: StdRng,
}

impl SystemRandom {
    pub fn new() -> Self {
        Self {
            inner: StdRng::from_rng(&mut rand::rng()),
        }
    }
}

impl Default for SystemRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for SystemRandom {
    fn next_f64(&mut self) -> f64 {
        self.inner.random()
    }
}

/// Fixed-seed source for deterministic tests.
pub struct SeededRandom {
    inner: StdRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_f64(&mut self) -> f64 {
        self.inner.random()
    }
}

/// Uniform integer in `[1, max]`, i.e. `floor(r * max) + 1`.
pub fn uniform_1_to(rng: &mut dyn RandomSource, max: u32) -> u32 {
    let max = max.max(1);
    (rng.next_f64() * f64::from(max)) as u32 + 1
}

/// Uniform pick from a non-empty slice.
pub fn pick<'a, T>(rng: &mut dyn RandomSource, pool: &'a [T]) -> &'a T {
    debug_assert!(!pool.is_empty(), "pick from empty pool");
    let idx = (rng.next_f64() * pool.len() as f64) as usize;
    &pool[idx.min(pool.len() - 1)]
}
