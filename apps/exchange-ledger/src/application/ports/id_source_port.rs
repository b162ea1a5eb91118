//! Identifier Source Port
//!
//! Draws random identifiers from a bounded range. Callers own the
//! uniqueness check and redraw on collision.

use std::ops::RangeInclusive;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Random draw from an inclusive range.
pub trait IdSource: Send + Sync {
    /// Draw one value from `range`.
    fn draw(&self, range: RangeInclusive<u32>) -> u32;
}

/// `StdRng`-backed source, seeded from the OS or from a fixed seed.
#[derive(Debug)]
pub struct RandomIdSource {
    rng: Mutex<StdRng>,
}

impl RandomIdSource {
    /// Seed from operating system entropy.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Deterministic sequence for tests.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for RandomIdSource {
    fn default() -> Self {
        Self::new()
    }
}

impl IdSource for RandomIdSource {
    fn draw(&self, range: RangeInclusive<u32>) -> u32 {
        self.rng.lock().random_range(range)
    }
}
