// Copyright (c) 2026 Tessera Contributors
// SPDX-License-Identifier: AGPL-3.0

use parking_lot::Mutex;

const MULTIPLIER: u64 = 1_664_525;
const INCREMENT: u64 = 1_013_904_223;
const MODULUS: u64 = 1 << 32;

/// Seeded linear congruential generator for reproducible simulations.
#[derive(Debug)]
pub struct SimulatedRandom {
    state: Mutex<u64>,
}

impl SimulatedRandom {
    pub fn new(seed: u32) -> Self {
        Self {
            state: Mutex::new(u64::from(seed)),
        }
    }

    /// Next value in `[0, 1)`.
    pub fn next(&self) -> f64 {
        let mut state = self.state.lock();
        *state = (*state * MULTIPLIER + INCREMENT) % MODULUS;
        *state as f64 / MODULUS as f64
    }

    pub fn should_fail(&self, probability: f64) -> bool {
        self.next() < probability
    }

    /// Restarts the sequence as if freshly built with `seed`.
    pub fn reseed(&self, seed: u32) {
        *self.state.lock() = u64::from(seed);
    }
}

impl Default for SimulatedRandom {
    fn default() -> Self {
        Self::new(1)
    }
}
