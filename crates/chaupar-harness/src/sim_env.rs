#![allow(clippy::disallowed_types, reason = "Synchronous simulation state only")]

//! Simulated environment: seeded RNG, virtual clock, scripted dice.

use std::{
    collections::VecDeque,
    ops::Sub,
    sync::{Arc, Mutex},
    time::Duration,
};

use chaupar_core::env::Environment;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Virtual instant measured from the simulation's start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SimInstant(Duration);

impl Sub for SimInstant {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Duration {
        self.0.saturating_sub(rhs.0)
    }
}

/// Deterministic [`Environment`] for tests.
///
/// Randomness comes from ChaCha8 seeded explicitly, so a failing test
/// reproduces from its seed. The clock only moves when [`SimEnv::advance`]
/// is called. Dice draws can be scripted exactly; see
/// [`SimEnv::script_rolls`].
#[derive(Clone)]
pub struct SimEnv {
    inner: Arc<Mutex<SimEnvInner>>,
}

struct SimEnvInner {
    rng: ChaCha8Rng,
    /// Pre-encoded dice bytes, served to single-byte draws in order.
    scripted_dice: VecDeque<u8>,
    now: Duration,
}

impl SimEnv {
    /// Create a simulation environment from a seed.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SimEnvInner {
                rng: ChaCha8Rng::seed_from_u64(seed),
                scripted_dice: VecDeque::new(),
                now: Duration::ZERO,
            })),
        }
    }

    /// Queue exact dice rolls.
    ///
    /// Scripted bytes encode `roll - 1` and are served to single-byte
    /// draws before the RNG is consulted. They always sit inside
    /// `roll_die`'s acceptance bound, so the next `rolls.len()` dice come
    /// out exactly as given, one draw each. Multi-byte draws (id
    /// generation) never touch the script.
    ///
    /// # Panics
    ///
    /// Panics if a roll is outside `1..=6` or the internal mutex is
    /// poisoned. Acceptable for test code.
    #[allow(clippy::expect_used)]
    pub fn script_rolls(&self, rolls: &[u8]) {
        let mut inner = self.inner.lock().expect("Mutex poisoned");
        for &roll in rolls {
            assert!((1..=6).contains(&roll), "scripted roll out of range: {roll}");
            // roll_die accepts any byte below 252 and computes 1 + byte % 6.
            inner.scripted_dice.push_back(roll - 1);
        }
    }

    /// Number of scripted rolls not yet consumed.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. Acceptable for test code.
    #[allow(clippy::expect_used)]
    pub fn scripted_remaining(&self) -> usize {
        self.inner.lock().expect("Mutex poisoned").scripted_dice.len()
    }

    /// Move the virtual clock forward.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. Acceptable for test code.
    #[allow(clippy::expect_used)]
    pub fn advance(&self, delta: Duration) {
        self.inner.lock().expect("Mutex poisoned").now += delta;
    }
}

impl Environment for SimEnv {
    type Instant = SimInstant;

    #[allow(clippy::expect_used)]
    fn now(&self) -> Self::Instant {
        SimInstant(self.inner.lock().expect("Mutex poisoned").now)
    }

    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        let mut inner = self.inner.lock().expect("Mutex poisoned");

        // Single-byte draws are dice; serve the script first.
        if buffer.len() == 1 {
            if let Some(byte) = inner.scripted_dice.pop_front() {
                buffer[0] = byte;
                return;
            }
        }

        inner.rng.fill_bytes(buffer);
    }
}
