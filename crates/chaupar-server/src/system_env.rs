//! Production Environment implementation using system time and RNG.
//!
//! `SystemEnv` is the production implementation of the Environment trait using
//! real system time and cryptographic RNG.
//!
//! # Capabilities
//!
//! - Real system time (`std::time::Instant`) that advances naturally
//! - OS cryptographic RNG (getrandom). Truly random, not reproducible
//!
//! This means production behavior is non-deterministic: dice rolls and room
//! ids differ run to run. Tests use the simulation environment instead.

use chaupar_core::Environment;

/// Production environment using system time and cryptographic RNG.
///
/// Uses `std::time::Instant::now()` for time and getrandom for cryptographic
/// randomness.
///
/// # Security
///
/// The RNG uses getrandom which provides OS-level cryptographic randomness
/// (e.g., /dev/urandom on Linux, `BCryptGenRandom` on Windows). Suitable for
/// generating room ids and dice rolls that must not be predictable by
/// players with money on the line.
///
/// # Panics
///
/// Panics if the OS RNG fails. This is intentional - a server without
/// functioning randomness cannot host fair matches. RNG failure is extremely
/// rare (indicates OS-level issues) and continuing would make every dice
/// roll and room id predictable.
#[derive(Clone, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    type Instant = std::time::Instant;

    #[allow(clippy::disallowed_methods)]
    fn now(&self) -> Self::Instant {
        std::time::Instant::now()
    }

    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer)
            .expect("invariant: OS RNG failure is unrecoverable - dice must stay unpredictable");
    }
}
