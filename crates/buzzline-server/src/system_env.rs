//! Production Environment implementation using system time and RNG.
//!
//! `SystemEnv` is the production implementation of the
//! [`Environment`](buzzline_core::env::Environment) trait: real wall-clock
//! time and OS cryptographic randomness (getrandom). Non-deterministic by
//! nature — tests use seeded environments instead.

use buzzline_core::env::Environment;

/// Production environment using the system clock and cryptographic RNG.
///
/// # Panics
///
/// Panics if the OS RNG fails. This is intentional — a server that cannot
/// produce unpredictable identifiers cannot operate; RNG failure indicates
/// an OS-level problem.
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
    #[allow(clippy::disallowed_methods)]
    #[allow(clippy::expect_used)]
    fn wall_clock_secs(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("invariant: system clock is after Unix epoch (1970-01-01)")
            .as_secs()
    }

    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer)
            .expect("invariant: OS RNG failure is unrecoverable - server cannot operate");
    }
}
