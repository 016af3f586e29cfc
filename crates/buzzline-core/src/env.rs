//! Environment abstraction for deterministic testing.
//!
//! Decouples coordination logic from system resources (wall-clock time,
//! randomness). Production uses the OS clock and RNG; tests plug in a seeded
//! implementation so failing runs replay exactly.

/// Abstract environment providing time and randomness.
///
/// # Safety
///
/// Implementations MUST guarantee:
///
/// - `wall_clock_secs()` never goes backwards within a single execution
/// - `random_bytes()` uses cryptographically secure entropy in production
///   (seeded deterministic RNGs are for tests only)
pub trait Environment: Clone + Send + Sync + 'static {
    /// Seconds since the Unix epoch.
    ///
    /// Used only for room listing order, never for authority decisions.
    fn wall_clock_secs(&self) -> u64;

    /// Fills the provided buffer with random bytes.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Generates a random `u64`.
    ///
    /// Convenience for player and connection identifiers.
    fn random_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }

    /// Generates a random `u128`.
    ///
    /// Convenience for room identifiers.
    fn random_u128(&self) -> u128 {
        let mut bytes = [0u8; 16];
        self.random_bytes(&mut bytes);
        u128::from_be_bytes(bytes)
    }
}
