//! Deterministic roll source for probabilistic mechanics.
//!
//! Breakthrough attempts and craft quality tiers roll against a
//! [`RollOracle`]. Implementations must be deterministic: the same seed
//! always produces the same roll, which keeps idle replays and tests
//! reproducible. The runtime seeds the oracle from entropy once per
//! session; everything downstream is pure.

/// Roll source for breakthrough and quality mechanics.
pub trait RollOracle: Send + Sync {
    /// Generate a random u32 value from a seed.
    fn next_u32(&self, seed: u64) -> u32;

    /// Uniform roll in [0, 1), suitable for comparing against a chance.
    fn unit_roll(&self, seed: u64) -> f64 {
        self.next_u32(seed) as f64 / (u32::MAX as f64 + 1.0)
    }

    /// Roll a d100 (1-100 inclusive).
    fn roll_d100(&self, seed: u64) -> u32 {
        (self.next_u32(seed) % 100) + 1
    }
}

/// PCG-XSH-RR roll source: 32-bit output from 64-bit state.
///
/// Deterministic, branch-free, and small; the same generator family the
/// rest of the engine's tooling uses for replayable randomness.
#[derive(Clone, Copy, Debug, Default)]
pub struct PcgRoller;

impl PcgRoller {
    const MULTIPLIER: u64 = 6364136223846793005;
    const INCREMENT: u64 = 1442695040888963407;

    #[inline]
    fn step(state: u64) -> u64 {
        state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT)
    }

    #[inline]
    fn output(state: u64) -> u32 {
        let xorshifted = (((state >> 18) ^ state) >> 27) as u32;
        let rot = (state >> 59) as u32;
        xorshifted.rotate_right(rot)
    }
}

impl RollOracle for PcgRoller {
    fn next_u32(&self, seed: u64) -> u32 {
        Self::output(Self::step(seed))
    }
}

/// Mixes session seed, event counter, and a per-call context into a seed.
///
/// Use distinct context values when one action needs several independent
/// rolls (0 = primary roll, 1 = quality roll, ...).
pub fn compute_seed(session_seed: u64, counter: u64, context: u32) -> u64 {
    let mut hash = session_seed;
    hash ^= counter.wrapping_mul(0x9e3779b97f4a7c15);
    hash ^= (context as u64).wrapping_mul(0x85ebca6b);
    hash ^= hash >> 33;
    hash = hash.wrapping_mul(0xff51afd7ed558ccd);
    hash ^= hash >> 33;
    hash
}
