//! Time sources.
//!
//! The engine never reads the wall clock itself; every operation takes an
//! explicit timestamp. The session pulls its timestamps from a [`Clock`] so
//! tests and replays can drive time by hand.

use std::sync::atomic::{AtomicU64, Ordering};

/// Millisecond time source for the session.
pub trait Clock: Send + Sync {
    /// Current time in milliseconds. Must be monotonically non-decreasing.
    fn now_ms(&self) -> u64;
}

/// Wall-clock time via the system clock (unix epoch milliseconds).
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        chrono::Utc::now().timestamp_millis().max(0) as u64
    }
}

/// Hand-driven clock for tests and deterministic replays.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicU64,
}

impl ManualClock {
    pub fn new(now_ms: u64) -> Self {
        Self {
            now_ms: AtomicU64::new(now_ms),
        }
    }

    /// Moves the clock forward by `delta_ms`.
    pub fn advance(&self, delta_ms: u64) {
        self.now_ms.fetch_add(delta_ms, Ordering::SeqCst);
    }

    /// Jumps to an absolute timestamp. Never moves backwards.
    pub fn set(&self, now_ms: u64) {
        self.now_ms.fetch_max(now_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances_and_never_rewinds() {
        let clock = ManualClock::new(1_000);
        clock.advance(500);
        assert_eq!(clock.now_ms(), 1_500);
        clock.set(1_200);
        assert_eq!(clock.now_ms(), 1_500);
        clock.set(2_000);
        assert_eq!(clock.now_ms(), 2_000);
    }
}
