//! Idle catch-up orchestration.
//!
//! On resume after a suspension gap every subsystem reconciles once against
//! the new clock: slots are polled at the resumed timestamp and the
//! accumulator advances the whole gap as a single batch (chunked when
//! large). Because slots clear themselves on completion and accrual is
//! driven by a monotonic watermark, re-invoking reconciliation with the
//! same timestamp is a no-op.
//!
//! Approximation contract: rates that depend on level (bottleneck
//! multiplier, breakthrough gating) are sampled at the start of each batch
//! rather than re-derived per sub-interval. Chunking bounds the error.

use crate::error::EngineError;

/// Net effect of reconciling one participant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IdleOutcome {
    /// Timed operations that completed during the gap.
    pub completed_operations: u32,
    /// Experience committed by accrual during the gap.
    pub experience_gained: u64,
    /// Levels gained (accrual cascade) during the gap.
    pub levels_gained: u32,
}

impl IdleOutcome {
    pub fn merge(&mut self, other: IdleOutcome) {
        self.completed_operations += other.completed_operations;
        self.experience_gained += other.experience_gained;
        self.levels_gained += other.levels_gained;
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A subsystem that can catch up to a resumed clock.
pub trait IdleParticipant {
    /// Stable subsystem name used in events and logs.
    fn name(&self) -> &'static str;

    /// Reconciles this participant against `now_ms`.
    ///
    /// Must be idempotent for a repeated `now_ms`.
    fn reconcile(&mut self, now_ms: u64) -> Result<IdleOutcome, EngineError>;
}

/// Reconciles every participant, isolating per-subsystem failures.
///
/// A failing subsystem never aborts the others; each result is returned to
/// the caller, which decides how to log or surface failures.
pub fn reconcile_all(
    participants: &mut [&mut dyn IdleParticipant],
    now_ms: u64,
) -> Vec<(&'static str, Result<IdleOutcome, EngineError>)> {
    participants
        .iter_mut()
        .map(|participant| (participant.name(), participant.reconcile(now_ms)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counting {
        polls: u32,
        watermark: u64,
    }

    impl IdleParticipant for Counting {
        fn name(&self) -> &'static str {
            "counting"
        }
        fn reconcile(&mut self, now_ms: u64) -> Result<IdleOutcome, EngineError> {
            let mut outcome = IdleOutcome::default();
            if now_ms > self.watermark {
                self.watermark = now_ms;
                self.polls += 1;
                outcome.completed_operations = 1;
            }
            Ok(outcome)
        }
    }

    struct Failing;
    impl IdleParticipant for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }
        fn reconcile(&mut self, _now_ms: u64) -> Result<IdleOutcome, EngineError> {
            Err(EngineError::NotInitialized("failing"))
        }
    }

    #[test]
    fn failures_do_not_abort_other_participants() {
        let mut counting = Counting {
            polls: 0,
            watermark: 0,
        };
        let mut failing = Failing;
        let results = reconcile_all(&mut [&mut failing, &mut counting], 1_000);

        assert!(results[0].1.is_err());
        assert!(results[1].1.is_ok());
        assert_eq!(counting.polls, 1);
    }

    #[test]
    fn replay_at_same_timestamp_is_empty() {
        let mut counting = Counting {
            polls: 0,
            watermark: 0,
        };
        reconcile_all(&mut [&mut counting], 1_000);
        let results = reconcile_all(&mut [&mut counting], 1_000);
        assert!(results[0].1.as_ref().unwrap().is_empty());
    }
}
