//! Single-slot timed operation scheduler.
//!
//! An operation is purely a pair of recorded timestamps compared against the
//! caller's clock; nothing here waits or schedules callbacks. Completion is
//! pull-based through [`TimedOperationSlot::poll_complete`], which makes live
//! ticking and idle catch-up share one code path and keeps replays no-ops.

use bounded_vector::BoundedVec;

use crate::config::EngineConfig;
use crate::error::Reject;
use crate::ledger::Requirements;

/// The operation families the content subsystems run through a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum OperationKind {
    /// Accessory enhancement.
    Enhance,
    /// Recipe crafting.
    Craft,
    /// Dantian capacity expansion.
    Expand,
    /// Dantian density compression.
    Compress,
    /// Meridian channel or soul star opening.
    Open,
    /// Meridian tempering.
    Temper,
    /// Soul star refinement.
    Refine,
}

/// A resource-consuming, time-delayed action occupying a subsystem slot.
///
/// Requirements are consumed by the caller at `start`, not at completion;
/// they are retained here so cancellation can compute the refund.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Operation {
    pub kind: OperationKind,
    /// Catalog id of the entity being worked on.
    pub target: String,
    pub started_at: u64,
    pub duration_ms: u64,
    pub requirements: Requirements,
}

impl Operation {
    pub fn new(
        kind: OperationKind,
        target: impl Into<String>,
        started_at: u64,
        duration_ms: u64,
        requirements: Requirements,
    ) -> Self {
        Self {
            kind,
            target: target.into(),
            started_at,
            duration_ms,
            requirements,
        }
    }

    pub fn complete_at(&self) -> u64 {
        self.started_at.saturating_add(self.duration_ms)
    }

    pub fn is_complete(&self, now_ms: u64) -> bool {
        now_ms >= self.complete_at()
    }

    /// Remaining milliseconds at `now_ms` (0 once complete).
    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        self.complete_at().saturating_sub(now_ms)
    }
}

/// Per-subsystem scheduler holding at most one active [`Operation`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimedOperationSlot {
    active: Option<Operation>,
}

impl TimedOperationSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.active.is_some()
    }

    pub fn active(&self) -> Option<&Operation> {
        self.active.as_ref()
    }

    /// Records an operation. Rejects with `SlotOccupied` when busy.
    ///
    /// The caller must have checked and consumed the requirements already;
    /// the slot only owns the timing.
    pub fn start(&mut self, operation: Operation) -> Result<(), Reject> {
        if self.active.is_some() {
            return Err(Reject::SlotOccupied);
        }
        self.active = Some(operation);
        Ok(())
    }

    /// Returns the finished operation once `duration` has elapsed.
    ///
    /// Idempotent: the slot clears itself on the first completing poll, so
    /// calling again (including a replayed idle reconciliation) returns
    /// `None` and never re-applies the effect.
    pub fn poll_complete(&mut self, now_ms: u64) -> Option<Operation> {
        if self.active.as_ref()?.is_complete(now_ms) {
            self.active.take()
        } else {
            None
        }
    }

    /// Clears the slot and hands back the operation for refunding.
    ///
    /// Returns `None` when the slot is empty or the operation has already
    /// run to completion at `now_ms`; finished work is only reachable
    /// through [`Self::poll_complete`].
    pub fn cancel(&mut self, now_ms: u64) -> Option<Operation> {
        if self.active.as_ref()?.is_complete(now_ms) {
            return None;
        }
        self.active.take()
    }
}

/// One craft waiting behind the active slot.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PendingCraft {
    pub recipe: String,
    pub duration_ms: u64,
    pub requirements: Requirements,
}

/// Bounded FIFO queue behind the crafting slot.
///
/// Capacity is fixed at [`EngineConfig::CRAFT_QUEUE_CAPACITY`]; enqueueing
/// past the bound rejects with `QueueFull`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CraftQueue {
    entries: BoundedVec<PendingCraft, 0, { EngineConfig::CRAFT_QUEUE_CAPACITY }>,
}

impl CraftQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn enqueue(&mut self, craft: PendingCraft) -> Result<(), Reject> {
        self.entries.push(craft).map_err(|_| Reject::QueueFull)
    }

    /// Removes and returns the oldest pending craft.
    pub fn dequeue(&mut self) -> Option<PendingCraft> {
        let next = self.entries.iter().next().cloned()?;
        let _ = self.entries.remove(0);
        Some(next)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingCraft> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::ResourceId;

    fn operation(started_at: u64, duration_ms: u64) -> Operation {
        Operation::new(
            OperationKind::Enhance,
            "jade_ring",
            started_at,
            duration_ms,
            Requirements::new().with(ResourceId::SpiritStones, 100),
        )
    }

    #[test]
    fn second_start_is_rejected() {
        let mut slot = TimedOperationSlot::new();
        slot.start(operation(0, 1_000)).unwrap();
        let err = slot.start(operation(0, 1_000)).unwrap_err();
        assert_eq!(err, Reject::SlotOccupied);
    }

    #[test]
    fn poll_before_duration_returns_nothing() {
        let mut slot = TimedOperationSlot::new();
        slot.start(operation(1_000, 5_000)).unwrap();
        assert!(slot.poll_complete(5_999).is_none());
        assert!(slot.is_busy());
    }

    #[test]
    fn poll_complete_is_idempotent() {
        let mut slot = TimedOperationSlot::new();
        slot.start(operation(0, 1_000)).unwrap();

        let finished = slot.poll_complete(1_000);
        assert!(finished.is_some());

        // Replaying the same poll is a no-op; the effect is never re-applied.
        assert!(slot.poll_complete(1_000).is_none());
        assert!(slot.poll_complete(10_000).is_none());
    }

    #[test]
    fn cancel_returns_operation_for_refund() {
        let mut slot = TimedOperationSlot::new();
        slot.start(operation(0, 1_000)).unwrap();

        let cancelled = slot.cancel(500).unwrap();
        assert_eq!(
            cancelled.requirements.amount(ResourceId::SpiritStones),
            100
        );
        assert!(!slot.is_busy());
        // Nothing left to cancel.
        assert!(slot.cancel(500).is_none());
    }

    #[test]
    fn cancel_after_completion_is_refused() {
        let mut slot = TimedOperationSlot::new();
        slot.start(operation(0, 1_000)).unwrap();

        // The elapsed operation is finished work, not cancellable.
        assert!(slot.cancel(1_000).is_none());
        assert!(slot.cancel(10_000).is_none());
        assert!(slot.poll_complete(1_000).is_some());
    }

    #[test]
    fn queue_rejects_past_capacity() {
        let mut queue = CraftQueue::new();
        let craft = PendingCraft {
            recipe: "qi_pill".into(),
            duration_ms: 1_000,
            requirements: Requirements::new(),
        };
        for _ in 0..EngineConfig::CRAFT_QUEUE_CAPACITY {
            queue.enqueue(craft.clone()).unwrap();
        }
        assert_eq!(queue.enqueue(craft).unwrap_err(), Reject::QueueFull);
    }

    #[test]
    fn queue_is_fifo() {
        let mut queue = CraftQueue::new();
        for name in ["first", "second"] {
            queue
                .enqueue(PendingCraft {
                    recipe: name.into(),
                    duration_ms: 1_000,
                    requirements: Requirements::new(),
                })
                .unwrap();
        }
        assert_eq!(queue.dequeue().unwrap().recipe, "first");
        assert_eq!(queue.dequeue().unwrap().recipe, "second");
        assert!(queue.dequeue().is_none());
    }
}
