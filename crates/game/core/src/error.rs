//! Common error infrastructure for cultivation-core.
//!
//! The engine distinguishes two failure families:
//!
//! - [`Reject`]: validation failures (unknown id, insufficient resources,
//!   slot busy, unlock gating). These are returned as structured results
//!   with a reason code so callers can branch on them; they are never
//!   panics and never abort a session.
//! - [`EngineError`]: hard failures (initialization, corrupted invariants)
//!   that propagate, since the session cannot proceed without its state.

use crate::ledger::ResourceId;

/// Severity classification for rejected operations.
///
/// Mirrors how callers are expected to react:
/// - **Retryable**: may succeed later without input changes (slot busy,
///   resources short).
/// - **Validation**: invalid input, should not retry unchanged.
/// - **Internal**: unexpected state, indicates a bug.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RejectSeverity {
    /// May succeed on retry once time passes or resources accrue.
    Retryable,
    /// Invalid input; retrying without changes will fail again.
    Validation,
    /// Unexpected state inconsistency; should be investigated.
    Internal,
}

impl RejectSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Retryable => "retryable",
            Self::Validation => "validation",
            Self::Internal => "internal",
        }
    }
}

/// Structured rejection of a subsystem operation.
///
/// Every variant carries enough context for the UI layer to explain the
/// refusal without string parsing.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Reject {
    /// The feature or target is gated behind an unlock the player lacks.
    #[error("not unlocked: {requirement}")]
    NotUnlocked { requirement: &'static str },

    /// Catalog lookup failed; the id is not in the static data.
    #[error("unknown id: {id}")]
    UnknownId { id: String },

    /// A required resource is short.
    #[error("insufficient {resource}: required {required}, available {available}")]
    InsufficientResources {
        resource: ResourceId,
        required: u64,
        available: u64,
    },

    /// The subsystem's single operation slot is already occupied.
    #[error("operation slot occupied")]
    SlotOccupied,

    /// The crafting queue is at capacity.
    #[error("craft queue full")]
    QueueFull,

    /// The cultivation path is unknown or cannot be targeted by this call.
    #[error("invalid cultivation path")]
    InvalidPath,

    /// The subsystem has not been initialized for this session.
    #[error("subsystem not initialized")]
    NotInitialized,
}

impl Reject {
    /// Static reason code, stable across releases, for event payloads and logs.
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::NotUnlocked { .. } => "not_unlocked",
            Self::UnknownId { .. } => "unknown_id",
            Self::InsufficientResources { .. } => "insufficient_resources",
            Self::SlotOccupied => "slot_occupied",
            Self::QueueFull => "queue_full",
            Self::InvalidPath => "invalid_path",
            Self::NotInitialized => "not_initialized",
        }
    }

    pub const fn severity(&self) -> RejectSeverity {
        match self {
            Self::InsufficientResources { .. } | Self::SlotOccupied | Self::QueueFull => {
                RejectSeverity::Retryable
            }
            Self::NotUnlocked { .. } | Self::UnknownId { .. } | Self::InvalidPath => {
                RejectSeverity::Validation
            }
            Self::NotInitialized => RejectSeverity::Internal,
        }
    }

    pub fn unknown_id(id: impl Into<String>) -> Self {
        Self::UnknownId { id: id.into() }
    }
}

/// Hard failure: the session cannot meaningfully continue.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("subsystem {0} failed to initialize")]
    NotInitialized(&'static str),

    #[error("formula produced a non-finite value in {context}")]
    NonFiniteFormula { context: &'static str },

    #[error("state invariant violated: {0}")]
    InvariantViolated(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_codes_are_stable() {
        assert_eq!(Reject::SlotOccupied.reason(), "slot_occupied");
        assert_eq!(Reject::QueueFull.reason(), "queue_full");
        assert_eq!(Reject::unknown_id("ring_x").reason(), "unknown_id");
    }

    #[test]
    fn severity_classification() {
        assert_eq!(Reject::SlotOccupied.severity(), RejectSeverity::Retryable);
        assert_eq!(
            Reject::InvalidPath.severity(),
            RejectSeverity::Validation
        );
        assert_eq!(
            Reject::NotInitialized.severity(),
            RejectSeverity::Internal
        );
    }
}
