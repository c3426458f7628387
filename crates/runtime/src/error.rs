//! Runtime errors.
//!
//! Validation failures stay inside the engine as `Reject` values; what
//! surfaces here are the failures the session itself cannot absorb, chiefly
//! persistence problems.

use crate::store::StoreError;

/// Hard runtime failure.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// State persistence failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
