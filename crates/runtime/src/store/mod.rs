//! Session state persistence.
//!
//! The session treats storage as an injected interface: subsystem snapshots
//! are serialized to JSON values and handed to a [`StateStore`] keyed by
//! subsystem name. Writes carry a provenance tag naming the mutation source,
//! which backends log or audit as they see fit.

mod memory;

pub use memory::MemoryStore;

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Error from serializing or deserializing a stored snapshot.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to serialize snapshot {key}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to deserialize snapshot {key}")]
    Deserialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Keyed JSON snapshot storage with merge-writes.
pub trait StateStore: Send + Sync {
    /// Current value for `key`, if any.
    fn get(&self, key: &str) -> Option<serde_json::Value>;

    /// Replaces the value for `key`. `source` names the mutation origin.
    fn set(&self, key: &str, value: serde_json::Value, source: &str);

    /// Merge-writes `patch` over the stored value for `key`.
    ///
    /// Object fields are merged recursively; anything else is replaced.
    fn update(&self, key: &str, patch: serde_json::Value, source: &str);
}

/// Serializes `value` and stores it under `key`.
pub fn save<T: Serialize>(
    store: &dyn StateStore,
    key: &str,
    value: &T,
    source: &str,
) -> Result<(), StoreError> {
    let value = serde_json::to_value(value).map_err(|source| StoreError::Serialize {
        key: key.to_string(),
        source,
    })?;
    store.set(key, value, source);
    Ok(())
}

/// Loads and deserializes the snapshot under `key`, if present.
pub fn load<T: DeserializeOwned>(store: &dyn StateStore, key: &str) -> Result<Option<T>, StoreError> {
    match store.get(key) {
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|source| StoreError::Deserialize {
                key: key.to_string(),
                source,
            }),
        None => Ok(None),
    }
}
