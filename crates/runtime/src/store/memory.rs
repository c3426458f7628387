//! In-memory state store.

use std::collections::HashMap;
use std::sync::RwLock;

use super::StateStore;

/// [`StateStore`] backed by a process-local map. The default backend for
/// tests and embedders that persist elsewhere.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, serde_json::Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.read().map(|values| values.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Recursively merges `patch` into `target`. Non-object values replace.
fn merge(target: &mut serde_json::Value, patch: serde_json::Value) {
    match (target, patch) {
        (serde_json::Value::Object(target), serde_json::Value::Object(patch)) => {
            for (key, value) in patch {
                match target.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (target, patch) => *target = patch,
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.values.read().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: serde_json::Value, source: &str) {
        tracing::debug!(key, source, "store set");
        if let Ok(mut values) = self.values.write() {
            values.insert(key.to_string(), value);
        }
    }

    fn update(&self, key: &str, patch: serde_json::Value, source: &str) {
        tracing::debug!(key, source, "store update");
        if let Ok(mut values) = self.values.write() {
            match values.get_mut(key) {
                Some(existing) => merge(existing, patch),
                None => {
                    values.insert(key.to_string(), patch);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_then_get_round_trips() {
        let store = MemoryStore::new();
        store.set("accessories", json!({"level": 3}), "test");
        assert_eq!(store.get("accessories"), Some(json!({"level": 3})));
        assert!(store.get("missing").is_none());
    }

    #[test]
    fn update_merges_objects_recursively() {
        let store = MemoryStore::new();
        store.set(
            "session",
            json!({"pool": {"spirit_stones": 100}, "level": 1}),
            "test",
        );
        store.update(
            "session",
            json!({"pool": {"qi_crystals": 5}, "level": 2}),
            "test",
        );
        assert_eq!(
            store.get("session"),
            Some(json!({
                "pool": {"spirit_stones": 100, "qi_crystals": 5},
                "level": 2
            }))
        );
    }

    #[test]
    fn update_on_missing_key_inserts() {
        let store = MemoryStore::new();
        store.update("fresh", json!({"a": 1}), "test");
        assert_eq!(store.get("fresh"), Some(json!({"a": 1})));
    }
}
