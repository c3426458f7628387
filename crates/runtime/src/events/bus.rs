//! Topic-based event bus.
//!
//! Each subsystem publishes to its own topic so observers subscribe only to
//! what they render or log. Delivery is best-effort broadcast: an event with
//! no subscribers is dropped silently, and a lagging subscriber loses old
//! events rather than blocking publishers.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Event routing topics, one per subsystem plus the session itself.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    Accessories,
    Crafting,
    Meridians,
    Dantian,
    Soul,
    Cultivation,
    Session,
}

impl Topic {
    pub const ALL: [Topic; 7] = [
        Topic::Accessories,
        Topic::Crafting,
        Topic::Meridians,
        Topic::Dantian,
        Topic::Soul,
        Topic::Cultivation,
        Topic::Session,
    ];
}

/// One published occurrence.
///
/// `name` follows the `<subsystem>:<action>` convention and is stable across
/// releases; `payload` carries the structured details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub topic: Topic,
    pub name: String,
    pub at_ms: u64,
    pub payload: serde_json::Value,
}

impl Event {
    pub fn new(
        topic: Topic,
        name: impl Into<String>,
        at_ms: u64,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            topic,
            name: name.into(),
            at_ms,
            payload,
        }
    }
}

/// Topic-based broadcast bus.
///
/// Channels are created once per topic at construction; cloning the bus
/// shares the same channels.
pub struct EventBus {
    channels: Arc<HashMap<Topic, broadcast::Sender<Event>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let channels = Topic::ALL
            .iter()
            .map(|&topic| (topic, broadcast::channel(capacity).0))
            .collect();
        Self {
            channels: Arc::new(channels),
        }
    }

    /// Publishes an event to its topic. Best-effort: no subscribers is
    /// normal, not an error.
    pub fn publish(&self, event: Event) {
        if let Some(tx) = self.channels.get(&event.topic)
            && tx.send(event).is_err()
        {
            tracing::trace!("no subscribers for topic");
        }
    }

    /// Subscribes to one topic.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.channels
            .get(&topic)
            .expect("topic channels are pre-created")
            .subscribe()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            channels: Arc::clone(&self.channels),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
