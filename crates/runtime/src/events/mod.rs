//! Topic-based event routing for session observers.

mod bus;

pub use bus::{Event, EventBus, Topic};
