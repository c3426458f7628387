//! Runtime orchestration for the idle cultivation engine.
//!
//! This crate wires the deterministic engine core and the content catalogs
//! into a playable session: a clock abstraction, pluggable state storage,
//! a topic-based event bus, and the six content subsystems driven by
//! [`Session`].
//!
//! Modules are organized by responsibility:
//! - [`session`] hosts the orchestrator and its builder
//! - [`subsystems`] owns per-domain pools, slots, and progress
//! - [`events`] provides topic-based event routing for observers
//! - [`store`] and [`clock`] are the injected environment seams

pub mod clock;
pub mod error;
pub mod events;
pub mod session;
pub mod store;
pub mod subsystems;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Result, RuntimeError};
pub use events::{Event, EventBus, Topic};
pub use session::{Session, SessionBuilder};
pub use store::{MemoryStore, StateStore, StoreError};
pub use subsystems::{
    Accessories, AccessoryState, CenterProgress, ChannelProgress, CraftOutcome, Crafting,
    CraftingState, Cultivation, CultivationState, Dantian, DantianState, MeridianState, Meridians,
    OwnedAccessory, Soul, SoulState, StarProgress,
};
