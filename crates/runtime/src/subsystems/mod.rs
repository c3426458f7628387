//! Content subsystems.
//!
//! Each subsystem owns its resource pool, its single operation slot, and its
//! entity progress, and publishes to its own event topic. State lives in a
//! serializable snapshot struct so the session can persist and rehydrate each
//! subsystem independently; catalogs and the bus are re-injected on load.

mod accessories;
mod crafting;
mod cultivation;
mod dantian;
mod meridians;
mod soul;

pub use accessories::{Accessories, AccessoryState, OwnedAccessory};
pub use crafting::{CraftOutcome, Crafting, CraftingState};
pub use cultivation::{Cultivation, CultivationState};
pub use dantian::{CenterProgress, Dantian, DantianState};
pub use meridians::{ChannelProgress, MeridianState, Meridians};
pub use soul::{Soul, SoulState, StarProgress};
