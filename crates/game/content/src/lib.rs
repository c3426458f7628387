//! Static content catalogs and balance formulas.
//!
//! This crate houses the data every subsystem configures the engine with:
//! - Accessory catalog (rings/pendants) and set bonuses
//! - Crafting recipes
//! - Meridian channels and circulation patterns
//! - Dantian centers
//! - Soul constellations and stars
//! - Cultivation realms and techniques
//! - Default balance formulas (`DefaultFormulas`)
//!
//! Content is consumed through the oracle traits in `cultivation-core` and
//! never appears in mutable game state. Builtin tables ship in code; the
//! `loaders` feature adds RON file loading on top.

pub mod accessories;
pub mod cultivation;
pub mod dantian;
pub mod formulas;
pub mod meridians;
pub mod recipes;
pub mod soul;

#[cfg(feature = "loaders")]
pub mod loaders;

pub use accessories::{AccessoryCatalog, AccessoryTuning};
pub use cultivation::{RealmCatalog, TechniqueCatalog};
pub use dantian::{DantianCatalog, DantianTuning};
pub use formulas::DefaultFormulas;
pub use meridians::{MeridianCatalog, MeridianTuning};
pub use recipes::RecipeCatalog;
pub use soul::{SoulCatalog, SoulTuning};

#[cfg(feature = "loaders")]
pub use loaders::{AccessoryLoader, RecipeLoader};
