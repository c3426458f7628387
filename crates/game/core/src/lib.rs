//! Deterministic progression logic shared across every idle subsystem.
//!
//! `cultivation-core` defines the generic engine every content subsystem
//! (accessories, crafting, meridians, dantian, soul, cultivation) is a
//! configuration of: a resource ledger with scaling cost curves, a
//! single-slot timed-operation scheduler with idle catch-up, a layered
//! power aggregator, a buffered dual-path experience accumulator, and an
//! expiring multiplicative-effect registry. All APIs are pure over explicit
//! millisecond timestamps; nothing here blocks, sleeps, or touches I/O.
pub mod catalog;
pub mod config;
pub mod effects;
pub mod error;
pub mod ledger;
pub mod power;
pub mod progress;
pub mod quality;
pub mod reconcile;
pub mod rng;
pub mod slot;

pub use catalog::{
    AccessoryDefinition, AccessoryKind, AccessoryOracle, BreakthroughInput, CenterDefinition,
    ChannelDefinition, ConstellationDefinition, DantianOracle, FormulaOracle, MeridianOracle,
    OperationCurves, Rarity, RealmDefinition, RealmOracle, RecipeDefinition, RecipeOracle,
    SoulOracle, StarDefinition, TechniqueDefinition, TechniqueOracle,
};
pub use config::EngineConfig;
pub use effects::{Channel, ChannelMultipliers, EffectRegistry, TemporaryEffect};
pub use error::{EngineError, Reject, RejectSeverity};
pub use ledger::{CostCurve, Requirements, ResourceId, ResourcePool};
pub use power::{PowerProfile, RatedEntity, SetBonus, SetBonusTier, aggregate_power, entity_power};
pub use progress::{
    AccrualReport, BreakthroughAttempt, BreakthroughOptions, CultivationPath, CultivationStats,
    DualUnlockStatus, PathGain, PathState, ProgressAccumulator,
};
pub use quality::{QualityEntry, QualityTable, QualityTier};
pub use reconcile::{IdleOutcome, IdleParticipant, reconcile_all};
pub use rng::{PcgRoller, RollOracle, compute_seed};
pub use slot::{CraftQueue, Operation, OperationKind, PendingCraft, TimedOperationSlot};
