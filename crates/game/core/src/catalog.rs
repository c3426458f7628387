//! Traits describing read-only catalog data.
//!
//! Catalog oracles expose the static item/recipe/channel/star tables and the
//! balance formulas. The engine accesses everything through these traits so
//! subsystems never hard-couple to concrete data; absence of an id is a
//! recoverable "unknown id" condition, never a crash.

use crate::effects::ChannelMultipliers;
use crate::ledger::{CostCurve, Requirements, ResourceId};
use crate::power::{PowerProfile, SetBonus};
use crate::progress::CultivationPath;

/// Rarity tier of a catalog item, carrying its cost category multiplier.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display, strum::EnumIter,
)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    /// Category multiplier applied to cost curves (1.0–4.0).
    pub const fn cost_multiplier(&self) -> f64 {
        match self {
            Self::Common => 1.0,
            Self::Uncommon => 1.5,
            Self::Rare => 2.0,
            Self::Epic => 3.0,
            Self::Legendary => 4.0,
        }
    }
}

/// Accessory slot family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AccessoryKind {
    Ring,
    Pendant,
}

/// Static definition of one accessory.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AccessoryDefinition {
    pub id: String,
    pub kind: AccessoryKind,
    pub rarity: Rarity,
    /// Material consumed alongside stones when enhancing.
    pub primary_material: ResourceId,
    pub profile: PowerProfile,
}

pub trait AccessoryOracle: Send + Sync {
    fn accessory(&self, id: &str) -> Option<&AccessoryDefinition>;
    fn accessories(&self) -> &[AccessoryDefinition];
    /// Declared set bonuses over accessory ids.
    fn sets(&self) -> &[SetBonus];
}

/// Static definition of one crafting recipe.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RecipeDefinition {
    pub id: String,
    pub rarity: Rarity,
    pub inputs: Requirements,
    pub duration_ms: u64,
    /// Resource produced on completion (quality multiplies the amount).
    pub output: ResourceId,
    pub output_amount: u64,
}

pub trait RecipeOracle: Send + Sync {
    fn recipe(&self, id: &str) -> Option<&RecipeDefinition>;
    fn recipes(&self) -> &[RecipeDefinition];
}

/// Static definition of one meridian channel.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelDefinition {
    pub id: String,
    /// Opening order; later channels cost more through the open curve.
    pub index: u32,
    pub profile: PowerProfile,
}

pub trait MeridianOracle: Send + Sync {
    fn channel(&self, id: &str) -> Option<&ChannelDefinition>;
    fn channels(&self) -> &[ChannelDefinition];
    /// Pattern (formation) bonuses over channel ids.
    fn patterns(&self) -> &[SetBonus];
}

/// Static definition of one dantian center.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CenterDefinition {
    pub id: String,
    pub index: u32,
    pub profile: PowerProfile,
    /// Starting qi capacity before any expansion.
    pub base_capacity: u32,
}

pub trait DantianOracle: Send + Sync {
    fn center(&self, id: &str) -> Option<&CenterDefinition>;
    fn centers(&self) -> &[CenterDefinition];
}

/// Static definition of one soul star.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StarDefinition {
    pub id: String,
    pub constellation: String,
    pub index: u32,
    pub profile: PowerProfile,
}

/// A constellation: a named star set with a completion bonus.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConstellationDefinition {
    pub id: String,
    pub stars: Vec<String>,
    pub bonus: SetBonus,
}

pub trait SoulOracle: Send + Sync {
    fn star(&self, id: &str) -> Option<&StarDefinition>;
    fn stars(&self) -> &[StarDefinition];
    fn constellation(&self, id: &str) -> Option<&ConstellationDefinition>;
    fn constellations(&self) -> &[ConstellationDefinition];
}

/// Static definition of one cultivation realm.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RealmDefinition {
    pub id: String,
    pub index: u32,
    /// Levels spanned by this realm; its last level gates on a breakthrough.
    pub levels: u32,
    /// Breakthrough cost paid per attempt at this realm's gate.
    pub attempt_cost: Requirements,
}

pub trait RealmOracle: Send + Sync {
    fn realm_for_level(&self, level: u32) -> Option<&RealmDefinition>;
    fn realms(&self) -> &[RealmDefinition];
}

/// Static definition of one cultivation technique.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TechniqueDefinition {
    pub id: String,
    /// Path the technique can drive.
    pub path: CultivationPath,
    /// Level on that path required before the technique activates.
    pub min_level: u32,
    pub multipliers: ChannelMultipliers,
}

pub trait TechniqueOracle: Send + Sync {
    fn technique(&self, id: &str) -> Option<&TechniqueDefinition>;
    fn techniques(&self) -> &[TechniqueDefinition];
}

/// Inputs the breakthrough chance formula sees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BreakthroughInput {
    pub qi_level: u32,
    pub body_level: u32,
    pub realm_index: u32,
    /// Multiplier contributed by the active technique (1.0 when none).
    pub technique_bonus: f64,
    /// Multiplier contributed by spendable resources (1.0 when none).
    pub resource_bonus: f64,
}

/// Balance formulas supplied by the content layer.
///
/// The engine treats these as opaque: it clamps chance outputs to [0, 1]
/// and requires `bottleneck_multiplier` to be monotonically non-increasing
/// in level (diminishing returns at soft caps).
pub trait FormulaOracle: Send + Sync {
    /// Experience needed to advance off `level` on `path`.
    fn experience_required(&self, path: CultivationPath, level: u32) -> u64;

    /// Accrual multiplier at `level`; non-increasing in `level`.
    fn bottleneck_multiplier(&self, level: u32) -> f64;

    /// Raw breakthrough chance; the engine clamps to [0, 1].
    fn breakthrough_chance(&self, input: &BreakthroughInput) -> f64;

    /// Dual-path synergy multiplier derived from both path levels.
    fn synergy_bonus(&self, qi_level: u32, body_level: u32) -> f64;

    /// True when `level` is a realm gate that requires a breakthrough
    /// instead of an automatic level-up.
    fn requires_breakthrough(&self, level: u32) -> bool;
}

/// Cost curves for one operation kind, paired with its duration curve.
///
/// Growth bases intentionally differ per kind (1.15–1.5 across subsystems);
/// they are configuration, not a single unified formula.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OperationCurves {
    pub cost: CostCurve,
    /// Duration in milliseconds at the given level.
    pub duration: CostCurve,
}

impl OperationCurves {
    pub const fn new(cost: CostCurve, duration: CostCurve) -> Self {
        Self { cost, duration }
    }

    pub fn duration_ms(&self, level: u32, category_multiplier: f64) -> u64 {
        self.duration.amount(level, category_multiplier)
    }
}
