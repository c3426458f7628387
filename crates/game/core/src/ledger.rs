//! Resource ledger: pools, scaling requirement curves, refunds.
//!
//! Every paid operation follows the same discipline: compute requirements
//! from a [`CostCurve`], `check` them against the pool, `consume` on
//! acceptance. Refund and recovery paths are credits and intentionally skip
//! the check (adding back can never violate the non-negative invariant).

use std::collections::HashMap;

use crate::error::Reject;

/// Enum naming every resource the content subsystems spend or earn.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumIter,
    strum::EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ResourceId {
    /// Universal currency.
    SpiritStones,
    /// Accessory enhancement catalyst.
    EnhancementStones,
    /// Condensed qi, spent on dantian work.
    QiCrystals,
    /// Primary material for metal accessories.
    StarIron,
    /// Primary material for jade accessories.
    JadeEssence,
    /// Primary material for silver accessories.
    MoonSilver,
    /// Meridian opening and tempering consumable.
    MeridianPills,
    /// Body-path tempering consumable.
    TemperingPills,
    /// Soul star ignition fuel.
    SoulFragments,
    /// Crafting reagent dropped by beasts.
    BeastCores,
    /// Crafting reagent refined from herbs.
    HerbEssence,
}

/// A set of resource -> amount pairs required (or returned) by an operation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Requirements {
    entries: Vec<(ResourceId, u64)>,
}

impl Requirements {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry (builder pattern). Zero amounts are dropped.
    #[must_use]
    pub fn with(mut self, resource: ResourceId, amount: u64) -> Self {
        if amount > 0 {
            self.entries.push((resource, amount));
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (ResourceId, u64)> + '_ {
        self.entries.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Amount required for a specific resource (0 when absent).
    pub fn amount(&self, resource: ResourceId) -> u64 {
        self.entries
            .iter()
            .find(|(id, _)| *id == resource)
            .map(|(_, amount)| *amount)
            .unwrap_or(0)
    }

    /// Scales every amount by `rate`, flooring each to an integer.
    ///
    /// Used for cancellation refunds and failure recovery.
    #[must_use]
    pub fn scaled(&self, rate: f64) -> Self {
        let entries = self
            .entries
            .iter()
            .map(|(id, amount)| (*id, (*amount as f64 * rate).floor() as u64))
            .filter(|(_, amount)| *amount > 0)
            .collect();
        Self { entries }
    }
}

impl FromIterator<(ResourceId, u64)> for Requirements {
    fn from_iter<T: IntoIterator<Item = (ResourceId, u64)>>(iter: T) -> Self {
        let entries = iter.into_iter().filter(|(_, amount)| *amount > 0).collect();
        Self { entries }
    }
}

/// Exponential requirement curve: `floor(base × category × growth^level)`.
///
/// Growth bases are per-operation-kind configuration (1.15–1.5 across the
/// subsystems); the category multiplier reflects rarity or tier (1.0–4.0).
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CostCurve {
    pub base: u64,
    pub growth: f64,
}

impl CostCurve {
    pub const fn new(base: u64, growth: f64) -> Self {
        Self { base, growth }
    }

    /// Requirement amount at `level` with the given category multiplier.
    pub fn amount(&self, level: u32, category_multiplier: f64) -> u64 {
        (self.base as f64 * category_multiplier * self.growth.powi(level as i32)).floor() as u64
    }
}

/// Non-negative quantities per resource, owned by exactly one subsystem.
///
/// # Invariants
///
/// - No operation drives a quantity below zero; [`ResourcePool::consume`]
///   checks before debiting and fails atomically.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResourcePool {
    amounts: HashMap<ResourceId, u64>,
}

impl ResourcePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current quantity for a resource (0 when absent).
    pub fn amount(&self, resource: ResourceId) -> u64 {
        self.amounts.get(&resource).copied().unwrap_or(0)
    }

    /// Adds `amount` to a single resource.
    pub fn grant(&mut self, resource: ResourceId, amount: u64) {
        if amount > 0 {
            *self.amounts.entry(resource).or_insert(0) += amount;
        }
    }

    /// True when every required amount is available.
    pub fn check(&self, requirements: &Requirements) -> bool {
        requirements
            .iter()
            .all(|(resource, required)| self.amount(resource) >= required)
    }

    /// Debits the requirements atomically.
    ///
    /// Checks first; on any shortfall nothing is debited and the first
    /// shortfall is reported.
    pub fn consume(&mut self, requirements: &Requirements) -> Result<(), Reject> {
        for (resource, required) in requirements.iter() {
            let available = self.amount(resource);
            if available < required {
                return Err(Reject::InsufficientResources {
                    resource,
                    required,
                    available,
                });
            }
        }
        for (resource, required) in requirements.iter() {
            *self.amounts.entry(resource).or_insert(0) -= required;
        }
        Ok(())
    }

    /// Credits requirements back in full. Credits never require a check.
    pub fn credit(&mut self, requirements: &Requirements) {
        for (resource, amount) in requirements.iter() {
            self.grant(resource, amount);
        }
    }

    /// Credits back `floor(amount × rate)` per resource; used on cancellation.
    pub fn refund(&mut self, requirements: &Requirements, rate: f64) {
        self.credit(&requirements.scaled(rate));
    }

    /// Credits back `floor(amount × rate)` per resource; used after a failed
    /// probabilistic roll.
    pub fn recover(&mut self, requirements: &Requirements, rate: f64) {
        self.credit(&requirements.scaled(rate));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(entries: &[(ResourceId, u64)]) -> ResourcePool {
        let mut pool = ResourcePool::new();
        for (resource, amount) in entries {
            pool.grant(*resource, *amount);
        }
        pool
    }

    #[test]
    fn consume_debits_after_check() {
        let mut pool = pool(&[
            (ResourceId::SpiritStones, 1000),
            (ResourceId::EnhancementStones, 100),
        ]);
        let requirements = Requirements::new()
            .with(ResourceId::SpiritStones, 50)
            .with(ResourceId::EnhancementStones, 3);

        assert!(pool.check(&requirements));
        pool.consume(&requirements).unwrap();
        assert_eq!(pool.amount(ResourceId::SpiritStones), 950);
        assert_eq!(pool.amount(ResourceId::EnhancementStones), 97);
    }

    #[test]
    fn consume_is_atomic_on_shortfall() {
        let mut pool = pool(&[(ResourceId::SpiritStones, 100)]);
        let requirements = Requirements::new()
            .with(ResourceId::SpiritStones, 50)
            .with(ResourceId::BeastCores, 1);

        let err = pool.consume(&requirements).unwrap_err();
        assert_eq!(err.reason(), "insufficient_resources");
        // First entry must not have been debited.
        assert_eq!(pool.amount(ResourceId::SpiritStones), 100);
    }

    #[test]
    fn refund_floors_per_resource() {
        let mut pool = ResourcePool::new();
        let requirements = Requirements::new().with(ResourceId::SpiritStones, 100);
        pool.refund(&requirements, 0.75);
        assert_eq!(pool.amount(ResourceId::SpiritStones), 75);

        let odd = Requirements::new().with(ResourceId::BeastCores, 3);
        pool.recover(&odd, 0.25);
        // floor(3 × 0.25) = 0: nothing comes back
        assert_eq!(pool.amount(ResourceId::BeastCores), 0);
    }

    #[test]
    fn cost_curve_floors_to_integers() {
        let curve = CostCurve::new(50, 1.2);
        assert_eq!(curve.amount(0, 1.0), 50);
        assert_eq!(curve.amount(1, 1.0), 60);
        assert_eq!(curve.amount(2, 1.5), 108); // floor(50 × 1.5 × 1.44)
    }

    #[test]
    fn quantities_never_go_negative() {
        let mut pool = pool(&[(ResourceId::QiCrystals, 5)]);
        let requirements = Requirements::new().with(ResourceId::QiCrystals, 6);
        assert!(pool.consume(&requirements).is_err());
        assert_eq!(pool.amount(ResourceId::QiCrystals), 5);
    }
}
