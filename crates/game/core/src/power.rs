//! Layered power aggregation.
//!
//! Per entity: `power = base + (level-1)×per_level + floor(secondary/10)×secondary_bonus`,
//! optionally scaled by a continuous density multiplier. Subsystem totals
//! floor the sum of all active entities plus set/pattern/formation bonuses.
//!
//! Additive base/level terms keep early growth linear; multiplicative
//! density/purity terms let late-game investment compound.

/// Static power coefficients for one entity family (a catalog property).
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PowerProfile {
    pub base: f64,
    pub per_level: f64,
    /// Bonus granted per full 10 points of the secondary stat
    /// (purity/capacity/density depending on the subsystem).
    pub secondary_bonus: f64,
}

impl PowerProfile {
    pub const fn new(base: f64, per_level: f64, secondary_bonus: f64) -> Self {
        Self {
            base,
            per_level,
            secondary_bonus,
        }
    }
}

/// Power contribution of a single leveled entity.
///
/// `level` is 1-based; a level-1 entity contributes exactly `base` plus its
/// secondary term.
pub fn entity_power(
    profile: &PowerProfile,
    level: u32,
    secondary: u32,
    density_multiplier: Option<f64>,
) -> f64 {
    let level_term = profile.per_level * level.saturating_sub(1) as f64;
    let secondary_term = (secondary / 10) as f64 * profile.secondary_bonus;
    let raw = profile.base + level_term + secondary_term;
    raw * density_multiplier.unwrap_or(1.0)
}

/// One already-rated entity fed into aggregation.
#[derive(Clone, Debug, PartialEq)]
pub struct RatedEntity {
    pub id: String,
    pub power: f64,
    pub level: u32,
}

impl RatedEntity {
    pub fn new(id: impl Into<String>, power: f64, level: u32) -> Self {
        Self {
            id: id.into(),
            power,
            level,
        }
    }
}

/// A count-threshold tier inside a set bonus.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SetBonusTier {
    /// Minimum number of qualifying members for this tier.
    pub min_members: usize,
    /// Flat percentage of the members' summed power (0.10 = +10%).
    pub percent: f64,
}

/// Declared set/pattern/formation bonus over a subset of entities.
///
/// Tier bonuses stack additively as successive count thresholds are
/// crossed; the completion bonus applies only when every member qualifies.
/// Each qualifying bonus applies exactly once.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SetBonus {
    pub id: String,
    /// Entity ids belonging to the set.
    pub members: Vec<String>,
    /// Minimum level a member must reach to count as qualifying.
    pub min_level: u32,
    /// Count thresholds, additive as crossed.
    pub tiers: Vec<SetBonusTier>,
    /// Extra percentage when every member qualifies.
    pub completion_percent: f64,
}

impl SetBonus {
    /// Bonus power contributed by this set given the rated entities.
    fn bonus_power(&self, entities: &[RatedEntity]) -> f64 {
        let qualifying: Vec<&RatedEntity> = entities
            .iter()
            .filter(|entity| {
                self.members.contains(&entity.id) && entity.level >= self.min_level
            })
            .collect();

        if qualifying.is_empty() {
            return 0.0;
        }

        let member_sum: f64 = qualifying.iter().map(|entity| entity.power).sum();

        let mut percent: f64 = self
            .tiers
            .iter()
            .filter(|tier| qualifying.len() >= tier.min_members)
            .map(|tier| tier.percent)
            .sum();

        if qualifying.len() >= self.members.len() && !self.members.is_empty() {
            percent += self.completion_percent;
        }

        member_sum * percent
    }
}

/// Total subsystem power: floor of the entity sum plus all set bonuses.
pub fn aggregate_power(entities: &[RatedEntity], sets: &[SetBonus]) -> u64 {
    let entity_sum: f64 = entities.iter().map(|entity| entity.power).sum();
    let set_sum: f64 = sets.iter().map(|set| set.bonus_power(entities)).sum();
    (entity_sum + set_sum).max(0.0).floor() as u64
}
