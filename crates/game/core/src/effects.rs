//! Expiring, channel-scoped multiplicative effects.
//!
//! Effects are pruned lazily the first time a lookup runs past their expiry.
//! There is no background sweep: under idle catch-up, replaying elapsed time
//! simply makes expired effects not contribute, with no special-casing.

/// Accrual channel an effect multiplies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Channel {
    Qi,
    Body,
    Dual,
}

/// Per-channel multipliers carried by one effect. Absent channels are 1.0.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelMultipliers {
    pub qi: f64,
    pub body: f64,
    pub dual: f64,
}

impl ChannelMultipliers {
    pub const NEUTRAL: Self = Self {
        qi: 1.0,
        body: 1.0,
        dual: 1.0,
    };

    /// Uniform multiplier across all three channels.
    pub const fn uniform(value: f64) -> Self {
        Self {
            qi: value,
            body: value,
            dual: value,
        }
    }

    pub const fn get(&self, channel: Channel) -> f64 {
        match channel {
            Channel::Qi => self.qi,
            Channel::Body => self.body,
            Channel::Dual => self.dual,
        }
    }
}

impl Default for ChannelMultipliers {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// A time-limited multiplicative effect (pill, technique burst, blessing).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TemporaryEffect {
    pub multipliers: ChannelMultipliers,
    pub started_at: u64,
    pub duration_ms: u64,
}

impl TemporaryEffect {
    pub fn new(multipliers: ChannelMultipliers, started_at: u64, duration_ms: u64) -> Self {
        Self {
            multipliers,
            started_at,
            duration_ms,
        }
    }

    pub fn expired(&self, now_ms: u64) -> bool {
        now_ms >= self.started_at.saturating_add(self.duration_ms)
    }
}

/// Holds active effects and answers combined multipliers per channel.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectRegistry {
    effects: Vec<TemporaryEffect>,
}

impl EffectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, effect: TemporaryEffect) {
        self.effects.push(effect);
    }

    /// Combined multiplier for one channel: the product of every
    /// non-expired effect's multiplier. Lookups prune expired entries.
    pub fn multiplier(&mut self, channel: Channel, now_ms: u64) -> f64 {
        self.prune(now_ms);
        self.effects
            .iter()
            .map(|effect| effect.multipliers.get(channel))
            .product()
    }

    /// Combined multipliers for all channels in one pass.
    pub fn multipliers(&mut self, now_ms: u64) -> ChannelMultipliers {
        self.prune(now_ms);
        self.effects.iter().fold(
            ChannelMultipliers::NEUTRAL,
            |acc, effect| ChannelMultipliers {
                qi: acc.qi * effect.multipliers.qi,
                body: acc.body * effect.multipliers.body,
                dual: acc.dual * effect.multipliers.dual,
            },
        )
    }

    pub fn active_count(&self, now_ms: u64) -> usize {
        self.effects.iter().filter(|e| !e.expired(now_ms)).count()
    }

    fn prune(&mut self, now_ms: u64) {
        self.effects.retain(|effect| !effect.expired(now_ms));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_effects_default_to_neutral() {
        let mut registry = EffectRegistry::new();
        assert_eq!(registry.multiplier(Channel::Qi, 0), 1.0);
    }

    #[test]
    fn multipliers_combine_as_product() {
        let mut registry = EffectRegistry::new();
        registry.insert(TemporaryEffect::new(
            ChannelMultipliers::uniform(2.0),
            0,
            10_000,
        ));
        registry.insert(TemporaryEffect::new(
            ChannelMultipliers {
                qi: 1.5,
                body: 1.0,
                dual: 1.0,
            },
            0,
            10_000,
        ));
        assert_eq!(registry.multiplier(Channel::Qi, 5_000), 3.0);
        assert_eq!(registry.multiplier(Channel::Body, 5_000), 2.0);
    }

    #[test]
    fn expired_effects_are_pruned_lazily() {
        let mut registry = EffectRegistry::new();
        registry.insert(TemporaryEffect::new(
            ChannelMultipliers::uniform(2.0),
            0,
            1_000,
        ));

        // Still active one tick before expiry, gone at the boundary.
        assert_eq!(registry.multiplier(Channel::Qi, 999), 2.0);
        assert_eq!(registry.multiplier(Channel::Qi, 1_000), 1.0);
        assert_eq!(registry.active_count(1_000), 0);
    }

    #[test]
    fn idle_replay_skips_already_expired_effects() {
        let mut registry = EffectRegistry::new();
        registry.insert(TemporaryEffect::new(
            ChannelMultipliers::uniform(3.0),
            0,
            60_000,
        ));

        // Reading far past expiry (idle catch-up) never sees the effect.
        assert_eq!(registry.multiplier(Channel::Dual, 3_600_000), 1.0);
    }
}
