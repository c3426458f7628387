//! Meridian channel catalog and circulation patterns.
//!
//! Twelve channels in the traditional opening order. Opening cost scales
//! with the channel's index through the tuning curves; tempering scales
//! with the channel's temper level.

use cultivation_core::catalog::{ChannelDefinition, MeridianOracle};
use cultivation_core::ledger::CostCurve;
use cultivation_core::power::{PowerProfile, SetBonus, SetBonusTier};

/// Cost and duration curves for meridian work.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeridianTuning {
    /// Spirit stone cost to open, by channel index.
    pub open_spirit_cost: CostCurve,
    /// Meridian pill cost to open, by channel index.
    pub open_pill_cost: CostCurve,
    /// Opening duration in milliseconds, by channel index.
    pub open_duration: CostCurve,
    /// Spirit stone cost to temper, by temper level.
    pub temper_spirit_cost: CostCurve,
    /// Tempering pill cost to temper, by temper level.
    pub temper_pill_cost: CostCurve,
    /// Tempering duration in milliseconds, by temper level.
    pub temper_duration: CostCurve,
}

impl Default for MeridianTuning {
    fn default() -> Self {
        Self {
            open_spirit_cost: CostCurve::new(100, 1.35),
            open_pill_cost: CostCurve::new(2, 1.3),
            open_duration: CostCurve::new(60_000, 1.3),
            temper_spirit_cost: CostCurve::new(80, 1.25),
            temper_pill_cost: CostCurve::new(1, 1.2),
            temper_duration: CostCurve::new(45_000, 1.2),
        }
    }
}

const CHANNEL_NAMES: [&str; 12] = [
    "hand_taiyin_lung",
    "hand_yangming_large_intestine",
    "foot_yangming_stomach",
    "foot_taiyin_spleen",
    "hand_shaoyin_heart",
    "hand_taiyang_small_intestine",
    "foot_taiyang_bladder",
    "foot_shaoyin_kidney",
    "hand_jueyin_pericardium",
    "hand_shaoyang_triple_burner",
    "foot_shaoyang_gallbladder",
    "foot_jueyin_liver",
];

/// Builtin channel table and circulation patterns.
#[derive(Clone, Debug)]
pub struct MeridianCatalog {
    channels: Vec<ChannelDefinition>,
    patterns: Vec<SetBonus>,
}

impl MeridianCatalog {
    pub fn new(channels: Vec<ChannelDefinition>, patterns: Vec<SetBonus>) -> Self {
        Self { channels, patterns }
    }

    pub fn builtin() -> Self {
        let channels = CHANNEL_NAMES
            .iter()
            .enumerate()
            .map(|(index, name)| ChannelDefinition {
                id: (*name).into(),
                index: index as u32,
                // Later channels are stronger but cost more to open.
                profile: PowerProfile::new(
                    12.0 + index as f64 * 3.0,
                    2.5 + index as f64 * 0.5,
                    5.0,
                ),
            })
            .collect::<Vec<_>>();

        let all_ids: Vec<String> = channels.iter().map(|c| c.id.clone()).collect();
        let patterns = vec![
            SetBonus {
                id: "lesser_circulation".into(),
                members: all_ids[..4].to_vec(),
                min_level: 1,
                tiers: vec![
                    SetBonusTier {
                        min_members: 2,
                        percent: 0.05,
                    },
                    SetBonusTier {
                        min_members: 4,
                        percent: 0.10,
                    },
                ],
                completion_percent: 0.05,
            },
            SetBonus {
                id: "grand_circulation".into(),
                members: all_ids,
                min_level: 1,
                tiers: vec![
                    SetBonusTier {
                        min_members: 6,
                        percent: 0.10,
                    },
                    SetBonusTier {
                        min_members: 9,
                        percent: 0.10,
                    },
                ],
                completion_percent: 0.25,
            },
        ];

        Self::new(channels, patterns)
    }
}

impl MeridianOracle for MeridianCatalog {
    fn channel(&self, id: &str) -> Option<&ChannelDefinition> {
        self.channels.iter().find(|c| c.id == id)
    }

    fn channels(&self) -> &[ChannelDefinition] {
        &self.channels
    }

    fn patterns(&self) -> &[SetBonus] {
        &self.patterns
    }
}
