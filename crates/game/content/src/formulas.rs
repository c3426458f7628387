//! Default balance formulas.
//!
//! Formulas:
//! - experience_required = floor(100 × 1.15^(level-1))
//! - bottleneck: 1.0 through level 30, then stepped soft caps
//! - breakthrough chance: base minus realm penalty, plus the lower of the
//!   two path levels, scaled by technique and resource bonuses
//! - synergy: grows with the lower path level, taxed by imbalance

use cultivation_core::catalog::{BreakthroughInput, FormulaOracle};
use cultivation_core::progress::CultivationPath;

use crate::cultivation::RealmCatalog;

/// Default [`FormulaOracle`] implementation shipped with the content pack.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultFormulas;

impl FormulaOracle for DefaultFormulas {
    fn experience_required(&self, _path: CultivationPath, level: u32) -> u64 {
        (100.0 * 1.15f64.powi(level.saturating_sub(1) as i32)).floor() as u64
    }

    fn bottleneck_multiplier(&self, level: u32) -> f64 {
        match level {
            0..=30 => 1.0,
            31..=60 => 0.75,
            61..=90 => 0.5,
            _ => 0.25,
        }
    }

    fn breakthrough_chance(&self, input: &BreakthroughInput) -> f64 {
        let floor_level = input.qi_level.min(input.body_level) as f64;
        let base = 0.35 + floor_level * 0.004 - input.realm_index as f64 * 0.05;
        base * input.technique_bonus * input.resource_bonus
    }

    fn synergy_bonus(&self, qi_level: u32, body_level: u32) -> f64 {
        let floor_level = qi_level.min(body_level) as f64;
        let imbalance = qi_level.abs_diff(body_level) as f64;
        (1.0 + floor_level * 0.015 - imbalance * 0.002).max(1.0)
    }

    fn requires_breakthrough(&self, level: u32) -> bool {
        level > 0 && level % RealmCatalog::LEVELS_PER_REALM == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn experience_curve_is_strictly_increasing() {
        let formulas = DefaultFormulas;
        let mut previous = 0;
        for level in 1..=80 {
            let required = formulas.experience_required(CultivationPath::Qi, level);
            assert!(required > previous);
            previous = required;
        }
    }

    #[test]
    fn bottleneck_is_monotonically_non_increasing() {
        let formulas = DefaultFormulas;
        let mut previous = f64::INFINITY;
        for level in 0..200 {
            let multiplier = formulas.bottleneck_multiplier(level);
            assert!(multiplier <= previous);
            assert!(multiplier > 0.0);
            previous = multiplier;
        }
    }

    #[test]
    fn realm_gates_fall_every_ten_levels() {
        let formulas = DefaultFormulas;
        assert!(!formulas.requires_breakthrough(1));
        assert!(!formulas.requires_breakthrough(9));
        assert!(formulas.requires_breakthrough(10));
        assert!(formulas.requires_breakthrough(20));
        assert!(!formulas.requires_breakthrough(21));
    }

    #[test]
    fn synergy_never_drops_below_neutral() {
        let formulas = DefaultFormulas;
        assert_eq!(formulas.synergy_bonus(1, 99), 1.0);
        assert!(formulas.synergy_bonus(30, 30) > 1.0);
    }

    #[test]
    fn raw_chance_can_exceed_bounds_but_is_finite() {
        // The engine clamps; the formula just has to stay finite.
        let formulas = DefaultFormulas;
        let chance = formulas.breakthrough_chance(&BreakthroughInput {
            qi_level: 99,
            body_level: 99,
            realm_index: 0,
            technique_bonus: 2.0,
            resource_bonus: 3.0,
        });
        assert!(chance.is_finite());
    }
}
