//! Soul constellation catalog.
//!
//! Stars open one at a time and can then be refined; a constellation's
//! completion bonus lands when all of its stars are open.

use cultivation_core::catalog::{ConstellationDefinition, SoulOracle, StarDefinition};
use cultivation_core::ledger::CostCurve;
use cultivation_core::power::{PowerProfile, SetBonus, SetBonusTier};

/// Cost and duration curves for soul star work.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SoulTuning {
    /// Soul fragment cost to open, by star index within its constellation.
    pub open_cost: CostCurve,
    /// Opening duration in milliseconds, by star index.
    pub open_duration: CostCurve,
    /// Soul fragment cost to refine, by refinement level.
    pub refine_cost: CostCurve,
    /// Refinement duration in milliseconds, by refinement level.
    pub refine_duration: CostCurve,
}

impl Default for SoulTuning {
    fn default() -> Self {
        Self {
            open_cost: CostCurve::new(10, 1.25),
            open_duration: CostCurve::new(90_000, 1.25),
            refine_cost: CostCurve::new(6, 1.3),
            refine_duration: CostCurve::new(60_000, 1.2),
        }
    }
}

/// Builtin star and constellation tables.
#[derive(Clone, Debug)]
pub struct SoulCatalog {
    stars: Vec<StarDefinition>,
    constellations: Vec<ConstellationDefinition>,
}

impl SoulCatalog {
    pub fn new(
        stars: Vec<StarDefinition>,
        constellations: Vec<ConstellationDefinition>,
    ) -> Self {
        Self {
            stars,
            constellations,
        }
    }

    pub fn builtin() -> Self {
        let mut stars = Vec::new();
        let mut constellations = Vec::new();

        for (constellation_id, star_names, profile_base) in [
            (
                "azure_dragon",
                ["horn", "neck", "root", "room"].as_slice(),
                15.0,
            ),
            (
                "white_tiger",
                ["legs", "bond", "stomach", "hairy_head", "net"].as_slice(),
                20.0,
            ),
            (
                "vermilion_bird",
                ["well", "ghost", "willow"].as_slice(),
                28.0,
            ),
        ] {
            let mut member_ids = Vec::new();
            for (index, star_name) in star_names.iter().enumerate() {
                let id = format!("{constellation_id}_{star_name}");
                member_ids.push(id.clone());
                stars.push(StarDefinition {
                    id,
                    constellation: constellation_id.into(),
                    index: index as u32,
                    profile: PowerProfile::new(
                        profile_base + index as f64 * 4.0,
                        3.0,
                        5.0,
                    ),
                });
            }
            let member_count = member_ids.len();
            constellations.push(ConstellationDefinition {
                id: constellation_id.into(),
                stars: member_ids.clone(),
                bonus: SetBonus {
                    id: format!("{constellation_id}_complete"),
                    members: member_ids,
                    min_level: 1,
                    tiers: vec![SetBonusTier {
                        min_members: member_count.div_ceil(2),
                        percent: 0.08,
                    }],
                    completion_percent: 0.15,
                },
            });
        }

        Self::new(stars, constellations)
    }
}

impl SoulOracle for SoulCatalog {
    fn star(&self, id: &str) -> Option<&StarDefinition> {
        self.stars.iter().find(|s| s.id == id)
    }

    fn stars(&self) -> &[StarDefinition] {
        &self.stars
    }

    fn constellation(&self, id: &str) -> Option<&ConstellationDefinition> {
        self.constellations.iter().find(|c| c.id == id)
    }

    fn constellations(&self) -> &[ConstellationDefinition] {
        &self.constellations
    }
}
