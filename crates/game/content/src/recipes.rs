//! Crafting recipe catalog.

use cultivation_core::catalog::{Rarity, RecipeDefinition, RecipeOracle};
use cultivation_core::ledger::{Requirements, ResourceId};

/// Builtin recipe table.
#[derive(Clone, Debug)]
pub struct RecipeCatalog {
    recipes: Vec<RecipeDefinition>,
}

impl RecipeCatalog {
    pub fn new(recipes: Vec<RecipeDefinition>) -> Self {
        Self { recipes }
    }

    pub fn builtin() -> Self {
        Self::new(vec![
            RecipeDefinition {
                id: "meridian_pill".into(),
                rarity: Rarity::Common,
                inputs: Requirements::new()
                    .with(ResourceId::SpiritStones, 40)
                    .with(ResourceId::HerbEssence, 6),
                duration_ms: 45_000,
                output: ResourceId::MeridianPills,
                output_amount: 2,
            },
            RecipeDefinition {
                id: "tempering_pill".into(),
                rarity: Rarity::Uncommon,
                inputs: Requirements::new()
                    .with(ResourceId::SpiritStones, 60)
                    .with(ResourceId::HerbEssence, 8)
                    .with(ResourceId::BeastCores, 2),
                duration_ms: 90_000,
                output: ResourceId::TemperingPills,
                output_amount: 2,
            },
            RecipeDefinition {
                id: "enhancement_stone".into(),
                rarity: Rarity::Uncommon,
                inputs: Requirements::new()
                    .with(ResourceId::SpiritStones, 80)
                    .with(ResourceId::StarIron, 4),
                duration_ms: 120_000,
                output: ResourceId::EnhancementStones,
                output_amount: 3,
            },
            RecipeDefinition {
                id: "qi_crystal".into(),
                rarity: Rarity::Rare,
                inputs: Requirements::new()
                    .with(ResourceId::SpiritStones, 150)
                    .with(ResourceId::HerbEssence, 12),
                duration_ms: 180_000,
                output: ResourceId::QiCrystals,
                output_amount: 1,
            },
            RecipeDefinition {
                id: "soul_fragment".into(),
                rarity: Rarity::Epic,
                inputs: Requirements::new()
                    .with(ResourceId::SpiritStones, 300)
                    .with(ResourceId::BeastCores, 5),
                duration_ms: 300_000,
                output: ResourceId::SoulFragments,
                output_amount: 1,
            },
        ])
    }
}

impl RecipeOracle for RecipeCatalog {
    fn recipe(&self, id: &str) -> Option<&RecipeDefinition> {
        self.recipes.iter().find(|r| r.id == id)
    }

    fn recipes(&self) -> &[RecipeDefinition] {
        &self.recipes
    }
}
