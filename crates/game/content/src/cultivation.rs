//! Cultivation realms and techniques.

use cultivation_core::catalog::{
    RealmDefinition, RealmOracle, TechniqueDefinition, TechniqueOracle,
};
use cultivation_core::effects::ChannelMultipliers;
use cultivation_core::ledger::{Requirements, ResourceId};
use cultivation_core::progress::CultivationPath;

/// Builtin realm ladder. Each realm spans ten levels; its last level is the
/// gate [`crate::DefaultFormulas`] marks as requiring a breakthrough.
#[derive(Clone, Debug)]
pub struct RealmCatalog {
    realms: Vec<RealmDefinition>,
}

impl RealmCatalog {
    pub const LEVELS_PER_REALM: u32 = 10;

    pub fn new(realms: Vec<RealmDefinition>) -> Self {
        Self { realms }
    }

    pub fn builtin() -> Self {
        let names = [
            "qi_condensation",
            "foundation_establishment",
            "core_formation",
            "nascent_soul",
            "spirit_severing",
            "dao_seeking",
        ];
        let realms = names
            .iter()
            .enumerate()
            .map(|(index, name)| RealmDefinition {
                id: (*name).into(),
                index: index as u32,
                levels: Self::LEVELS_PER_REALM,
                attempt_cost: Requirements::new()
                    .with(ResourceId::SpiritStones, 100 * (index as u64 + 1).pow(2)),
            })
            .collect();
        Self::new(realms)
    }
}

impl RealmOracle for RealmCatalog {
    fn realm_for_level(&self, level: u32) -> Option<&RealmDefinition> {
        let index = level.saturating_sub(1) / Self::LEVELS_PER_REALM;
        self.realms.get(index as usize)
    }

    fn realms(&self) -> &[RealmDefinition] {
        &self.realms
    }
}

/// Builtin technique table.
#[derive(Clone, Debug)]
pub struct TechniqueCatalog {
    techniques: Vec<TechniqueDefinition>,
}

impl TechniqueCatalog {
    pub fn new(techniques: Vec<TechniqueDefinition>) -> Self {
        Self { techniques }
    }

    pub fn builtin() -> Self {
        Self::new(vec![
            TechniqueDefinition {
                id: "azure_qi_scripture".into(),
                path: CultivationPath::Qi,
                min_level: 1,
                multipliers: ChannelMultipliers {
                    qi: 1.2,
                    body: 1.0,
                    dual: 1.0,
                },
            },
            TechniqueDefinition {
                id: "iron_body_manual".into(),
                path: CultivationPath::Body,
                min_level: 1,
                multipliers: ChannelMultipliers {
                    qi: 1.0,
                    body: 1.2,
                    dual: 1.0,
                },
            },
            TechniqueDefinition {
                id: "heavenly_tempering_art".into(),
                path: CultivationPath::Body,
                min_level: 15,
                multipliers: ChannelMultipliers {
                    qi: 1.0,
                    body: 1.45,
                    dual: 1.0,
                },
            },
            TechniqueDefinition {
                id: "yin_yang_harmony".into(),
                path: CultivationPath::Dual,
                min_level: 25,
                multipliers: ChannelMultipliers {
                    qi: 1.1,
                    body: 1.1,
                    dual: 1.3,
                },
            },
        ])
    }
}

impl TechniqueOracle for TechniqueCatalog {
    fn technique(&self, id: &str) -> Option<&TechniqueDefinition> {
        self.techniques.iter().find(|t| t.id == id)
    }

    fn techniques(&self) -> &[TechniqueDefinition] {
        &self.techniques
    }
}
