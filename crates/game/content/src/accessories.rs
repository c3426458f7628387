//! Accessory catalog: rings and pendants.

use cultivation_core::catalog::{AccessoryDefinition, AccessoryKind, AccessoryOracle, Rarity};
use cultivation_core::ledger::{CostCurve, ResourceId};
use cultivation_core::power::{PowerProfile, SetBonus, SetBonusTier};

/// Cost and duration curves for accessory enhancement.
///
/// Rarity supplies the category multiplier; these bases match a Common
/// accessory at enhancement level 0: 50 spirit stones, 3 enhancement
/// stones, 5 primary material.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AccessoryTuning {
    pub spirit_cost: CostCurve,
    pub stone_cost: CostCurve,
    pub material_cost: CostCurve,
    /// Enhancement duration in milliseconds by level.
    pub duration: CostCurve,
}

impl Default for AccessoryTuning {
    fn default() -> Self {
        Self {
            spirit_cost: CostCurve::new(50, 1.25),
            stone_cost: CostCurve::new(3, 1.2),
            material_cost: CostCurve::new(5, 1.2),
            duration: CostCurve::new(30_000, 1.15),
        }
    }
}

/// Builtin accessory table plus declared set bonuses.
#[derive(Clone, Debug)]
pub struct AccessoryCatalog {
    accessories: Vec<AccessoryDefinition>,
    sets: Vec<SetBonus>,
}

impl AccessoryCatalog {
    pub fn new(accessories: Vec<AccessoryDefinition>, sets: Vec<SetBonus>) -> Self {
        Self { accessories, sets }
    }

    pub fn builtin() -> Self {
        let accessories = vec![
            accessory(
                "iron_ring",
                AccessoryKind::Ring,
                Rarity::Common,
                ResourceId::StarIron,
                PowerProfile::new(10.0, 2.0, 4.0),
            ),
            accessory(
                "star_iron_ring",
                AccessoryKind::Ring,
                Rarity::Uncommon,
                ResourceId::StarIron,
                PowerProfile::new(18.0, 3.0, 6.0),
            ),
            accessory(
                "jade_ring",
                AccessoryKind::Ring,
                Rarity::Rare,
                ResourceId::JadeEssence,
                PowerProfile::new(30.0, 5.0, 8.0),
            ),
            accessory(
                "azure_jade_pendant",
                AccessoryKind::Pendant,
                Rarity::Rare,
                ResourceId::JadeEssence,
                PowerProfile::new(35.0, 5.5, 9.0),
            ),
            accessory(
                "moonsilver_pendant",
                AccessoryKind::Pendant,
                Rarity::Epic,
                ResourceId::MoonSilver,
                PowerProfile::new(55.0, 8.0, 12.0),
            ),
            accessory(
                "celestial_moon_ring",
                AccessoryKind::Ring,
                Rarity::Legendary,
                ResourceId::MoonSilver,
                PowerProfile::new(90.0, 12.0, 18.0),
            ),
        ];

        let sets = vec![
            SetBonus {
                id: "forged_iron".into(),
                members: vec!["iron_ring".into(), "star_iron_ring".into()],
                min_level: 3,
                tiers: vec![SetBonusTier {
                    min_members: 2,
                    percent: 0.08,
                }],
                completion_percent: 0.05,
            },
            SetBonus {
                id: "moonlit_night".into(),
                members: vec![
                    "moonsilver_pendant".into(),
                    "celestial_moon_ring".into(),
                ],
                min_level: 5,
                tiers: vec![SetBonusTier {
                    min_members: 2,
                    percent: 0.12,
                }],
                completion_percent: 0.10,
            },
        ];

        Self::new(accessories, sets)
    }
}

fn accessory(
    id: &str,
    kind: AccessoryKind,
    rarity: Rarity,
    primary_material: ResourceId,
    profile: PowerProfile,
) -> AccessoryDefinition {
    AccessoryDefinition {
        id: id.into(),
        kind,
        rarity,
        primary_material,
        profile,
    }
}

impl AccessoryOracle for AccessoryCatalog {
    fn accessory(&self, id: &str) -> Option<&AccessoryDefinition> {
        self.accessories.iter().find(|a| a.id == id)
    }

    fn accessories(&self) -> &[AccessoryDefinition] {
        &self.accessories
    }

    fn sets(&self) -> &[SetBonus] {
        &self.sets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_ids_are_unique() {
        let catalog = AccessoryCatalog::builtin();
        let mut ids: Vec<&str> = catalog.accessories().iter().map(|a| a.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), catalog.accessories().len());
    }

    #[test]
    fn lookup_misses_are_none() {
        let catalog = AccessoryCatalog::builtin();
        assert!(catalog.accessory("jade_ring").is_some());
        assert!(catalog.accessory("no_such_ring").is_none());
    }

    #[test]
    fn set_members_exist_in_catalog() {
        let catalog = AccessoryCatalog::builtin();
        for set in catalog.sets() {
            for member in &set.members {
                assert!(
                    catalog.accessory(member).is_some(),
                    "set {} references unknown accessory {member}",
                    set.id
                );
            }
        }
    }
}
