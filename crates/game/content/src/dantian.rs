//! Dantian center catalog.
//!
//! Three energy centers. Expansion raises capacity; compression raises the
//! density multiplier that scales the center's power continuously.

use cultivation_core::catalog::{CenterDefinition, DantianOracle};
use cultivation_core::ledger::CostCurve;
use cultivation_core::power::PowerProfile;

/// Cost and duration curves for dantian work.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DantianTuning {
    /// Qi crystal cost to expand, by expansion level.
    pub expand_cost: CostCurve,
    /// Expansion duration in milliseconds, by expansion level.
    pub expand_duration: CostCurve,
    /// Qi crystal cost to compress, by compression level.
    pub compress_cost: CostCurve,
    /// Compression duration in milliseconds, by compression level.
    pub compress_duration: CostCurve,
    /// Capacity gained per expansion.
    pub capacity_per_expansion: u32,
    /// Density multiplier gained per compression (added to 1.0).
    pub density_per_compression: f64,
}

impl Default for DantianTuning {
    fn default() -> Self {
        Self {
            expand_cost: CostCurve::new(5, 1.5),
            expand_duration: CostCurve::new(120_000, 1.35),
            compress_cost: CostCurve::new(8, 1.5),
            compress_duration: CostCurve::new(180_000, 1.4),
            capacity_per_expansion: 50,
            density_per_compression: 0.05,
        }
    }
}

/// Builtin center table.
#[derive(Clone, Debug)]
pub struct DantianCatalog {
    centers: Vec<CenterDefinition>,
}

impl DantianCatalog {
    pub fn new(centers: Vec<CenterDefinition>) -> Self {
        Self { centers }
    }

    pub fn builtin() -> Self {
        Self::new(vec![
            CenterDefinition {
                id: "lower_dantian".into(),
                index: 0,
                profile: PowerProfile::new(20.0, 4.0, 6.0),
                base_capacity: 100,
            },
            CenterDefinition {
                id: "middle_dantian".into(),
                index: 1,
                profile: PowerProfile::new(35.0, 6.0, 9.0),
                base_capacity: 150,
            },
            CenterDefinition {
                id: "upper_dantian".into(),
                index: 2,
                profile: PowerProfile::new(55.0, 9.0, 14.0),
                base_capacity: 200,
            },
        ])
    }
}

impl DantianOracle for DantianCatalog {
    fn center(&self, id: &str) -> Option<&CenterDefinition> {
        self.centers.iter().find(|c| c.id == id)
    }

    fn centers(&self) -> &[CenterDefinition] {
        &self.centers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_centers_with_growing_capacity() {
        let catalog = DantianCatalog::builtin();
        assert_eq!(catalog.centers().len(), 3);
        assert!(catalog.center("lower_dantian").is_some());
        let capacities: Vec<u32> = catalog.centers().iter().map(|c| c.base_capacity).collect();
        assert!(capacities.windows(2).all(|w| w[0] < w[1]));
    }
}
