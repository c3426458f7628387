//! Craft quality tiers.
//!
//! A quality table is an ordered list of `(threshold, tier, multiplier)`
//! entries walked from highest threshold to lowest; the first entry whose
//! threshold the roll strictly exceeds wins. Strict greater-than against
//! descending thresholds is load-bearing: a roll exactly on a threshold
//! falls through to the tier below.

/// Ordered quality outcome of a craft roll.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display, strum::EnumIter,
)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum QualityTier {
    Crude,
    Common,
    Refined,
    Pristine,
    Immortal,
}

/// One row of a quality table.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QualityEntry {
    /// The roll must strictly exceed this to land in the tier.
    pub threshold: f64,
    pub tier: QualityTier,
    /// Output multiplier applied to the crafted item's stats.
    pub multiplier: f64,
}

/// Roll-to-tier mapping with descending thresholds.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QualityTable {
    entries: Vec<QualityEntry>,
}

impl QualityTable {
    /// Builds a table from entries, sorting by descending threshold.
    pub fn new(mut entries: Vec<QualityEntry>) -> Self {
        entries.sort_by(|a, b| b.threshold.total_cmp(&a.threshold));
        Self { entries }
    }

    /// Standard five-tier table used by crafting.
    pub fn standard() -> Self {
        Self::new(vec![
            QualityEntry {
                threshold: 0.98,
                tier: QualityTier::Immortal,
                multiplier: 2.0,
            },
            QualityEntry {
                threshold: 0.90,
                tier: QualityTier::Pristine,
                multiplier: 1.5,
            },
            QualityEntry {
                threshold: 0.65,
                tier: QualityTier::Refined,
                multiplier: 1.2,
            },
            QualityEntry {
                threshold: 0.25,
                tier: QualityTier::Common,
                multiplier: 1.0,
            },
            QualityEntry {
                threshold: -1.0,
                tier: QualityTier::Crude,
                multiplier: 0.8,
            },
        ])
    }

    /// Selects the first entry whose threshold the roll strictly exceeds.
    pub fn select(&self, roll: f64) -> QualityEntry {
        self.entries
            .iter()
            .find(|entry| roll > entry.threshold)
            .copied()
            .unwrap_or_else(|| {
                // Tables always carry a catch-all lowest entry; an empty
                // table degrades to Crude at neutral-ish output.
                QualityEntry {
                    threshold: -1.0,
                    tier: QualityTier::Crude,
                    multiplier: 0.8,
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_highest_threshold_first() {
        let table = QualityTable::standard();
        assert_eq!(table.select(0.99).tier, QualityTier::Immortal);
        assert_eq!(table.select(0.95).tier, QualityTier::Pristine);
        assert_eq!(table.select(0.70).tier, QualityTier::Refined);
        assert_eq!(table.select(0.30).tier, QualityTier::Common);
        assert_eq!(table.select(0.0).tier, QualityTier::Crude);
    }

    #[test]
    fn exact_threshold_falls_through() {
        let table = QualityTable::standard();
        // Strict greater-than: a roll of exactly 0.90 is not Pristine.
        assert_eq!(table.select(0.90).tier, QualityTier::Refined);
        assert_eq!(table.select(0.98).tier, QualityTier::Pristine);
    }

    #[test]
    fn unsorted_input_is_normalized() {
        let table = QualityTable::new(vec![
            QualityEntry {
                threshold: -1.0,
                tier: QualityTier::Crude,
                multiplier: 0.8,
            },
            QualityEntry {
                threshold: 0.5,
                tier: QualityTier::Refined,
                multiplier: 1.2,
            },
        ]);
        assert_eq!(table.select(0.6).tier, QualityTier::Refined);
        assert_eq!(table.select(0.4).tier, QualityTier::Crude);
    }
}
