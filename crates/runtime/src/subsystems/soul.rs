//! Soul subsystem: star opening and refinement.
//!
//! Stars open one at a time, in order within their constellation, fueled by
//! soul fragments. Refinement deepens an open star; constellation bonuses
//! come from the star-set declarations in the catalog.

use std::sync::Arc;

use cultivation_core::catalog::SoulOracle;
use cultivation_core::config::EngineConfig;
use cultivation_core::error::{EngineError, Reject};
use cultivation_core::ledger::{Requirements, ResourceId, ResourcePool};
use cultivation_core::power::{RatedEntity, SetBonus, aggregate_power, entity_power};
use cultivation_core::reconcile::{IdleOutcome, IdleParticipant};
use cultivation_core::slot::{Operation, OperationKind, TimedOperationSlot};
use cultivation_content::SoulTuning;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::events::{Event, EventBus, Topic};

/// Player progress on one star.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarProgress {
    pub id: String,
    pub open: bool,
    pub refine_level: u32,
    /// Secondary stat raised by refinement; feeds the power formula.
    pub radiance: u32,
}

impl StarProgress {
    fn dark(id: &str) -> Self {
        Self {
            id: id.to_string(),
            open: false,
            refine_level: 0,
            radiance: 0,
        }
    }
}

/// Serializable subsystem snapshot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SoulState {
    pool: ResourcePool,
    slot: TimedOperationSlot,
    stars: Vec<StarProgress>,
}

pub struct Soul {
    catalog: Arc<dyn SoulOracle>,
    tuning: SoulTuning,
    bus: EventBus,
    state: SoulState,
}

impl Soul {
    pub const STORE_KEY: &'static str = "soul";

    /// Radiance gained per completed refinement.
    const RADIANCE_PER_REFINE: u32 = 10;

    pub fn new(
        catalog: Arc<dyn SoulOracle>,
        tuning: SoulTuning,
        bus: EventBus,
        state: SoulState,
    ) -> Self {
        Self {
            catalog,
            tuning,
            bus,
            state,
        }
    }

    pub fn state(&self) -> &SoulState {
        &self.state
    }

    pub fn pool(&self) -> &ResourcePool {
        &self.state.pool
    }

    pub fn grant_resource(&mut self, resource: ResourceId, amount: u64) {
        self.state.pool.grant(resource, amount);
    }

    pub fn progress(&self, id: &str) -> Option<&StarProgress> {
        self.state.stars.iter().find(|star| star.id == id)
    }

    fn is_open(&self, id: &str) -> bool {
        self.progress(id).map(|star| star.open).unwrap_or(false)
    }

    fn progress_mut(&mut self, id: &str) -> &mut StarProgress {
        if let Some(index) = self.state.stars.iter().position(|star| star.id == id) {
            return &mut self.state.stars[index];
        }
        self.state.stars.push(StarProgress::dark(id));
        self.state.stars.last_mut().expect("entry was just pushed")
    }

    /// Consumes the opening cost and occupies the slot.
    ///
    /// Stars within a constellation open strictly in index order.
    pub fn start_open(&mut self, id: &str, now_ms: u64) -> Result<(), Reject> {
        let star = self
            .catalog
            .star(id)
            .ok_or_else(|| Reject::unknown_id(id))?
            .clone();
        if self.is_open(id) {
            return Err(Reject::NotUnlocked {
                requirement: "an unopened star",
            });
        }
        if star.index > 0 {
            let previous_open = self
                .catalog
                .stars()
                .iter()
                .find(|candidate| {
                    candidate.constellation == star.constellation
                        && candidate.index == star.index - 1
                })
                .map(|candidate| self.is_open(&candidate.id))
                .unwrap_or(true);
            if !previous_open {
                return Err(Reject::NotUnlocked {
                    requirement: "the previous star in the constellation",
                });
            }
        }
        if self.state.slot.is_busy() {
            return Err(Reject::SlotOccupied);
        }

        let requirements = Requirements::new().with(
            ResourceId::SoulFragments,
            self.tuning.open_cost.amount(star.index, 1.0),
        );
        let duration_ms = self.tuning.open_duration.amount(star.index, 1.0);
        self.state.pool.consume(&requirements)?;
        self.state.slot.start(Operation::new(
            OperationKind::Open,
            id,
            now_ms,
            duration_ms,
            requirements,
        ))?;
        self.bus.publish(Event::new(
            Topic::Soul,
            "soul:open_started",
            now_ms,
            json!({ "star": id, "duration_ms": duration_ms }),
        ));
        Ok(())
    }

    /// Consumes the refinement cost for an open star and occupies the slot.
    pub fn start_refine(&mut self, id: &str, now_ms: u64) -> Result<(), Reject> {
        if self.catalog.star(id).is_none() {
            return Err(Reject::unknown_id(id));
        }
        if !self.is_open(id) {
            return Err(Reject::NotUnlocked {
                requirement: "an opened star",
            });
        }
        if self.state.slot.is_busy() {
            return Err(Reject::SlotOccupied);
        }

        let level = self
            .progress(id)
            .map(|star| star.refine_level)
            .unwrap_or(0);
        let requirements = Requirements::new().with(
            ResourceId::SoulFragments,
            self.tuning.refine_cost.amount(level, 1.0),
        );
        let duration_ms = self.tuning.refine_duration.amount(level, 1.0);
        self.state.pool.consume(&requirements)?;
        self.state.slot.start(Operation::new(
            OperationKind::Refine,
            id,
            now_ms,
            duration_ms,
            requirements,
        ))?;
        self.bus.publish(Event::new(
            Topic::Soul,
            "soul:refine_started",
            now_ms,
            json!({ "star": id, "level": level, "duration_ms": duration_ms }),
        ));
        Ok(())
    }

    /// Cancels the active operation, refunding part of its cost.
    pub fn cancel(&mut self, now_ms: u64) -> Option<String> {
        let operation = self.state.slot.cancel(now_ms)?;
        self.state
            .pool
            .refund(&operation.requirements, EngineConfig::CANCEL_REFUND_RATE);
        self.bus.publish(Event::new(
            Topic::Soul,
            "soul:cancelled",
            now_ms,
            json!({ "star": operation.target }),
        ));
        Some(operation.target)
    }

    /// Applies a finished operation, if one completed by `now_ms`.
    pub fn poll(&mut self, now_ms: u64) -> Option<String> {
        let operation = self.state.slot.poll_complete(now_ms)?;
        match operation.kind {
            OperationKind::Open => {
                self.progress_mut(&operation.target).open = true;
                self.bus.publish(Event::new(
                    Topic::Soul,
                    "soul:star_opened",
                    now_ms,
                    json!({ "star": operation.target }),
                ));
            }
            OperationKind::Refine => {
                let star = self.progress_mut(&operation.target);
                star.refine_level += 1;
                star.radiance += Self::RADIANCE_PER_REFINE;
                let level = star.refine_level;
                self.bus.publish(Event::new(
                    Topic::Soul,
                    "soul:star_refined",
                    now_ms,
                    json!({ "star": operation.target, "level": level }),
                ));
            }
            other => {
                tracing::warn!(kind = %other, "unexpected operation kind in soul slot");
            }
        }
        Some(operation.target)
    }

    /// Combat power from open stars plus constellation bonuses.
    pub fn power(&self) -> u64 {
        let entities: Vec<RatedEntity> = self
            .state
            .stars
            .iter()
            .filter(|star| star.open)
            .filter_map(|star| {
                let definition = self.catalog.star(&star.id)?;
                let power = entity_power(
                    &definition.profile,
                    star.refine_level + 1,
                    star.radiance,
                    None,
                );
                Some(RatedEntity::new(
                    star.id.clone(),
                    power,
                    star.refine_level + 1,
                ))
            })
            .collect();
        let bonuses: Vec<SetBonus> = self
            .catalog
            .constellations()
            .iter()
            .map(|constellation| constellation.bonus.clone())
            .collect();
        aggregate_power(&entities, &bonuses)
    }
}

impl IdleParticipant for Soul {
    fn name(&self) -> &'static str {
        "soul"
    }

    fn reconcile(&mut self, now_ms: u64) -> Result<IdleOutcome, EngineError> {
        let mut outcome = IdleOutcome::default();
        if self.poll(now_ms).is_some() {
            outcome.completed_operations += 1;
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cultivation_content::SoulCatalog;

    fn funded() -> Soul {
        let mut soul = Soul::new(
            Arc::new(SoulCatalog::builtin()),
            SoulTuning::default(),
            EventBus::new(),
            SoulState::default(),
        );
        soul.grant_resource(ResourceId::SoulFragments, 100_000);
        soul
    }

    #[test]
    fn open_then_refine_flow() {
        let mut soul = funded();
        soul.start_open("azure_dragon_horn", 0).unwrap();
        assert_eq!(soul.pool().amount(ResourceId::SoulFragments), 99_990);
        soul.poll(90_000).unwrap();
        assert!(soul.progress("azure_dragon_horn").unwrap().open);

        soul.start_refine("azure_dragon_horn", 90_000).unwrap();
        soul.poll(150_000).unwrap();
        let star = soul.progress("azure_dragon_horn").unwrap();
        assert_eq!(star.refine_level, 1);
        assert_eq!(star.radiance, 10);
    }

    #[test]
    fn stars_open_in_constellation_order() {
        let mut soul = funded();
        let err = soul.start_open("azure_dragon_neck", 0).unwrap_err();
        assert_eq!(err.reason(), "not_unlocked");

        soul.start_open("azure_dragon_horn", 0).unwrap();
        soul.poll(90_000).unwrap();
        soul.start_open("azure_dragon_neck", 90_000).unwrap();
    }

    #[test]
    fn refine_requires_open_star() {
        let mut soul = funded();
        let err = soul.start_refine("azure_dragon_horn", 0).unwrap_err();
        assert_eq!(err.reason(), "not_unlocked");
    }

    #[test]
    fn half_constellation_earns_tier_bonus() {
        let mut soul = funded();
        let mut now = 0;
        // Open the first two of azure_dragon's four stars.
        for star in ["azure_dragon_horn", "azure_dragon_neck"] {
            soul.start_open(star, now).unwrap();
            now += 200_000;
            soul.poll(now).unwrap();
        }
        // horn 15 + neck 19 = 34; half-count tier adds 8%: floor(34 × 1.08).
        assert_eq!(soul.power(), 36);
    }
}
