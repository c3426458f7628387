//! Dantian subsystem: capacity expansion and density compression.
//!
//! All three centers are always active. Expansion raises a center's qi
//! capacity in fixed steps; compression raises the density multiplier that
//! scales the center's power continuously.

use std::sync::Arc;

use cultivation_core::catalog::DantianOracle;
use cultivation_core::config::EngineConfig;
use cultivation_core::error::{EngineError, Reject};
use cultivation_core::ledger::{Requirements, ResourceId, ResourcePool};
use cultivation_core::power::{RatedEntity, aggregate_power, entity_power};
use cultivation_core::reconcile::{IdleOutcome, IdleParticipant};
use cultivation_core::slot::{Operation, OperationKind, TimedOperationSlot};
use cultivation_content::DantianTuning;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::events::{Event, EventBus, Topic};

/// Player progress on one center.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CenterProgress {
    pub id: String,
    pub expansion_level: u32,
    pub compression_level: u32,
}

impl CenterProgress {
    fn untouched(id: &str) -> Self {
        Self {
            id: id.to_string(),
            expansion_level: 0,
            compression_level: 0,
        }
    }
}

/// Serializable subsystem snapshot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DantianState {
    pool: ResourcePool,
    slot: TimedOperationSlot,
    centers: Vec<CenterProgress>,
}

pub struct Dantian {
    catalog: Arc<dyn DantianOracle>,
    tuning: DantianTuning,
    bus: EventBus,
    state: DantianState,
}

impl Dantian {
    pub const STORE_KEY: &'static str = "dantian";

    pub fn new(
        catalog: Arc<dyn DantianOracle>,
        tuning: DantianTuning,
        bus: EventBus,
        state: DantianState,
    ) -> Self {
        Self {
            catalog,
            tuning,
            bus,
            state,
        }
    }

    pub fn state(&self) -> &DantianState {
        &self.state
    }

    pub fn pool(&self) -> &ResourcePool {
        &self.state.pool
    }

    pub fn grant_resource(&mut self, resource: ResourceId, amount: u64) {
        self.state.pool.grant(resource, amount);
    }

    pub fn progress(&self, id: &str) -> Option<&CenterProgress> {
        self.state.centers.iter().find(|center| center.id == id)
    }

    fn progress_mut(&mut self, id: &str) -> &mut CenterProgress {
        if let Some(index) = self.state.centers.iter().position(|center| center.id == id) {
            return &mut self.state.centers[index];
        }
        self.state.centers.push(CenterProgress::untouched(id));
        self.state.centers.last_mut().expect("entry was just pushed")
    }

    /// Current qi capacity of a center.
    pub fn capacity(&self, id: &str) -> Option<u32> {
        let definition = self.catalog.center(id)?;
        let expansions = self
            .progress(id)
            .map(|center| center.expansion_level)
            .unwrap_or(0);
        Some(definition.base_capacity + expansions * self.tuning.capacity_per_expansion)
    }

    /// Current density multiplier of a center.
    pub fn density(&self, id: &str) -> f64 {
        let compressions = self
            .progress(id)
            .map(|center| center.compression_level)
            .unwrap_or(0);
        1.0 + compressions as f64 * self.tuning.density_per_compression
    }

    /// Consumes the expansion cost and occupies the slot.
    pub fn start_expand(&mut self, id: &str, now_ms: u64) -> Result<(), Reject> {
        self.start_work(id, OperationKind::Expand, now_ms)
    }

    /// Consumes the compression cost and occupies the slot.
    pub fn start_compress(&mut self, id: &str, now_ms: u64) -> Result<(), Reject> {
        self.start_work(id, OperationKind::Compress, now_ms)
    }

    fn start_work(&mut self, id: &str, kind: OperationKind, now_ms: u64) -> Result<(), Reject> {
        if self.catalog.center(id).is_none() {
            return Err(Reject::unknown_id(id));
        }
        if self.state.slot.is_busy() {
            return Err(Reject::SlotOccupied);
        }

        let progress = self.progress(id);
        let (level, cost_curve, duration_curve) = match kind {
            OperationKind::Expand => (
                progress.map(|c| c.expansion_level).unwrap_or(0),
                self.tuning.expand_cost,
                self.tuning.expand_duration,
            ),
            _ => (
                progress.map(|c| c.compression_level).unwrap_or(0),
                self.tuning.compress_cost,
                self.tuning.compress_duration,
            ),
        };
        let requirements =
            Requirements::new().with(ResourceId::QiCrystals, cost_curve.amount(level, 1.0));
        let duration_ms = duration_curve.amount(level, 1.0);

        self.state.pool.consume(&requirements)?;
        self.state
            .slot
            .start(Operation::new(kind, id, now_ms, duration_ms, requirements))?;
        self.bus.publish(Event::new(
            Topic::Dantian,
            match kind {
                OperationKind::Expand => "dantian:expand_started",
                _ => "dantian:compress_started",
            },
            now_ms,
            json!({ "center": id, "level": level, "duration_ms": duration_ms }),
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
            Topic::Dantian,
            "dantian:cancelled",
            now_ms,
            json!({ "center": operation.target }),
        ));
        Some(operation.target)
    }

    /// Applies a finished operation, if one completed by `now_ms`.
    pub fn poll(&mut self, now_ms: u64) -> Option<String> {
        let operation = self.state.slot.poll_complete(now_ms)?;
        match operation.kind {
            OperationKind::Expand => {
                self.progress_mut(&operation.target).expansion_level += 1;
                let capacity = self.capacity(&operation.target).unwrap_or(0);
                self.bus.publish(Event::new(
                    Topic::Dantian,
                    "dantian:expanded",
                    now_ms,
                    json!({ "center": operation.target, "capacity": capacity }),
                ));
            }
            OperationKind::Compress => {
                self.progress_mut(&operation.target).compression_level += 1;
                let density = self.density(&operation.target);
                self.bus.publish(Event::new(
                    Topic::Dantian,
                    "dantian:compressed",
                    now_ms,
                    json!({ "center": operation.target, "density": density }),
                ));
            }
            other => {
                tracing::warn!(kind = %other, "unexpected operation kind in dantian slot");
            }
        }
        Some(operation.target)
    }

    /// Combat power from all centers, each scaled by its density.
    pub fn power(&self) -> u64 {
        let entities: Vec<RatedEntity> = self
            .catalog
            .centers()
            .iter()
            .map(|definition| {
                let expansions = self
                    .progress(&definition.id)
                    .map(|center| center.expansion_level)
                    .unwrap_or(0);
                let capacity = definition.base_capacity
                    + expansions * self.tuning.capacity_per_expansion;
                let power = entity_power(
                    &definition.profile,
                    expansions + 1,
                    capacity,
                    Some(self.density(&definition.id)),
                );
                RatedEntity::new(definition.id.clone(), power, expansions + 1)
            })
            .collect();
        aggregate_power(&entities, &[])
    }
}

impl IdleParticipant for Dantian {
    fn name(&self) -> &'static str {
        "dantian"
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
    use cultivation_content::DantianCatalog;

    fn funded() -> Dantian {
        let mut dantian = Dantian::new(
            Arc::new(DantianCatalog::builtin()),
            DantianTuning::default(),
            EventBus::new(),
            DantianState::default(),
        );
        dantian.grant_resource(ResourceId::QiCrystals, 100_000);
        dantian
    }

    #[test]
    fn expansion_raises_capacity_in_steps() {
        let mut dantian = funded();
        assert_eq!(dantian.capacity("lower_dantian"), Some(100));

        dantian.start_expand("lower_dantian", 0).unwrap();
        assert_eq!(dantian.pool().amount(ResourceId::QiCrystals), 99_995);
        dantian.poll(120_000).unwrap();
        assert_eq!(dantian.capacity("lower_dantian"), Some(150));
    }

    #[test]
    fn compression_raises_density_continuously() {
        let mut dantian = funded();
        assert_eq!(dantian.density("lower_dantian"), 1.0);

        dantian.start_compress("lower_dantian", 0).unwrap();
        dantian.poll(180_000).unwrap();
        assert!((dantian.density("lower_dantian") - 1.05).abs() < 1e-9);
    }

    #[test]
    fn density_scales_center_power() {
        let mut dantian = funded();
        let before = dantian.power();

        dantian.start_compress("lower_dantian", 0).unwrap();
        dantian.poll(180_000).unwrap();
        assert!(dantian.power() > before);
    }

    #[test]
    fn slot_is_shared_between_expand_and_compress() {
        let mut dantian = funded();
        dantian.start_expand("lower_dantian", 0).unwrap();
        let err = dantian.start_compress("middle_dantian", 0).unwrap_err();
        assert_eq!(err, Reject::SlotOccupied);
    }

    #[test]
    fn costs_grow_with_level() {
        let mut dantian = funded();
        dantian.start_expand("lower_dantian", 0).unwrap();
        dantian.poll(120_000).unwrap();
        let after_first = dantian.pool().amount(ResourceId::QiCrystals);

        dantian.start_expand("lower_dantian", 120_000).unwrap();
        // Second expansion: floor(5 × 1.5) = 7 crystals.
        assert_eq!(dantian.pool().amount(ResourceId::QiCrystals), after_first - 7);
    }
}
