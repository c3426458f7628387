//! Accessory enhancement subsystem.
//!
//! Owned accessories enhance one at a time through the operation slot.
//! Enhancement costs scale with the accessory's current enhancement level
//! through the tuning curves, with rarity as the category multiplier.

use std::sync::Arc;

use cultivation_core::catalog::AccessoryOracle;
use cultivation_core::config::EngineConfig;
use cultivation_core::error::{EngineError, Reject};
use cultivation_core::ledger::{Requirements, ResourceId, ResourcePool};
use cultivation_core::power::{RatedEntity, aggregate_power, entity_power};
use cultivation_core::reconcile::{IdleOutcome, IdleParticipant};
use cultivation_core::slot::{Operation, OperationKind, TimedOperationSlot};
use cultivation_content::AccessoryTuning;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::events::{Event, EventBus, Topic};

/// One accessory the player owns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedAccessory {
    pub id: String,
    pub enhancement_level: u32,
    /// Secondary stat raised by enhancement; feeds the power formula.
    pub purity: u32,
    pub equipped: bool,
}

/// Serializable subsystem snapshot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AccessoryState {
    pool: ResourcePool,
    slot: TimedOperationSlot,
    owned: Vec<OwnedAccessory>,
}

pub struct Accessories {
    catalog: Arc<dyn AccessoryOracle>,
    tuning: AccessoryTuning,
    bus: EventBus,
    state: AccessoryState,
}

impl Accessories {
    pub const STORE_KEY: &'static str = "accessories";

    /// Purity gained per completed enhancement.
    const PURITY_PER_ENHANCEMENT: u32 = 2;

    pub fn new(
        catalog: Arc<dyn AccessoryOracle>,
        tuning: AccessoryTuning,
        bus: EventBus,
        state: AccessoryState,
    ) -> Self {
        Self {
            catalog,
            tuning,
            bus,
            state,
        }
    }

    pub fn state(&self) -> &AccessoryState {
        &self.state
    }

    pub fn pool(&self) -> &ResourcePool {
        &self.state.pool
    }

    pub fn grant_resource(&mut self, resource: ResourceId, amount: u64) {
        self.state.pool.grant(resource, amount);
    }

    pub fn owned(&self) -> &[OwnedAccessory] {
        &self.state.owned
    }

    pub fn active_operation(&self) -> Option<&Operation> {
        self.state.slot.active()
    }

    /// Adds a catalog accessory to the owned list, equipped.
    pub fn acquire(&mut self, id: &str) -> Result<(), Reject> {
        let definition = self
            .catalog
            .accessory(id)
            .ok_or_else(|| Reject::unknown_id(id))?;
        self.state.owned.push(OwnedAccessory {
            id: definition.id.clone(),
            enhancement_level: 0,
            purity: 0,
            equipped: true,
        });
        Ok(())
    }

    pub fn set_equipped(&mut self, id: &str, equipped: bool) -> Result<(), Reject> {
        let owned = self
            .state
            .owned
            .iter_mut()
            .find(|owned| owned.id == id)
            .ok_or_else(|| Reject::unknown_id(id))?;
        owned.equipped = equipped;
        Ok(())
    }

    /// Cost of the next enhancement for an owned accessory.
    pub fn enhancement_cost(&self, id: &str) -> Result<Requirements, Reject> {
        let owned = self
            .state
            .owned
            .iter()
            .find(|owned| owned.id == id)
            .ok_or_else(|| Reject::unknown_id(id))?;
        let definition = self
            .catalog
            .accessory(id)
            .ok_or_else(|| Reject::unknown_id(id))?;
        let level = owned.enhancement_level;
        let rarity = definition.rarity.cost_multiplier();
        Ok(Requirements::new()
            .with(
                ResourceId::SpiritStones,
                self.tuning.spirit_cost.amount(level, rarity),
            )
            .with(
                ResourceId::EnhancementStones,
                self.tuning.stone_cost.amount(level, rarity),
            )
            .with(
                definition.primary_material,
                self.tuning.material_cost.amount(level, rarity),
            ))
    }

    /// Consumes the enhancement cost and occupies the slot.
    pub fn start_enhancement(&mut self, id: &str, now_ms: u64) -> Result<(), Reject> {
        if self.state.slot.is_busy() {
            return Err(Reject::SlotOccupied);
        }
        let requirements = self.enhancement_cost(id)?;
        let definition = self
            .catalog
            .accessory(id)
            .ok_or_else(|| Reject::unknown_id(id))?;
        let level = self
            .state
            .owned
            .iter()
            .find(|owned| owned.id == id)
            .map(|owned| owned.enhancement_level)
            .unwrap_or(0);
        let duration_ms = self
            .tuning
            .duration
            .amount(level, definition.rarity.cost_multiplier());

        self.state.pool.consume(&requirements)?;
        self.state.slot.start(Operation::new(
            OperationKind::Enhance,
            id,
            now_ms,
            duration_ms,
            requirements,
        ))?;

        self.bus.publish(Event::new(
            Topic::Accessories,
            "accessories:enhance_started",
            now_ms,
            json!({ "accessory": id, "level": level, "duration_ms": duration_ms }),
        ));
        Ok(())
    }

    /// Cancels the active enhancement, refunding part of its cost.
    ///
    /// Returns the cancelled target, or `None` when the slot is idle or
    /// the enhancement already finished (poll it instead).
    pub fn cancel_enhancement(&mut self, now_ms: u64) -> Option<String> {
        let operation = self.state.slot.cancel(now_ms)?;
        self.state
            .pool
            .refund(&operation.requirements, EngineConfig::CANCEL_REFUND_RATE);
        self.bus.publish(Event::new(
            Topic::Accessories,
            "accessories:enhance_cancelled",
            now_ms,
            json!({ "accessory": operation.target }),
        ));
        Some(operation.target)
    }

    /// Applies a finished enhancement, if one completed by `now_ms`.
    pub fn poll(&mut self, now_ms: u64) -> Option<String> {
        let operation = self.state.slot.poll_complete(now_ms)?;
        let mut new_level = 0;
        match self
            .state
            .owned
            .iter_mut()
            .find(|owned| owned.id == operation.target)
        {
            Some(owned) => {
                owned.enhancement_level += 1;
                owned.purity += Self::PURITY_PER_ENHANCEMENT;
                new_level = owned.enhancement_level;
            }
            None => {
                tracing::warn!(target = %operation.target, "completed enhancement for unowned accessory");
            }
        }
        self.bus.publish(Event::new(
            Topic::Accessories,
            "accessories:enhance_completed",
            now_ms,
            json!({ "accessory": operation.target, "level": new_level }),
        ));
        Some(operation.target)
    }

    /// Combat power from equipped accessories plus set bonuses.
    pub fn power(&self) -> u64 {
        let entities: Vec<RatedEntity> = self
            .state
            .owned
            .iter()
            .filter(|owned| owned.equipped)
            .filter_map(|owned| {
                let definition = self.catalog.accessory(&owned.id)?;
                let power = entity_power(
                    &definition.profile,
                    owned.enhancement_level + 1,
                    owned.purity,
                    None,
                );
                Some(RatedEntity::new(
                    owned.id.clone(),
                    power,
                    owned.enhancement_level,
                ))
            })
            .collect();
        aggregate_power(&entities, self.catalog.sets())
    }
}

impl IdleParticipant for Accessories {
    fn name(&self) -> &'static str {
        "accessories"
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
    use cultivation_content::AccessoryCatalog;

    fn subsystem() -> Accessories {
        Accessories::new(
            Arc::new(AccessoryCatalog::builtin()),
            AccessoryTuning::default(),
            EventBus::new(),
            AccessoryState::default(),
        )
    }

    fn funded() -> Accessories {
        let mut accessories = subsystem();
        accessories.grant_resource(ResourceId::SpiritStones, 10_000);
        accessories.grant_resource(ResourceId::EnhancementStones, 1_000);
        accessories.grant_resource(ResourceId::StarIron, 1_000);
        accessories
    }

    #[test]
    fn common_level_zero_enhancement_cost() {
        let mut accessories = subsystem();
        accessories.acquire("iron_ring").unwrap();
        let cost = accessories.enhancement_cost("iron_ring").unwrap();
        assert_eq!(cost.amount(ResourceId::SpiritStones), 50);
        assert_eq!(cost.amount(ResourceId::EnhancementStones), 3);
        assert_eq!(cost.amount(ResourceId::StarIron), 5);
    }

    #[test]
    fn enhancement_consumes_then_completes() {
        let mut accessories = funded();
        accessories.acquire("iron_ring").unwrap();
        accessories.start_enhancement("iron_ring", 0).unwrap();
        assert_eq!(accessories.pool().amount(ResourceId::SpiritStones), 9_950);

        // Busy slot rejects a second start.
        let err = accessories.start_enhancement("iron_ring", 0).unwrap_err();
        assert_eq!(err, Reject::SlotOccupied);

        assert!(accessories.poll(29_999).is_none());
        assert_eq!(accessories.poll(30_000).unwrap(), "iron_ring");
        assert_eq!(accessories.owned()[0].enhancement_level, 1);
        // Idempotent: replaying the poll applies nothing.
        assert!(accessories.poll(30_000).is_none());
    }

    #[test]
    fn insufficient_resources_reject_without_debit() {
        let mut accessories = subsystem();
        accessories.acquire("iron_ring").unwrap();
        accessories.grant_resource(ResourceId::SpiritStones, 50);
        // Stones and iron are missing entirely.
        let err = accessories.start_enhancement("iron_ring", 0).unwrap_err();
        assert_eq!(err.reason(), "insufficient_resources");
        assert_eq!(accessories.pool().amount(ResourceId::SpiritStones), 50);
        assert!(!accessories.state().slot.is_busy());
    }

    #[test]
    fn cancel_refunds_three_quarters() {
        let mut accessories = funded();
        accessories.acquire("iron_ring").unwrap();
        accessories.start_enhancement("iron_ring", 0).unwrap();

        accessories.cancel_enhancement(5_000).unwrap();
        // floor(50 × 0.75) = 37 of 50 spirit stones come back.
        assert_eq!(accessories.pool().amount(ResourceId::SpiritStones), 9_987);
        assert_eq!(accessories.pool().amount(ResourceId::EnhancementStones), 999);
        assert!(accessories.cancel_enhancement(5_000).is_none());
    }

    #[test]
    fn cancel_after_completion_preserves_the_finished_work() {
        let mut accessories = funded();
        accessories.acquire("iron_ring").unwrap();
        accessories.start_enhancement("iron_ring", 0).unwrap();

        // The 30s enhancement elapsed; cancelling refuses and the level
        // still lands on the next poll.
        assert!(accessories.cancel_enhancement(60_000).is_none());
        assert_eq!(accessories.poll(60_000).unwrap(), "iron_ring");
        assert_eq!(accessories.owned()[0].enhancement_level, 1);
    }

    #[test]
    fn power_counts_equipped_only() {
        let mut accessories = subsystem();
        accessories.acquire("iron_ring").unwrap();
        accessories.acquire("jade_ring").unwrap();
        let both = accessories.power();

        accessories.set_equipped("jade_ring", false).unwrap();
        let one = accessories.power();
        assert!(one < both);
        // iron_ring at +0: base 10.
        assert_eq!(one, 10);
    }

    #[test]
    fn unknown_accessory_is_rejected() {
        let mut accessories = subsystem();
        assert_eq!(
            accessories.acquire("no_such_ring").unwrap_err().reason(),
            "unknown_id"
        );
        assert_eq!(
            accessories
                .start_enhancement("no_such_ring", 0)
                .unwrap_err()
                .reason(),
            "unknown_id"
        );
    }
}
