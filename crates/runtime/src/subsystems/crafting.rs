//! Crafting subsystem: one active craft, a bounded queue behind it.
//!
//! Inputs are consumed up front, whether the craft starts immediately or
//! waits in the queue. Completion rolls a quality tier that scales the
//! output amount; the next queued craft then starts after a short chain
//! delay, measured from the completion timestamp so idle catch-up chains
//! correctly through a long gap.

use std::sync::Arc;

use cultivation_core::catalog::RecipeOracle;
use cultivation_core::config::EngineConfig;
use cultivation_core::error::{EngineError, Reject};
use cultivation_core::ledger::{ResourceId, ResourcePool};
use cultivation_core::quality::{QualityTable, QualityTier};
use cultivation_core::reconcile::{IdleOutcome, IdleParticipant};
use cultivation_core::rng::{PcgRoller, RollOracle, compute_seed};
use cultivation_core::slot::{CraftQueue, Operation, OperationKind, PendingCraft, TimedOperationSlot};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::events::{Event, EventBus, Topic};

/// Roll context for quality tiers (distinct from breakthrough rolls).
const QUALITY_ROLL_CONTEXT: u32 = 1;

/// Result of one completed craft.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CraftOutcome {
    pub recipe: String,
    pub tier: QualityTier,
    pub output: ResourceId,
    pub amount: u64,
}

/// Serializable subsystem snapshot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CraftingState {
    pool: ResourcePool,
    slot: TimedOperationSlot,
    queue: CraftQueue,
    session_seed: u64,
    roll_counter: u64,
}

impl CraftingState {
    pub fn new(session_seed: u64) -> Self {
        Self {
            session_seed,
            ..Self::default()
        }
    }
}

pub struct Crafting {
    catalog: Arc<dyn RecipeOracle>,
    quality: QualityTable,
    config: EngineConfig,
    roller: PcgRoller,
    bus: EventBus,
    state: CraftingState,
}

impl Crafting {
    pub const STORE_KEY: &'static str = "crafting";

    pub fn new(
        catalog: Arc<dyn RecipeOracle>,
        quality: QualityTable,
        config: EngineConfig,
        bus: EventBus,
        state: CraftingState,
    ) -> Self {
        Self {
            catalog,
            quality,
            config,
            roller: PcgRoller,
            bus,
            state,
        }
    }

    pub fn state(&self) -> &CraftingState {
        &self.state
    }

    pub fn pool(&self) -> &ResourcePool {
        &self.state.pool
    }

    pub fn grant_resource(&mut self, resource: ResourceId, amount: u64) {
        self.state.pool.grant(resource, amount);
    }

    pub fn queue_len(&self) -> usize {
        self.state.queue.len()
    }

    pub fn active_operation(&self) -> Option<&Operation> {
        self.state.slot.active()
    }

    /// Starts a craft, or queues it when the slot is busy.
    ///
    /// Inputs are consumed either way; a full queue rejects before anything
    /// is debited.
    pub fn queue_craft(&mut self, recipe_id: &str, now_ms: u64) -> Result<(), Reject> {
        let recipe = self
            .catalog
            .recipe(recipe_id)
            .ok_or_else(|| Reject::unknown_id(recipe_id))?
            .clone();

        if self.state.slot.is_busy() {
            if self.state.queue.len() >= EngineConfig::CRAFT_QUEUE_CAPACITY {
                return Err(Reject::QueueFull);
            }
            self.state.pool.consume(&recipe.inputs)?;
            self.state.queue.enqueue(PendingCraft {
                recipe: recipe.id.clone(),
                duration_ms: recipe.duration_ms,
                requirements: recipe.inputs,
            })?;
            self.bus.publish(Event::new(
                Topic::Crafting,
                "crafting:craft_queued",
                now_ms,
                json!({ "recipe": recipe.id, "queue_len": self.state.queue.len() }),
            ));
            return Ok(());
        }

        self.state.pool.consume(&recipe.inputs)?;
        self.state.slot.start(Operation::new(
            OperationKind::Craft,
            recipe.id.clone(),
            now_ms,
            recipe.duration_ms,
            recipe.inputs,
        ))?;
        self.bus.publish(Event::new(
            Topic::Crafting,
            "crafting:craft_started",
            now_ms,
            json!({ "recipe": recipe.id, "duration_ms": recipe.duration_ms }),
        ));
        Ok(())
    }

    /// Cancels the active craft, refunding part of its inputs. A craft
    /// that already finished is not cancellable; poll it instead.
    pub fn cancel_active(&mut self, now_ms: u64) -> Option<String> {
        let operation = self.state.slot.cancel(now_ms)?;
        self.state
            .pool
            .refund(&operation.requirements, EngineConfig::CANCEL_REFUND_RATE);
        self.bus.publish(Event::new(
            Topic::Crafting,
            "crafting:craft_cancelled",
            now_ms,
            json!({ "recipe": operation.target }),
        ));
        self.promote_queued(now_ms);
        Some(operation.target)
    }

    /// Applies one finished craft, if one completed by `now_ms`, and chains
    /// the next queued craft.
    ///
    /// A completed craft whose recipe no longer resolves yields nothing but
    /// still chains; the loop keeps polling so such a craft never stalls
    /// the queue behind it.
    pub fn poll(&mut self, now_ms: u64) -> Option<CraftOutcome> {
        loop {
            let operation = self.state.slot.poll_complete(now_ms)?;
            // Chain from the completion time, not the poll time, so a
            // single late poll walks the whole queue.
            let chain_at = operation
                .complete_at()
                .saturating_add(self.config.craft_chain_delay_ms);

            let Some(recipe) = self.catalog.recipe(&operation.target).cloned() else {
                tracing::warn!(recipe = %operation.target, "completed craft for unknown recipe");
                self.promote_queued(chain_at);
                continue;
            };

            let seed = compute_seed(
                self.state.session_seed,
                self.state.roll_counter,
                QUALITY_ROLL_CONTEXT,
            );
            self.state.roll_counter += 1;
            let entry = self.quality.select(self.roller.unit_roll(seed));
            let amount = ((recipe.output_amount as f64 * entry.multiplier).floor() as u64).max(1);
            self.state.pool.grant(recipe.output, amount);
            let outcome = CraftOutcome {
                recipe: recipe.id,
                tier: entry.tier,
                output: recipe.output,
                amount,
            };

            self.bus.publish(Event::new(
                Topic::Crafting,
                "crafting:craft_completed",
                now_ms,
                json!({
                    "recipe": outcome.recipe,
                    "quality": outcome.tier.to_string(),
                    "output": outcome.output.to_string(),
                    "amount": outcome.amount,
                }),
            ));
            self.promote_queued(chain_at);
            return Some(outcome);
        }
    }

    fn promote_queued(&mut self, start_at_ms: u64) {
        if self.state.slot.is_busy() {
            return;
        }
        let Some(next) = self.state.queue.dequeue() else {
            return;
        };
        let duration_ms = next.duration_ms;
        let recipe = next.recipe.clone();
        if let Err(reject) = self.state.slot.start(Operation::new(
            OperationKind::Craft,
            next.recipe,
            start_at_ms,
            next.duration_ms,
            next.requirements,
        )) {
            tracing::warn!(reason = reject.reason(), "failed to promote queued craft");
            return;
        }
        self.bus.publish(Event::new(
            Topic::Crafting,
            "crafting:craft_started",
            start_at_ms,
            json!({ "recipe": recipe, "duration_ms": duration_ms }),
        ));
    }
}

impl IdleParticipant for Crafting {
    fn name(&self) -> &'static str {
        "crafting"
    }

    fn reconcile(&mut self, now_ms: u64) -> Result<IdleOutcome, EngineError> {
        let mut outcome = IdleOutcome::default();
        // Chained crafts started in the past complete on subsequent polls.
        while self.poll(now_ms).is_some() {
            outcome.completed_operations += 1;
        }
        Ok(outcome)
    }
}
