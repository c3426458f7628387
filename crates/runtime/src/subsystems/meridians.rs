//! Meridian subsystem: channel opening and tempering.
//!
//! Channels open in the traditional circulation order; a channel must be
//! open before it can be tempered. Opening costs scale with the channel's
//! index, tempering with its temper level.

use std::sync::Arc;

use cultivation_core::catalog::MeridianOracle;
use cultivation_core::config::EngineConfig;
use cultivation_core::error::{EngineError, Reject};
use cultivation_core::ledger::{Requirements, ResourceId, ResourcePool};
use cultivation_core::power::{RatedEntity, aggregate_power, entity_power};
use cultivation_core::reconcile::{IdleOutcome, IdleParticipant};
use cultivation_core::slot::{Operation, OperationKind, TimedOperationSlot};
use cultivation_content::MeridianTuning;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::events::{Event, EventBus, Topic};

/// Player progress on one channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelProgress {
    pub id: String,
    pub open: bool,
    pub temper_level: u32,
    /// Secondary stat raised by tempering; feeds the power formula.
    pub purity: u32,
}

impl ChannelProgress {
    fn closed(id: &str) -> Self {
        Self {
            id: id.to_string(),
            open: false,
            temper_level: 0,
            purity: 0,
        }
    }
}

/// Serializable subsystem snapshot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MeridianState {
    pool: ResourcePool,
    slot: TimedOperationSlot,
    channels: Vec<ChannelProgress>,
}

pub struct Meridians {
    catalog: Arc<dyn MeridianOracle>,
    tuning: MeridianTuning,
    bus: EventBus,
    state: MeridianState,
}

impl Meridians {
    pub const STORE_KEY: &'static str = "meridians";

    /// Purity gained per completed tempering.
    const PURITY_PER_TEMPER: u32 = 5;

    pub fn new(
        catalog: Arc<dyn MeridianOracle>,
        tuning: MeridianTuning,
        bus: EventBus,
        state: MeridianState,
    ) -> Self {
        Self {
            catalog,
            tuning,
            bus,
            state,
        }
    }

    pub fn state(&self) -> &MeridianState {
        &self.state
    }

    pub fn pool(&self) -> &ResourcePool {
        &self.state.pool
    }

    pub fn grant_resource(&mut self, resource: ResourceId, amount: u64) {
        self.state.pool.grant(resource, amount);
    }

    pub fn progress(&self, id: &str) -> Option<&ChannelProgress> {
        self.state.channels.iter().find(|channel| channel.id == id)
    }

    pub fn open_count(&self) -> usize {
        self.state.channels.iter().filter(|c| c.open).count()
    }

    fn is_open(&self, id: &str) -> bool {
        self.progress(id).map(|c| c.open).unwrap_or(false)
    }

    fn progress_mut(&mut self, id: &str) -> &mut ChannelProgress {
        if let Some(index) = self
            .state
            .channels
            .iter()
            .position(|channel| channel.id == id)
        {
            return &mut self.state.channels[index];
        }
        self.state.channels.push(ChannelProgress::closed(id));
        self.state
            .channels
            .last_mut()
            .expect("entry was just pushed")
    }

    /// Cost of opening a channel, by its index in the circulation order.
    pub fn open_cost(&self, id: &str) -> Result<Requirements, Reject> {
        let definition = self
            .catalog
            .channel(id)
            .ok_or_else(|| Reject::unknown_id(id))?;
        Ok(Requirements::new()
            .with(
                ResourceId::SpiritStones,
                self.tuning.open_spirit_cost.amount(definition.index, 1.0),
            )
            .with(
                ResourceId::MeridianPills,
                self.tuning.open_pill_cost.amount(definition.index, 1.0),
            ))
    }

    /// Consumes the opening cost and occupies the slot.
    ///
    /// Channels open strictly in index order.
    pub fn start_open(&mut self, id: &str, now_ms: u64) -> Result<(), Reject> {
        let definition = self
            .catalog
            .channel(id)
            .ok_or_else(|| Reject::unknown_id(id))?
            .clone();
        if self.is_open(id) {
            return Err(Reject::NotUnlocked {
                requirement: "an unopened channel",
            });
        }
        if definition.index > 0 {
            let previous_open = self
                .catalog
                .channels()
                .iter()
                .find(|channel| channel.index == definition.index - 1)
                .map(|channel| self.is_open(&channel.id))
                .unwrap_or(true);
            if !previous_open {
                return Err(Reject::NotUnlocked {
                    requirement: "the previous channel in circulation order",
                });
            }
        }
        if self.state.slot.is_busy() {
            return Err(Reject::SlotOccupied);
        }

        let requirements = self.open_cost(id)?;
        let duration_ms = self.tuning.open_duration.amount(definition.index, 1.0);
        self.state.pool.consume(&requirements)?;
        self.state.slot.start(Operation::new(
            OperationKind::Open,
            id,
            now_ms,
            duration_ms,
            requirements,
        ))?;
        self.bus.publish(Event::new(
            Topic::Meridians,
            "meridians:open_started",
            now_ms,
            json!({ "channel": id, "duration_ms": duration_ms }),
        ));
        Ok(())
    }

    /// Consumes the tempering cost for an open channel and occupies the slot.
    pub fn start_temper(&mut self, id: &str, now_ms: u64) -> Result<(), Reject> {
        if self.catalog.channel(id).is_none() {
            return Err(Reject::unknown_id(id));
        }
        if !self.is_open(id) {
            return Err(Reject::NotUnlocked {
                requirement: "an opened channel",
            });
        }
        if self.state.slot.is_busy() {
            return Err(Reject::SlotOccupied);
        }

        let level = self
            .progress(id)
            .map(|channel| channel.temper_level)
            .unwrap_or(0);
        let requirements = Requirements::new()
            .with(
                ResourceId::SpiritStones,
                self.tuning.temper_spirit_cost.amount(level, 1.0),
            )
            .with(
                ResourceId::TemperingPills,
                self.tuning.temper_pill_cost.amount(level, 1.0),
            );
        let duration_ms = self.tuning.temper_duration.amount(level, 1.0);
        self.state.pool.consume(&requirements)?;
        self.state.slot.start(Operation::new(
            OperationKind::Temper,
            id,
            now_ms,
            duration_ms,
            requirements,
        ))?;
        self.bus.publish(Event::new(
            Topic::Meridians,
            "meridians:temper_started",
            now_ms,
            json!({ "channel": id, "level": level, "duration_ms": duration_ms }),
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
            Topic::Meridians,
            "meridians:cancelled",
            now_ms,
            json!({ "channel": operation.target }),
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
                    Topic::Meridians,
                    "meridians:channel_opened",
                    now_ms,
                    json!({ "channel": operation.target }),
                ));
            }
            OperationKind::Temper => {
                let channel = self.progress_mut(&operation.target);
                channel.temper_level += 1;
                channel.purity += Self::PURITY_PER_TEMPER;
                let level = channel.temper_level;
                self.bus.publish(Event::new(
                    Topic::Meridians,
                    "meridians:channel_tempered",
                    now_ms,
                    json!({ "channel": operation.target, "level": level }),
                ));
            }
            other => {
                tracing::warn!(kind = %other, "unexpected operation kind in meridian slot");
            }
        }
        Some(operation.target)
    }

    /// Combat power from open channels plus circulation patterns.
    pub fn power(&self) -> u64 {
        let entities: Vec<RatedEntity> = self
            .state
            .channels
            .iter()
            .filter(|channel| channel.open)
            .filter_map(|channel| {
                let definition = self.catalog.channel(&channel.id)?;
                let power = entity_power(
                    &definition.profile,
                    channel.temper_level + 1,
                    channel.purity,
                    None,
                );
                Some(RatedEntity::new(
                    channel.id.clone(),
                    power,
                    channel.temper_level + 1,
                ))
            })
            .collect();
        aggregate_power(&entities, self.catalog.patterns())
    }
}

impl IdleParticipant for Meridians {
    fn name(&self) -> &'static str {
        "meridians"
    }

    fn reconcile(&mut self, now_ms: u64) -> Result<IdleOutcome, EngineError> {
        let mut outcome = IdleOutcome::default();
        if self.poll(now_ms).is_some() {
            outcome.completed_operations += 1;
        }
        Ok(outcome)
    }
}
