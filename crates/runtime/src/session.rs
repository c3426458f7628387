//! Session orchestration.
//!
//! A [`Session`] wires the six content subsystems to a clock, a state store,
//! and the event bus. Live play calls [`Session::tick`]; resuming after a
//! suspension gap calls [`Session::process_idle_gains`], which reconciles
//! every subsystem against the new clock with per-subsystem failure
//! isolation.

use std::sync::Arc;

use cultivation_core::config::EngineConfig;
use cultivation_core::reconcile::{IdleOutcome, IdleParticipant, reconcile_all};
use cultivation_content::{
    AccessoryCatalog, AccessoryTuning, DantianCatalog, DantianTuning, DefaultFormulas,
    MeridianCatalog, MeridianTuning, RealmCatalog, RecipeCatalog, SoulCatalog, SoulTuning,
    TechniqueCatalog,
};
use cultivation_core::quality::QualityTable;
use serde_json::json;

use crate::clock::{Clock, SystemClock};
use crate::error::Result;
use crate::events::{Event, EventBus, Topic};
use crate::store::{self, MemoryStore, StateStore};
use crate::subsystems::{
    Accessories, Crafting, CraftingState, Cultivation, CultivationState, Dantian, Meridians, Soul,
};

/// Provenance tag for session-driven store writes.
const SAVE_SOURCE: &str = "session:save";

/// One player's engine instance.
pub struct Session {
    store: Arc<dyn StateStore>,
    bus: EventBus,
    clock: Arc<dyn Clock>,
    pub accessories: Accessories,
    pub crafting: Crafting,
    pub meridians: Meridians,
    pub dantian: Dantian,
    pub soul: Soul,
    pub cultivation: Cultivation,
}

/// Builder for [`Session`]; defaults to the system clock, an in-memory
/// store, and an entropy-derived roll seed.
pub struct SessionBuilder {
    store: Option<Arc<dyn StateStore>>,
    clock: Option<Arc<dyn Clock>>,
    config: EngineConfig,
    seed: Option<u64>,
    bus_capacity: usize,
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            clock: None,
            config: EngineConfig::default(),
            seed: None,
            bus_capacity: 256,
        }
    }

    pub fn store(mut self, store: Arc<dyn StateStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Fixes the roll seed; tests and replays want determinism.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn bus_capacity(mut self, capacity: usize) -> Self {
        self.bus_capacity = capacity;
        self
    }

    /// Builds the session, rehydrating subsystem snapshots from the store.
    pub fn build(self) -> Result<Session> {
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let seed = self.seed.unwrap_or_else(rand::random);
        let bus = EventBus::with_capacity(self.bus_capacity);
        let now_ms = clock.now_ms();

        let accessories = Accessories::new(
            Arc::new(AccessoryCatalog::builtin()),
            AccessoryTuning::default(),
            bus.clone(),
            store::load(store.as_ref(), Accessories::STORE_KEY)?.unwrap_or_default(),
        );
        let crafting = Crafting::new(
            Arc::new(RecipeCatalog::builtin()),
            QualityTable::standard(),
            self.config.clone(),
            bus.clone(),
            store::load(store.as_ref(), Crafting::STORE_KEY)?
                .unwrap_or_else(|| CraftingState::new(seed)),
        );
        let meridians = Meridians::new(
            Arc::new(MeridianCatalog::builtin()),
            MeridianTuning::default(),
            bus.clone(),
            store::load(store.as_ref(), Meridians::STORE_KEY)?.unwrap_or_default(),
        );
        let dantian = Dantian::new(
            Arc::new(DantianCatalog::builtin()),
            DantianTuning::default(),
            bus.clone(),
            store::load(store.as_ref(), Dantian::STORE_KEY)?.unwrap_or_default(),
        );
        let soul = Soul::new(
            Arc::new(SoulCatalog::builtin()),
            SoulTuning::default(),
            bus.clone(),
            store::load(store.as_ref(), Soul::STORE_KEY)?.unwrap_or_default(),
        );
        let cultivation = Cultivation::new(
            Arc::new(DefaultFormulas),
            Arc::new(TechniqueCatalog::builtin()),
            Arc::new(RealmCatalog::builtin()),
            self.config.clone(),
            bus.clone(),
            store::load(store.as_ref(), Cultivation::STORE_KEY)?
                .unwrap_or_else(|| CultivationState::new(seed, now_ms)),
        );

        tracing::info!(now_ms, "session built");
        Ok(Session {
            store,
            bus,
            clock,
            accessories,
            crafting,
            meridians,
            dantian,
            soul,
            cultivation,
        })
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn subscribe(&self, topic: Topic) -> tokio::sync::broadcast::Receiver<Event> {
        self.bus.subscribe(topic)
    }

    /// One live tick: polls every slot and advances accrual to the clock.
    pub fn tick(&mut self) {
        let now_ms = self.clock.now_ms();
        let _ = self.accessories.poll(now_ms);
        while self.crafting.poll(now_ms).is_some() {}
        let _ = self.meridians.poll(now_ms);
        let _ = self.dantian.poll(now_ms);
        let _ = self.soul.poll(now_ms);
        self.cultivation.advance(now_ms);
    }

    /// Reconciles every subsystem against the current clock after a
    /// suspension gap.
    ///
    /// Failures are isolated per subsystem: one failing participant is
    /// logged and the rest still reconcile. Idempotent for an unchanged
    /// clock.
    pub fn process_idle_gains(&mut self) -> IdleOutcome {
        let now_ms = self.clock.now_ms();
        let mut participants: [&mut dyn IdleParticipant; 6] = [
            &mut self.accessories,
            &mut self.crafting,
            &mut self.meridians,
            &mut self.dantian,
            &mut self.soul,
            &mut self.cultivation,
        ];

        let mut merged = IdleOutcome::default();
        for (name, result) in reconcile_all(&mut participants, now_ms) {
            match result {
                Ok(outcome) => merged.merge(outcome),
                Err(error) => {
                    tracing::warn!(subsystem = name, %error, "idle reconciliation failed");
                }
            }
        }

        self.bus.publish(Event::new(
            Topic::Session,
            "session:idle_reconciled",
            now_ms,
            json!({
                "completed_operations": merged.completed_operations,
                "experience_gained": merged.experience_gained,
                "levels_gained": merged.levels_gained,
            }),
        ));
        merged
    }

    /// Total combat power across all subsystems.
    pub fn combat_power(&self) -> u64 {
        self.accessories.power()
            + self.meridians.power()
            + self.dantian.power()
            + self.soul.power()
            + self.cultivation.power()
    }

    /// Persists every subsystem snapshot to the store.
    pub fn save(&self) -> Result<()> {
        let store = self.store.as_ref();
        store::save(
            store,
            Accessories::STORE_KEY,
            self.accessories.state(),
            SAVE_SOURCE,
        )?;
        store::save(store, Crafting::STORE_KEY, self.crafting.state(), SAVE_SOURCE)?;
        store::save(
            store,
            Meridians::STORE_KEY,
            self.meridians.state(),
            SAVE_SOURCE,
        )?;
        store::save(store, Dantian::STORE_KEY, self.dantian.state(), SAVE_SOURCE)?;
        store::save(store, Soul::STORE_KEY, self.soul.state(), SAVE_SOURCE)?;
        store::save(
            store,
            Cultivation::STORE_KEY,
            self.cultivation.state(),
            SAVE_SOURCE,
        )?;
        self.bus.publish(Event::new(
            Topic::Session,
            "session:saved",
            self.clock.now_ms(),
            json!({}),
        ));
        Ok(())
    }
}
