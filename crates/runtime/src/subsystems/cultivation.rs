//! Cultivation subsystem: accrual, realm breakthroughs, dual unlock.
//!
//! Wraps the progress accumulator with catalog access and the breakthrough
//! economy: attempts consume the realm's attempt cost up front, refund it in
//! full when the attempt is rejected, and recover a fraction after a failed
//! roll.

use std::sync::Arc;

use cultivation_core::catalog::{FormulaOracle, RealmOracle, TechniqueOracle};
use cultivation_core::config::EngineConfig;
use cultivation_core::effects::ChannelMultipliers;
use cultivation_core::error::{EngineError, Reject};
use cultivation_core::ledger::{ResourceId, ResourcePool};
use cultivation_core::power::{PowerProfile, RatedEntity, aggregate_power, entity_power};
use cultivation_core::progress::{
    AccrualReport, BreakthroughAttempt, BreakthroughOptions, CultivationPath, CultivationStats,
    DualUnlockStatus, PathState, ProgressAccumulator,
};
use cultivation_core::reconcile::{IdleOutcome, IdleParticipant};
use cultivation_core::rng::{PcgRoller, compute_seed};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::events::{Event, EventBus, Topic};

/// Roll context for breakthroughs (distinct from craft quality rolls).
const BREAKTHROUGH_ROLL_CONTEXT: u32 = 0;

const QI_PROFILE: PowerProfile = PowerProfile::new(10.0, 12.0, 0.0);
const BODY_PROFILE: PowerProfile = PowerProfile::new(10.0, 12.0, 0.0);
const DUAL_PROFILE: PowerProfile = PowerProfile::new(0.0, 25.0, 0.0);

/// Serializable subsystem snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CultivationState {
    pool: ResourcePool,
    accumulator: ProgressAccumulator,
    session_seed: u64,
    roll_counter: u64,
}

impl CultivationState {
    pub fn new(session_seed: u64, now_ms: u64) -> Self {
        Self {
            pool: ResourcePool::new(),
            accumulator: ProgressAccumulator::new(now_ms),
            session_seed,
            roll_counter: 0,
        }
    }
}

pub struct Cultivation {
    formulas: Arc<dyn FormulaOracle>,
    techniques: Arc<dyn TechniqueOracle>,
    realms: Arc<dyn RealmOracle>,
    config: EngineConfig,
    roller: PcgRoller,
    bus: EventBus,
    state: CultivationState,
}

impl Cultivation {
    pub const STORE_KEY: &'static str = "cultivation";

    pub fn new(
        formulas: Arc<dyn FormulaOracle>,
        techniques: Arc<dyn TechniqueOracle>,
        realms: Arc<dyn RealmOracle>,
        config: EngineConfig,
        bus: EventBus,
        state: CultivationState,
    ) -> Self {
        Self {
            formulas,
            techniques,
            realms,
            config,
            roller: PcgRoller,
            bus,
            state,
        }
    }

    pub fn state(&self) -> &CultivationState {
        &self.state
    }

    pub fn pool(&self) -> &ResourcePool {
        &self.state.pool
    }

    pub fn grant_resource(&mut self, resource: ResourceId, amount: u64) {
        self.state.pool.grant(resource, amount);
    }

    pub fn path(&self, path: CultivationPath) -> &PathState {
        self.state.accumulator.path(path)
    }

    pub fn active(&self) -> Option<CultivationPath> {
        self.state.accumulator.active()
    }

    pub fn stats(&self) -> &CultivationStats {
        self.state.accumulator.stats()
    }

    /// Selects the active path, optionally with a technique from the catalog.
    pub fn begin(
        &mut self,
        path: CultivationPath,
        technique_id: Option<&str>,
        now_ms: u64,
    ) -> Result<(), Reject> {
        // Settle accrual on the old path before switching.
        self.advance(now_ms);
        let technique = match technique_id {
            Some(id) => Some(
                self.techniques
                    .technique(id)
                    .ok_or_else(|| Reject::unknown_id(id))?
                    .clone(),
            ),
            None => None,
        };
        self.state.accumulator.start(path, technique)?;
        self.bus.publish(Event::new(
            Topic::Cultivation,
            "cultivation:started",
            now_ms,
            json!({ "path": path.to_string(), "technique": technique_id }),
        ));
        Ok(())
    }

    /// Stops accrual, flushing committable buffered progress.
    pub fn rest(&mut self, now_ms: u64) -> AccrualReport {
        self.advance(now_ms);
        let report = self.state.accumulator.stop(&*self.formulas);
        self.emit_level_ups(&report, now_ms);
        self.bus.publish(Event::new(
            Topic::Cultivation,
            "cultivation:stopped",
            now_ms,
            json!({}),
        ));
        report
    }

    /// Advances accrual to `now_ms` as one batch.
    pub fn advance(&mut self, now_ms: u64) -> AccrualReport {
        let report = self.state.accumulator.advance(now_ms, &*self.formulas);
        self.emit_level_ups(&report, now_ms);
        report
    }

    /// Advances a long idle gap in chunks.
    pub fn advance_idle(&mut self, now_ms: u64) -> AccrualReport {
        let report =
            self.state
                .accumulator
                .advance_chunked(now_ms, self.config.idle_chunk_ms, &*self.formulas);
        self.emit_level_ups(&report, now_ms);
        report
    }

    fn emit_level_ups(&self, report: &AccrualReport, now_ms: u64) {
        for gain in report.gains.iter().filter(|gain| gain.levels > 0) {
            self.bus.publish(Event::new(
                Topic::Cultivation,
                "cultivation:level_up",
                now_ms,
                json!({
                    "path": gain.path.to_string(),
                    "levels": gain.levels,
                    "level": self.state.accumulator.path(gain.path).level,
                }),
            ));
        }
    }

    pub fn dual_unlock_status(&self) -> DualUnlockStatus {
        self.state.accumulator.check_dual_unlock()
    }

    /// Unlocks dual cultivation once both paths reach the gate.
    pub fn unlock_dual(&mut self, now_ms: u64) -> bool {
        let unlocked = self.state.accumulator.unlock_dual();
        if unlocked {
            self.bus.publish(Event::new(
                Topic::Cultivation,
                "cultivation:dual_unlocked",
                now_ms,
                json!({}),
            ));
        }
        unlocked
    }

    /// Attempts a realm breakthrough on `path`.
    ///
    /// The current realm's attempt cost is consumed first; a rejected
    /// attempt refunds it in full, a failed roll recovers a fraction.
    pub fn attempt_breakthrough(
        &mut self,
        path: CultivationPath,
        forced: bool,
        now_ms: u64,
    ) -> Result<BreakthroughAttempt, Reject> {
        self.advance(now_ms);

        let level = self.state.accumulator.path(path).level;
        let realm = self
            .realms
            .realm_for_level(level)
            .ok_or(Reject::NotUnlocked {
                requirement: "a charted realm",
            })?
            .clone();

        self.state.pool.consume(&realm.attempt_cost)?;
        let seed = compute_seed(
            self.state.session_seed,
            self.state.roll_counter,
            BREAKTHROUGH_ROLL_CONTEXT,
        );
        self.state.roll_counter += 1;

        let options = BreakthroughOptions {
            forced,
            realm_index: realm.index,
            resource_bonus: 1.0,
        };
        let attempt = match self.state.accumulator.attempt_breakthrough(
            path,
            options,
            &*self.formulas,
            &self.roller,
            seed,
        ) {
            Ok(attempt) => attempt,
            Err(reject) => {
                // Rejected before the roll: the cost comes back in full.
                self.state.pool.credit(&realm.attempt_cost);
                return Err(reject);
            }
        };

        if !attempt.success {
            self.state
                .pool
                .recover(&realm.attempt_cost, EngineConfig::FAILURE_RECOVER_RATE);
        }
        self.bus.publish(Event::new(
            Topic::Cultivation,
            "cultivation:breakthrough",
            now_ms,
            json!({
                "path": path.to_string(),
                "realm": realm.id,
                "success": attempt.success,
                "perfect": attempt.perfect,
                "chance": attempt.chance,
            }),
        ));
        Ok(attempt)
    }

    /// Applies a temporary accrual effect (pill, blessing).
    pub fn apply_effect(
        &mut self,
        multipliers: ChannelMultipliers,
        duration_ms: u64,
        now_ms: u64,
    ) -> ChannelMultipliers {
        self.advance(now_ms);
        let combined = self
            .state
            .accumulator
            .apply_temporary_effect(multipliers, now_ms, duration_ms);
        self.bus.publish(Event::new(
            Topic::Cultivation,
            "cultivation:effect_applied",
            now_ms,
            json!({ "duration_ms": duration_ms }),
        ));
        combined
    }

    /// Combat power from the three path levels; dual is scaled by synergy.
    pub fn power(&self) -> u64 {
        let accumulator = &self.state.accumulator;
        let entities = vec![
            rated("qi_path", &QI_PROFILE, accumulator.path(CultivationPath::Qi), None),
            rated(
                "body_path",
                &BODY_PROFILE,
                accumulator.path(CultivationPath::Body),
                None,
            ),
            rated(
                "dual_path",
                &DUAL_PROFILE,
                accumulator.path(CultivationPath::Dual),
                Some(accumulator.synergy()),
            ),
        ];
        aggregate_power(&entities, &[])
    }
}

fn rated(
    id: &str,
    profile: &PowerProfile,
    state: &PathState,
    density: Option<f64>,
) -> RatedEntity {
    RatedEntity::new(id, entity_power(profile, state.level, 0, density), state.level)
}

impl IdleParticipant for Cultivation {
    fn name(&self) -> &'static str {
        "cultivation"
    }

    fn reconcile(&mut self, now_ms: u64) -> Result<IdleOutcome, EngineError> {
        let report = self.advance_idle(now_ms);
        let mut outcome = IdleOutcome::default();
        for gain in &report.gains {
            outcome.experience_gained += gain.experience;
            outcome.levels_gained += gain.levels;
        }
        Ok(outcome)
    }
}
