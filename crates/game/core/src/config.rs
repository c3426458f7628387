/// Engine configuration constants and tunable parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineConfig {
    /// Delay inserted between a completed craft and the next queued one.
    pub craft_chain_delay_ms: u64,

    /// Maximum sub-batch size when reconciling very large idle gaps.
    ///
    /// Level-dependent rates are sampled once per chunk, so smaller chunks
    /// bound the approximation error at the cost of more iterations.
    pub idle_chunk_ms: u64,
}

impl EngineConfig {
    // ===== compile-time constants used as type parameters =====
    /// Crafting queue capacity. `start` on a full queue fails with `QueueFull`.
    pub const CRAFT_QUEUE_CAPACITY: usize = 5;

    // ===== progression thresholds =====
    /// Qi and body level both required at or above this to unlock dual cultivation.
    pub const DUAL_UNLOCK_LEVEL: u32 = 25;
    /// A successful breakthrough rolled at or above this chance counts as perfect.
    pub const PERFECT_CHANCE: f64 = 0.95;
    /// Fraction of experience retained after a failed breakthrough.
    pub const FAILED_BREAKTHROUGH_RETAIN: f64 = 0.9;
    /// Base-rate multiplier applied on every successful breakthrough.
    pub const BREAKTHROUGH_RATE_GAIN: f64 = 1.05;

    // ===== resource return rates =====
    /// Fraction of consumed requirements returned when an operation is cancelled.
    pub const CANCEL_REFUND_RATE: f64 = 0.75;
    /// Fraction of consumed requirements returned after a failed probabilistic roll.
    pub const FAILURE_RECOVER_RATE: f64 = 0.25;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_CRAFT_CHAIN_DELAY_MS: u64 = 500;
    pub const DEFAULT_IDLE_CHUNK_MS: u64 = 6 * 60 * 60 * 1000;

    pub fn new() -> Self {
        Self {
            craft_chain_delay_ms: Self::DEFAULT_CRAFT_CHAIN_DELAY_MS,
            idle_chunk_ms: Self::DEFAULT_IDLE_CHUNK_MS,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}
