// Single source of truth for all default values.

// --- Cache ---
pub const DEFAULT_MAX_ENTRIES_PER_PARTITION: u64 = 500;
pub const DEFAULT_TIME_TO_LIVE_SECS: u64 = 0; // unbounded
pub const DEFAULT_TIME_TO_IDLE_SECS: u64 = 0; // unbounded

// --- Retrieval ---
pub const DEFAULT_BATCH_SIZE: usize = 500;
pub const MIN_BATCH_SIZE: usize = 100;
pub const MAX_BATCH_SIZE: usize = 2_000;
pub const DEFAULT_PARALLEL_BATCHES: bool = true;

// --- Rebuild ---
pub const DEFAULT_STRICT_MISSING_PRESENCE: bool = false;
pub const DEFAULT_COMPUTE_RANKS: bool = true;

// --- Storage ---
pub const DEFAULT_DB_FILENAME: &str = "exprvec.db";
pub const DEFAULT_BUSY_TIMEOUT_MS: u32 = 5_000;
pub const DEFAULT_READ_POOL_SIZE: usize = 4;

// --- Observability ---
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_LOG_JSON: bool = true;
