use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults;

/// Eviction policy applied inside each per-experiment partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvictionPolicyKind {
    Lru,
    TinyLfu,
}

/// Vector cache configuration. Read once at cache construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Max gene entries held per experiment partition.
    pub max_entries_per_partition: u64,
    /// Entry lifetime in seconds. 0 = unbounded.
    pub time_to_live_secs: u64,
    /// Entry idle lifetime in seconds. 0 = unbounded.
    pub time_to_idle_secs: u64,
    pub eviction_policy: EvictionPolicyKind,
}

impl CacheConfig {
    pub fn time_to_live(&self) -> Option<Duration> {
        (self.time_to_live_secs > 0).then(|| Duration::from_secs(self.time_to_live_secs))
    }

    pub fn time_to_idle(&self) -> Option<Duration> {
        (self.time_to_idle_secs > 0).then(|| Duration::from_secs(self.time_to_idle_secs))
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries_per_partition: defaults::DEFAULT_MAX_ENTRIES_PER_PARTITION,
            time_to_live_secs: defaults::DEFAULT_TIME_TO_LIVE_SECS,
            time_to_idle_secs: defaults::DEFAULT_TIME_TO_IDLE_SECS,
            eviction_policy: EvictionPolicyKind::Lru,
        }
    }
}
