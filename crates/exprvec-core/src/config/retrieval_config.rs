use serde::{Deserialize, Serialize};

use super::defaults;

/// Batch retrieval configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Probes per store round trip. Clamped to the supported range on use.
    pub batch_size: usize,
    /// Issue batches concurrently.
    pub parallel_batches: bool,
}

impl RetrievalConfig {
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size
            .clamp(defaults::MIN_BATCH_SIZE, defaults::MAX_BATCH_SIZE)
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            batch_size: defaults::DEFAULT_BATCH_SIZE,
            parallel_batches: defaults::DEFAULT_PARALLEL_BATCHES,
        }
    }
}
