use serde::{Deserialize, Serialize};

use super::defaults;

/// Processed-vector rebuild configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RebuildConfig {
    /// Fail the rebuild when a two-channel probe has no presence vector,
    /// instead of warning and treating it as fully present.
    pub strict_missing_presence: bool,
    /// Compute expression ranks on materialization.
    pub compute_ranks: bool,
}

impl Default for RebuildConfig {
    fn default() -> Self {
        Self {
            strict_missing_presence: defaults::DEFAULT_STRICT_MISSING_PRESENCE,
            compute_ranks: defaults::DEFAULT_COMPUTE_RANKS,
        }
    }
}
