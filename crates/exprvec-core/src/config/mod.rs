//! Engine configuration, loadable from TOML.

mod cache_config;
pub mod defaults;
mod observability_config;
mod rebuild_config;
mod retrieval_config;
mod storage_config;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use cache_config::{CacheConfig, EvictionPolicyKind};
pub use observability_config::ObservabilityConfig;
pub use rebuild_config::RebuildConfig;
pub use retrieval_config::RetrievalConfig;
pub use storage_config::StorageConfig;

use crate::errors::{ExprError, ExprResult};

/// Top-level configuration. Every section and field is optional in TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExprConfig {
    pub cache: CacheConfig,
    pub retrieval: RetrievalConfig,
    pub rebuild: RebuildConfig,
    pub storage: StorageConfig,
    pub observability: ObservabilityConfig,
}

impl ExprConfig {
    /// Parse a (possibly partial) TOML document and validate it.
    pub fn from_toml(source: &str) -> ExprResult<Self> {
        let config: ExprConfig = toml::from_str(source).map_err(|e| ExprError::Config {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> ExprResult<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| ExprError::Config {
            reason: format!("{}: {e}", path.display()),
        })?;
        Self::from_toml(&source)
    }

    pub fn validate(&self) -> ExprResult<()> {
        if self.cache.max_entries_per_partition == 0 {
            return Err(ExprError::Config {
                reason: "cache.max_entries_per_partition must be positive".to_string(),
            });
        }
        if self.retrieval.batch_size == 0 {
            return Err(ExprError::Config {
                reason: "retrieval.batch_size must be positive".to_string(),
            });
        }
        if self.storage.read_pool_size == 0 {
            return Err(ExprError::Config {
                reason: "storage.read_pool_size must be positive".to_string(),
            });
        }
        Ok(())
    }
}
