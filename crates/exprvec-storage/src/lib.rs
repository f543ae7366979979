//! # exprvec-storage
//!
//! SQLite backing store for the expression vector engine.
//!
//! ```text
//! StorageEngine ─── IVectorStore
//!   └── ConnectionPool
//!         ├── WriteConnection   (one, serialized)
//!         └── ReadPool          (round-robin, WAL readers)
//! ```
//!
//! Every vector blob is stored next to its blake3 checksum and verified on
//! load. Replacing an experiment's processed vectors is one transaction.

pub mod engine;
pub mod migrations;
pub mod pool;
pub mod queries;

pub use engine::StorageEngine;

use exprvec_core::errors::{ExprError, StorageError};

/// Convert a SQLite error message into the engine's storage error.
pub fn to_storage_err(message: String) -> ExprError {
    ExprError::StorageError(StorageError::SqliteError { message })
}
