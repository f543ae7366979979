//! # exprvec-processing
//!
//! Turns an experiment's raw vectors into its processed (masked-preferred)
//! vectors, and fetches stored vectors in bounded batches.
//!
//! ## Architecture
//!
//! ```text
//! RebuildWorkflow
//! ├── RebuildGuards (one rebuild per experiment at a time)
//! ├── BatchRetriever (preferred + presence-call raw vectors)
//! ├── MaskingPipeline (signal ⊗ presence → NaN-masked doubles)
//! ├── ranks (expression rank by mean / max)
//! └── VectorCache::invalidate (after the swap)
//! ```

pub mod batch;
pub mod masking;
pub mod ranks;
pub mod rebuild;

pub use batch::{BatchRetriever, Fetched};
pub use masking::{MaskingOutcome, MaskingPipeline, SignalVector};
pub use rebuild::{RebuildGuards, RebuildReport, RebuildState, RebuildWorkflow};
