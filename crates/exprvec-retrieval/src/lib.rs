//! # exprvec-retrieval
//!
//! The public read path: decoded vectors for (experiments or sub-cohorts) ×
//! genes.
//!
//! ## Architecture
//!
//! ```text
//! RetrievalCoordinator::retrieve
//! ├── resolve sub-cohorts → source experiments
//! ├── VectorCache partition handles (hits)
//! ├── misses → gene→probe map → BatchRetriever::fetch
//! │   └── decode → put under every annotated gene
//! ├── slicing::slice (sub-cohort elements only, never cached)
//! └── dedup by (probe, owner)
//! ```

pub mod coordinator;
mod decode;
pub mod slicing;

pub use coordinator::RetrievalCoordinator;
pub use slicing::slice;
