//! # exprvec-observability
//!
//! Structured tracing setup and span definitions shared by the processing
//! and retrieval crates.

pub mod tracing_setup;

pub use tracing_setup::{init_from_config, init_tracing, init_tracing_with_filter};
