//! # exprvec-cache
//!
//! Gene-keyed cache of decoded vectors, partitioned by experiment.
//!
//! ## Architecture
//!
//! ```text
//! VectorCache
//! ├── DashMap<ExperimentId, Arc<Partition>>
//! │   └── Partition (moka, bounded, LRU by default)
//! │       └── GeneId → Arc<[DecodedVector]>
//! └── CacheStats (atomic counters)
//! ```
//!
//! Invalidating an experiment swaps its partition out of the map in one
//! step, so readers see either the whole old partition or a miss.

pub mod partition;
pub mod stats;
pub mod vector_cache;

pub use partition::PartitionHandle;
pub use stats::CacheStats;
pub use vector_cache::VectorCache;
