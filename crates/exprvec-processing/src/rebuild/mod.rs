//! Processed-vector rebuild: a per-experiment state machine.
//!
//! ```text
//! Idle → Clearing → Fetching → Masking → Materializing → Swapping → Invalidated → Idle
//!            └──────────┴──────────┴────────────┴─────────────┴──→ Aborted
//! ```

mod guard;
mod materialize;
mod report;
mod state;
mod workflow;

pub use guard::RebuildGuards;
pub use report::RebuildReport;
pub use state::RebuildState;
pub use workflow::RebuildWorkflow;
