use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use exprvec_core::{DescriptorId, ExperimentId, ProbeId};

use super::state::RebuildState;

/// Outcome of a successful rebuild.
#[derive(Debug, Clone)]
pub struct RebuildReport {
    pub run_id: Uuid,
    pub experiment: ExperimentId,
    /// The newly registered masked-preferred descriptor.
    pub descriptor: DescriptorId,
    pub vectors_removed: usize,
    pub vectors_created: usize,
    /// Values set to NaN by the presence calls.
    pub masked_values: usize,
    /// Two-channel probes that had no presence vector and were left unmasked.
    pub probes_without_presence: Vec<ProbeId>,
    pub two_channel: bool,
    /// States visited, in order, starting and ending at `Idle`.
    pub states: Vec<RebuildState>,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
}

impl RebuildReport {
    pub fn is_complete(&self) -> bool {
        self.states.last() == Some(&RebuildState::Idle)
            && self.states.contains(&RebuildState::Invalidated)
    }
}
