use std::fmt;

use tracing::debug;

use exprvec_core::{Cancellation, ExperimentId, ExprResult};

/// States of one processed-vector rebuild.
///
/// `Idle → Clearing → Fetching → Masking → Materializing → Swapping →
/// Invalidated → Idle`, with `Aborted` reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RebuildState {
    Idle,
    Clearing,
    Fetching,
    Masking,
    Materializing,
    Swapping,
    Invalidated,
    Aborted,
}

impl RebuildState {
    pub fn as_str(self) -> &'static str {
        match self {
            RebuildState::Idle => "idle",
            RebuildState::Clearing => "clearing",
            RebuildState::Fetching => "fetching",
            RebuildState::Masking => "masking",
            RebuildState::Materializing => "materializing",
            RebuildState::Swapping => "swapping",
            RebuildState::Invalidated => "invalidated",
            RebuildState::Aborted => "aborted",
        }
    }

    /// The state that follows this one on success.
    pub fn next(self) -> Option<RebuildState> {
        match self {
            RebuildState::Idle => Some(RebuildState::Clearing),
            RebuildState::Clearing => Some(RebuildState::Fetching),
            RebuildState::Fetching => Some(RebuildState::Masking),
            RebuildState::Masking => Some(RebuildState::Materializing),
            RebuildState::Materializing => Some(RebuildState::Swapping),
            RebuildState::Swapping => Some(RebuildState::Invalidated),
            RebuildState::Invalidated => Some(RebuildState::Idle),
            RebuildState::Aborted => None,
        }
    }

    pub fn can_transition_to(self, to: RebuildState) -> bool {
        match to {
            // Swapping and Invalidated must run to completion once entered.
            RebuildState::Aborted => !matches!(
                self,
                RebuildState::Idle | RebuildState::Invalidated | RebuildState::Aborted
            ),
            _ => self.next() == Some(to),
        }
    }
}

impl fmt::Display for RebuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Records the path a single run takes through the state machine.
#[derive(Debug)]
pub(crate) struct StateTracker {
    experiment: ExperimentId,
    current: RebuildState,
    visited: Vec<RebuildState>,
}

impl StateTracker {
    pub(crate) fn new(experiment: ExperimentId) -> Self {
        Self {
            experiment,
            current: RebuildState::Idle,
            visited: vec![RebuildState::Idle],
        }
    }

    pub(crate) fn current(&self) -> RebuildState {
        self.current
    }

    /// Advance to the next state after a cancellation checkpoint.
    pub(crate) fn advance_checked(&mut self, cancel: &Cancellation) -> ExprResult<RebuildState> {
        cancel.check("processed vector rebuild")?;
        Ok(self.advance())
    }

    /// Advance to the next state unconditionally.
    pub(crate) fn advance(&mut self) -> RebuildState {
        let to = self.current.next().unwrap_or(RebuildState::Aborted);
        self.transition(to);
        to
    }

    pub(crate) fn abort(&mut self) {
        if self.current.can_transition_to(RebuildState::Aborted) {
            self.transition(RebuildState::Aborted);
        }
    }

    pub(crate) fn visited(&self, state: RebuildState) -> bool {
        self.visited.contains(&state)
    }

    pub(crate) fn into_path(self) -> Vec<RebuildState> {
        self.visited
    }

    fn transition(&mut self, to: RebuildState) {
        debug_assert!(
            self.current.can_transition_to(to),
            "illegal rebuild transition {} -> {}",
            self.current,
            to
        );
        debug!(
            experiment = %self.experiment,
            from = self.current.as_str(),
            to = to.as_str(),
            "rebuild state transition"
        );
        self.current = to;
        self.visited.push(to);
    }
}
