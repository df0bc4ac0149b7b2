// SPDX-License-Identifier: MIT

//! Job state machine (spec §4.1) and the derived state sets used throughout
//! dependency waiting, validation, and tree completion.

use serde::{Deserialize, Serialize};

/// A job's position in its state machine.
///
/// Transitions are driven by [`crate::event::StateEvents`] — every mutation
/// also fires the destination state's one-shot event and the broadcast
/// `state-changed` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobState {
    /// Initial. Eligible to start once parents are satisfied.
    Idle,
    /// Waiting to acquire one or more resources.
    Blocked,
    /// Runner in progress.
    Running,
    /// Runner finished with exit 0, or a sub-tree reported success.
    Successful,
    /// Runner finished non-zero, or resource acquisition permanently failed.
    Failed,
    /// Marked cancelled before starting.
    Cancelled,
    /// No-op job (`command-path == "-"`).
    Undef,
    /// Intermediate label used by `reset`; equivalent to `Idle` for scheduling.
    Reset,
}

crate::simple_display! {
    JobState {
        Idle => "idle",
        Blocked => "blocked",
        Running => "running",
        Successful => "successful",
        Failed => "failed",
        Cancelled => "cancelled",
        Undef => "undef",
        Reset => "reset",
    }
}

impl JobState {
    /// `DONE = {SUCCESSFUL, FAILED, CANCELLED, UNDEF}`
    pub fn is_done(self) -> bool {
        matches!(
            self,
            JobState::Successful | JobState::Failed | JobState::Cancelled | JobState::Undef
        )
    }

    /// `SUCCESS = {SUCCESSFUL, UNDEF}`
    pub fn is_success(self) -> bool {
        matches!(self, JobState::Successful | JobState::Undef)
    }

    /// `PRESTART = {IDLE, UNDEF, BLOCKED}` — the only states in which
    /// `command-path` may still be mutated.
    pub fn is_prestart(self) -> bool {
        matches!(self, JobState::Idle | JobState::Undef | JobState::Blocked)
    }

    pub fn is_failed(self) -> bool {
        matches!(self, JobState::Failed)
    }

    pub fn is_cancelled(self) -> bool {
        matches!(self, JobState::Cancelled)
    }

    /// A "defined" job performs real work; an `Undef` job is a no-op.
    pub fn is_defined(self) -> bool {
        !matches!(self, JobState::Undef)
    }

    /// The color a diagram renderer would use for this state, carried from
    /// the original implementation's `STATE_COLORS` table and surfaced in the
    /// JSON status document (spec §6).
    pub fn status_color(self) -> &'static str {
        match self {
            JobState::Idle => "white",
            JobState::Running => "yellow",
            JobState::Successful => "lawngreen",
            JobState::Failed => "red",
            JobState::Cancelled => "deepskyblue",
            JobState::Undef => "gray",
            JobState::Blocked => "darkorange",
            JobState::Reset => "white",
        }
    }

    /// All eight states, for iterating event tables.
    pub const ALL: [JobState; 8] = [
        JobState::Idle,
        JobState::Blocked,
        JobState::Running,
        JobState::Successful,
        JobState::Failed,
        JobState::Cancelled,
        JobState::Undef,
        JobState::Reset,
    ];
}

/// The subset of [`JobState`] a [`crate::dependency::Dependency`] may require
/// of its parent — spec §3 restricts this to the two "dependency-satisfying"
/// states, unlike the original source which (questionably) accepted any of
/// the eight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DependencyState {
    Successful,
    Failed,
}

crate::simple_display! {
    DependencyState {
        Successful => "successful",
        Failed => "failed",
    }
}

impl DependencyState {
    pub fn as_job_state(self) -> JobState {
        match self {
            DependencyState::Successful => JobState::Successful,
            DependencyState::Failed => JobState::Failed,
        }
    }
}

impl TryFrom<JobState> for DependencyState {
    type Error = crate::errors::DagError;

    fn try_from(state: JobState) -> Result<Self, Self::Error> {
        match state {
            JobState::Successful => Ok(DependencyState::Successful),
            JobState::Failed => Ok(DependencyState::Failed),
            other => Err(crate::errors::DagError::InvalidDependencyState {
                state: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
