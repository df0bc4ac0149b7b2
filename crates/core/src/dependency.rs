// SPDX-License-Identifier: MIT

//! Directed edges between jobs, qualified by the parent terminal state that
//! satisfies them (spec §4.3).

use std::sync::Arc;

use crate::event::StateEvents;
use crate::id_types::JobId;
use crate::state::DependencyState;

/// `(parent, child, required_state)`. `wait()` blocks on the parent's
/// one-shot event for `required_state`, so ordering across a job's several
/// inbound dependencies doesn't matter — each is independent and monotonic.
#[derive(Debug, Clone)]
pub struct Dependency {
    pub parent: JobId,
    pub child: JobId,
    pub required_state: DependencyState,
    parent_events: Arc<StateEvents>,
}

impl Dependency {
    pub fn new(
        parent: JobId,
        child: JobId,
        required_state: DependencyState,
        parent_events: Arc<StateEvents>,
    ) -> Self {
        Self {
            parent,
            child,
            required_state,
            parent_events,
        }
    }

    /// Block until the parent reaches `required_state` — or, per spec §4.3,
    /// until cancellation propagation sets CANCELLED on the parent so the
    /// waiter can unblock and observe it will never be satisfied.
    pub async fn wait(&self) {
        self.parent_events
            .wait_for(self.required_state.as_job_state())
            .await;
    }

}

#[cfg(test)]
#[path = "dependency_tests.rs"]
mod tests;
