// SPDX-License-Identifier: MIT

//! A single unit of work: either an external command or a delegate to a
//! sub-tree, carrying the state machine from spec §4.1.

use std::path::PathBuf;
use std::sync::atomic::{AtomicI32, AtomicU64, Ordering};
use std::sync::Arc;

use jobtree_core::{JobId, JobState, Resource, StateEvents, TreeId};
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::errors::EngineError;

/// Which collaborator a job delegates execution to.
#[derive(Debug, Clone)]
pub enum RunnerKind {
    Command { path: String, args: Vec<String> },
    Subtree(TreeId),
}

/// The undefined-job sentinel path (spec §3): a job whose `command-path` is
/// exactly `"-"` is a no-op, trivially successful for downstream waits.
pub const UNDEF_PATH: &str = "-";

#[derive(Debug)]
pub struct Job {
    id: JobId,
    name: String,
    runner: Mutex<RunnerKind>,
    must_complete: bool,
    resources: Vec<Arc<Resource>>,
    log_path: Option<PathBuf>,
    exec_count: AtomicU64,
    fail_count: AtomicU64,
    progress: AtomicI32,
    state: Mutex<JobState>,
    events: Arc<StateEvents>,
}

impl Job {
    /// Build a job that runs an external command. A `path` of `"-"` starts
    /// the job already `Undef`.
    pub fn command(
        name: impl Into<String>,
        path: impl Into<String>,
        args: Vec<String>,
        must_complete: bool,
        resources: Vec<Arc<Resource>>,
        log_path: Option<PathBuf>,
    ) -> Arc<Self> {
        Self::command_with_id(JobId::new(), name, path, args, must_complete, resources, log_path)
    }

    /// Like [`Job::command`], but with an identity supplied by the caller —
    /// used by `jobtree-codec` to preserve the `uuid` a document assigns a
    /// job across parse/serialize round-trips.
    #[allow(clippy::too_many_arguments)]
    pub fn command_with_id(
        id: JobId,
        name: impl Into<String>,
        path: impl Into<String>,
        args: Vec<String>,
        must_complete: bool,
        resources: Vec<Arc<Resource>>,
        log_path: Option<PathBuf>,
    ) -> Arc<Self> {
        let path = path.into();
        let initial_state = if path == UNDEF_PATH {
            JobState::Undef
        } else {
            JobState::Idle
        };
        Arc::new(Self {
            id,
            name: name.into(),
            runner: Mutex::new(RunnerKind::Command { path, args }),
            must_complete,
            resources,
            log_path,
            exec_count: AtomicU64::new(0),
            fail_count: AtomicU64::new(0),
            progress: AtomicI32::new(0),
            state: Mutex::new(initial_state),
            events: StateEvents::new(),
        })
    }

    /// Build a job that delegates to a sub-tree.
    pub fn subtree(
        name: impl Into<String>,
        subtree: TreeId,
        must_complete: bool,
        resources: Vec<Arc<Resource>>,
        log_path: Option<PathBuf>,
    ) -> Arc<Self> {
        Self::subtree_with_id(JobId::new(), name, subtree, must_complete, resources, log_path)
    }

    /// Like [`Job::subtree`], but with an identity supplied by the caller.
    pub fn subtree_with_id(
        id: JobId,
        name: impl Into<String>,
        subtree: TreeId,
        must_complete: bool,
        resources: Vec<Arc<Resource>>,
        log_path: Option<PathBuf>,
    ) -> Arc<Self> {
        Arc::new(Self {
            id,
            name: name.into(),
            runner: Mutex::new(RunnerKind::Subtree(subtree)),
            must_complete,
            resources,
            log_path,
            exec_count: AtomicU64::new(0),
            fail_count: AtomicU64::new(0),
            progress: AtomicI32::new(0),
            state: Mutex::new(JobState::Idle),
            events: StateEvents::new(),
        })
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn must_complete(&self) -> bool {
        self.must_complete
    }

    pub fn resources(&self) -> &[Arc<Resource>] {
        &self.resources
    }

    pub fn log_path(&self) -> Option<&PathBuf> {
        self.log_path.as_ref()
    }

    pub fn events(&self) -> Arc<StateEvents> {
        self.events.clone()
    }

    pub fn state(&self) -> JobState {
        *self.state.lock()
    }

    pub fn is_defined(&self) -> bool {
        self.state().is_defined()
    }

    pub fn runner_kind(&self) -> RunnerKind {
        self.runner.lock().clone()
    }

    pub fn exec_count(&self) -> u64 {
        self.exec_count.load(Ordering::Acquire)
    }

    pub fn fail_count(&self) -> u64 {
        self.fail_count.load(Ordering::Acquire)
    }

    pub fn progress(&self) -> i32 {
        self.progress.load(Ordering::Acquire)
    }

    /// Set progress, clamped to `[-1, 100]` (spec §3); `-1` means unknown.
    pub fn set_progress(&self, value: i32) {
        self.progress.store(value.clamp(-1, 100), Ordering::Release);
    }

    pub(crate) fn record_exec(&self) {
        self.exec_count.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn record_fail(&self) {
        self.fail_count.fetch_add(1, Ordering::AcqRel);
    }

    /// Mutate `command-path`, only legal while `PRESTART` (spec §3). Setting
    /// it to `"-"` while `IDLE` transitions the job to `UNDEF`.
    pub fn set_command_path(&self, new_path: impl Into<String>) -> Result<(), EngineError> {
        let current = self.state();
        if !current.is_prestart() {
            return Err(EngineError::NotPrestart(self.id));
        }
        let new_path = new_path.into();
        let mut runner = self.runner.lock();
        match &mut *runner {
            RunnerKind::Command { path, .. } => {
                let becomes_undef = current == JobState::Idle && new_path == UNDEF_PATH;
                *path = new_path;
                drop(runner);
                if becomes_undef {
                    self.transition(JobState::Undef);
                }
                Ok(())
            }
            RunnerKind::Subtree(_) => Err(EngineError::AmbiguousRunner(self.id)),
        }
    }

    /// Centralized state mutation: every transition fires the destination
    /// state's event plus `state-changed` (spec §4.1, last line).
    pub(crate) fn transition(&self, new_state: JobState) {
        *self.state.lock() = new_state;
        trace!(job = %self.name, state = %new_state, "job state transition");
        self.events.fire(new_state);
    }

    /// `cancel()`: advisory, applies only to not-yet-started jobs
    /// (spec §4.1, §5). Returns whether the job ended up cancelled or done.
    pub fn cancel(&self) -> bool {
        let current = self.state();
        if current == JobState::Running {
            return false;
        }
        if current.is_done() {
            return true;
        }
        debug!(job = %self.name, "cancelling job");
        self.transition(JobState::Cancelled);
        true
    }

    /// `reset()`: no-op on `UNDEF`; otherwise clears every per-state event,
    /// clamps `progress` down to zero, and sets state to `RESET`.
    pub fn reset(&self) {
        if self.state() == JobState::Undef {
            return;
        }
        self.events.clear_all();
        let current_progress = self.progress();
        if current_progress > 0 {
            self.progress.store(0, Ordering::Release);
        }
        *self.state.lock() = JobState::Reset;
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
