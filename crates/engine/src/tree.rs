// SPDX-License-Identifier: MIT

//! The job/dependency/resource container that owns the run loop, validation,
//! and sub-tree iteration (spec §4.4–§4.7).

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use jobtree_core::{ArgIterator, Dependency, DependencyState, JobId, JobState, OnceFlag, Resource, ResourceId, TreeId};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::errors::EngineError;
use crate::job::{Job, RunnerKind};
use crate::runner::{RunRequest, Runner};

pub struct Tree {
    id: TreeId,
    name: String,
    cwd: PathBuf,
    waitsuccess: bool,
    max_attempts: u32,
    jobs: HashMap<JobId, Arc<Job>>,
    dependencies: Vec<Dependency>,
    resources: Vec<Arc<Resource>>,
    subtrees: HashMap<TreeId, Arc<Tree>>,
    iterator: Option<ArgIterator>,
    legend: Mutex<HashMap<String, String>>,
    done: OnceFlag,
    cancelled: AtomicBool,
    started: AtomicBool,
    runner: Arc<dyn Runner>,
}

/// Declares one inbound edge while a tree is being assembled, before parent
/// job lookups are resolved into live [`Dependency`] handles.
pub struct DependencySpec {
    pub parent: JobId,
    pub child: JobId,
    pub required_state: DependencyState,
}

const DEFAULT_MAX_ATTEMPTS: u32 = 1000;

impl Tree {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        cwd: PathBuf,
        waitsuccess: bool,
        jobs: Vec<Arc<Job>>,
        dependency_specs: Vec<DependencySpec>,
        resources: Vec<Arc<Resource>>,
        subtrees: Vec<Arc<Tree>>,
        iterator: Option<ArgIterator>,
        runner: Arc<dyn Runner>,
    ) -> Result<Arc<Self>, EngineError> {
        Self::new_with_id(
            TreeId::new(),
            name,
            cwd,
            waitsuccess,
            jobs,
            dependency_specs,
            resources,
            subtrees,
            iterator,
            runner,
        )
    }

    /// Like [`Tree::new`], but with an identity supplied by the caller —
    /// used by `jobtree-codec` to preserve a document's `uuid` attribute.
    #[allow(clippy::too_many_arguments)]
    pub fn new_with_id(
        id: TreeId,
        name: impl Into<String>,
        cwd: PathBuf,
        waitsuccess: bool,
        jobs: Vec<Arc<Job>>,
        dependency_specs: Vec<DependencySpec>,
        resources: Vec<Arc<Resource>>,
        subtrees: Vec<Arc<Tree>>,
        iterator: Option<ArgIterator>,
        runner: Arc<dyn Runner>,
    ) -> Result<Arc<Self>, EngineError> {
        let job_map: HashMap<JobId, Arc<Job>> = jobs.into_iter().map(|j| (j.id(), j)).collect();

        let mut dependencies = Vec::with_capacity(dependency_specs.len());
        for spec in dependency_specs {
            let parent = job_map
                .get(&spec.parent)
                .ok_or(EngineError::Dag(jobtree_core::DagError::JobNotFound(spec.parent)))?;
            dependencies.push(Dependency::new(
                spec.parent,
                spec.child,
                spec.required_state,
                parent.events(),
            ));
        }

        let subtree_map = subtrees.into_iter().map(|t| (t.id, t)).collect();

        Ok(Arc::new(Self {
            id,
            name: name.into(),
            cwd,
            waitsuccess,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            jobs: job_map,
            dependencies,
            resources,
            subtrees: subtree_map,
            iterator,
            legend: Mutex::new(HashMap::new()),
            done: OnceFlag::new(),
            cancelled: AtomicBool::new(false),
            started: AtomicBool::new(false),
            runner,
        }))
    }

    pub fn id(&self) -> TreeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cwd(&self) -> &PathBuf {
        &self.cwd
    }

    pub fn waitsuccess(&self) -> bool {
        self.waitsuccess
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    pub fn jobs(&self) -> impl std::iter::Iterator<Item = &Arc<Job>> {
        self.jobs.values()
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    pub fn resources(&self) -> &[Arc<Resource>] {
        &self.resources
    }

    pub fn subtrees(&self) -> impl std::iter::Iterator<Item = &Arc<Tree>> {
        self.subtrees.values()
    }

    pub fn set_legend(&self, key: impl Into<String>, value: impl Into<String>) {
        self.legend.lock().insert(key.into(), value.into());
    }

    pub fn legend(&self) -> HashMap<String, String> {
        self.legend.lock().clone()
    }

    // ---- traversal helpers (spec §4.7) ----

    pub fn find_job(&self, id: JobId) -> Option<Arc<Job>> {
        if let Some(job) = self.jobs.get(&id) {
            return Some(job.clone());
        }
        self.subtrees.values().find_map(|t| t.find_job(id))
    }

    pub fn find_resource(&self, id: ResourceId) -> Option<Arc<Resource>> {
        if let Some(resource) = self.resources.iter().find(|r| r.id() == id) {
            return Some(resource.clone());
        }
        self.subtrees.values().find_map(|t| t.find_resource(id))
    }

    pub fn find_subtree(&self, id: TreeId) -> Option<Arc<Tree>> {
        if let Some(tree) = self.subtrees.get(&id) {
            return Some(tree.clone());
        }
        self.subtrees.values().find_map(|t| t.find_subtree(id))
    }

    /// Every job in this tree and, recursively, every nested sub-tree.
    pub fn all_jobs(&self) -> Vec<Arc<Job>> {
        let mut out: Vec<Arc<Job>> = self.jobs.values().cloned().collect();
        for subtree in self.subtrees.values() {
            out.extend(subtree.all_jobs());
        }
        out
    }

    pub fn parents_of(&self, job: JobId) -> Vec<JobId> {
        self.dependencies
            .iter()
            .filter(|d| d.child == job)
            .map(|d| d.parent)
            .collect()
    }

    pub fn children_of(&self, job: JobId) -> Vec<JobId> {
        self.dependencies
            .iter()
            .filter(|d| d.parent == job)
            .map(|d| d.child)
            .collect()
    }

    fn has_defined_ancestors(&self, job: JobId, memo: &mut HashMap<JobId, bool>) -> bool {
        if let Some(cached) = memo.get(&job) {
            return *cached;
        }
        // break potential cycles defensively; validate() catches real cycles
        // separately via DFS, this just needs to not infinite-loop here.
        memo.insert(job, false);
        let result = self.parents_of(job).into_iter().any(|parent| {
            self.jobs
                .get(&parent)
                .map(|p| p.is_defined())
                .unwrap_or(false)
                || self.has_defined_ancestors(parent, memo)
        });
        memo.insert(job, result);
        result
    }

    pub fn stems(&self) -> Vec<JobId> {
        let mut memo = HashMap::new();
        self.jobs
            .values()
            .filter(|job| job.is_defined() && !self.has_defined_ancestors(job.id(), &mut memo))
            .map(|job| job.id())
            .collect()
    }

    pub fn leaves(&self) -> Vec<JobId> {
        self.jobs
            .keys()
            .copied()
            .filter(|id| self.children_of(*id).is_empty())
            .collect()
    }

    // ---- validation (spec §4.4) ----

    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let stems = self.stems();
        match stems.len() {
            0 => errors.push(format!("tree {}: empty", self.name)),
            1 => {
                let mut on_path = HashSet::new();
                let mut visited = HashSet::new();
                self.dfs_validate(stems[0], &mut on_path, &mut visited, &mut errors);
                let defined: HashSet<JobId> = self
                    .jobs
                    .values()
                    .filter(|j| j.is_defined())
                    .map(|j| j.id())
                    .collect();
                let unreached: Vec<&str> = defined
                    .difference(&visited)
                    .filter_map(|id| self.jobs.get(id).map(|j| j.name()))
                    .collect();
                if !unreached.is_empty() {
                    errors.push(format!(
                        "tree {}: not connected: {}",
                        self.name,
                        unreached.join(", ")
                    ));
                }
            }
            _ => errors.push(format!("tree {}: multiple stems", self.name)),
        }

        for job in self.jobs.values() {
            self.validate_job(job, &mut errors);
        }

        if let Some(iterator) = &self.iterator {
            if iterator.is_empty() {
                errors.push(format!("tree {}: iterator has no arguments", self.name));
            }
        }

        for subtree in self.subtrees.values() {
            errors.extend(subtree.validate());
        }

        errors
    }

    fn dfs_validate(
        &self,
        job: JobId,
        on_path: &mut HashSet<JobId>,
        visited: &mut HashSet<JobId>,
        errors: &mut Vec<String>,
    ) {
        if on_path.contains(&job) {
            errors.push(format!("tree {}: has cycles", self.name));
            return;
        }
        if !visited.insert(job) {
            return;
        }
        on_path.insert(job);
        for child in self.children_of(job) {
            self.dfs_validate(child, on_path, visited, errors);
        }
        on_path.remove(&job);
    }

    fn validate_job(&self, job: &Arc<Job>, errors: &mut Vec<String>) {
        match job.runner_kind() {
            RunnerKind::Command { path, .. } => {
                if path != crate::job::UNDEF_PATH {
                    let p = std::path::Path::new(&path);
                    let executable = p
                        .metadata()
                        .map(|m| {
                            #[cfg(unix)]
                            {
                                use std::os::unix::fs::PermissionsExt;
                                m.permissions().mode() & 0o111 != 0
                            }
                            #[cfg(not(unix))]
                            {
                                m.is_file()
                            }
                        })
                        .unwrap_or(false);
                    if !executable {
                        errors.push(format!(
                            "job {}: command path {path} does not exist or is not executable",
                            job.name()
                        ));
                    }
                }
            }
            RunnerKind::Subtree(id) => {
                if self.subtrees.get(&id).is_none() && self.find_subtree(id).is_none() {
                    errors.push(format!(
                        "job {}: sub-tree reference {id} not found",
                        job.name()
                    ));
                }
            }
        }
    }

    // ---- completion and cancellation (spec §4.5) ----

    pub fn is_success(&self) -> bool {
        self.jobs
            .values()
            .filter(|j| j.must_complete())
            .all(|j| j.state().is_success())
    }

    /// Re-evaluate whether every must-complete job has reached its required
    /// terminal condition; if so, latch `done` and quiesce stragglers.
    pub fn reevaluate_done(self: &Arc<Self>) {
        let ready = self.jobs.values().filter(|j| j.must_complete()).all(|job| {
            let state = job.state();
            if !self.is_cancelled() && self.waitsuccess && !state.is_success() {
                return false;
            }
            state.is_done()
        });

        if ready {
            if !self.done.is_set() {
                info!(tree = %self.name, "tree run complete");
            }
            self.done.set();
            self.cancel();
        }
    }

    /// Idempotent: marks the tree cancelled, cancels every job (no-op on
    /// running ones), recurses into sub-trees, then re-checks completion.
    pub fn cancel(self: &Arc<Self>) {
        let was_cancelled = self.cancelled.swap(true, Ordering::AcqRel);
        if !was_cancelled {
            debug!(tree = %self.name, "cancelling tree");
        }
        for job in self.jobs.values() {
            job.cancel();
        }
        for subtree in self.subtrees.values() {
            subtree.cancel();
        }
        self.reevaluate_done_quiet();
    }

    /// Like `reevaluate_done` but does not recurse into `cancel()` again —
    /// used internally by `cancel()` itself to avoid infinite recursion.
    fn reevaluate_done_quiet(&self) {
        let ready = self.jobs.values().filter(|j| j.must_complete()).all(|job| {
            let state = job.state();
            if !self.is_cancelled() && self.waitsuccess && !state.is_success() {
                return false;
            }
            state.is_done()
        });
        if ready {
            self.done.set();
        }
    }

    pub fn is_done(&self) -> bool {
        self.done.is_set()
    }

    // ---- run loop (spec §4.5) ----

    pub async fn run(self: &Arc<Self>, blocking: bool, timeout: Option<Duration>) -> bool {
        self.run_with(&[], blocking, timeout).await
    }

    fn run_with<'a>(
        self: &'a Arc<Self>,
        inherited: &'a [String],
        blocking: bool,
        timeout: Option<Duration>,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = bool> + Send + 'a>> {
        Box::pin(self.run_with_inner(inherited, blocking, timeout))
    }

    async fn run_with_inner(self: &Arc<Self>, inherited: &[String], blocking: bool, timeout: Option<Duration>) -> bool {
        if self.is_cancelled() {
            return self.done.is_set();
        }

        let mut own_args = inherited.to_vec();
        if let Some(arg) = self.iterator.as_ref().and_then(|it| it.current_arg()) {
            own_args.push(arg.to_string());
        }
        let own_args = Arc::new(own_args);

        self.started.store(true, Ordering::Release);
        info!(tree = %self.name, jobs = self.jobs.len(), "starting tree run");

        for job in self.jobs.values().cloned() {
            let tree = self.clone();
            let args = own_args.clone();
            tokio::spawn(async move {
                tree.start_job(job, args).await;
            });
        }

        if blocking {
            match timeout {
                Some(duration) => {
                    if tokio::time::timeout(duration, self.done.wait()).await.is_err() {
                        warn!(tree = %self.name, "run timed out, cancelling");
                        self.cancel();
                    }
                }
                None => self.done.wait().await,
            }
        }

        self.done.is_set()
    }

    async fn start_job(self: &Arc<Self>, job: Arc<Job>, inherited_args: Arc<Vec<String>>) {
        if job.state() == JobState::Undef && self.parents_of(job.id()).is_empty() {
            debug!(job = %job.name(), "undef job with no parents, short-circuiting");
            job.transition(JobState::Running);
            job.transition(JobState::Successful);
            self.reevaluate_done();
            return;
        }
        if job.state() == JobState::Successful {
            return;
        }
        self.run_job(job, inherited_args).await;
    }

    async fn run_job(self: &Arc<Self>, job: Arc<Job>, inherited_args: Arc<Vec<String>>) {
        let events = job.events();
        let own_cancellation = events.wait_for(JobState::Cancelled);
        let wait_all_deps = async {
            for dependency in self.dependencies.iter().filter(|d| d.child == job.id()) {
                dependency.wait().await;
            }
        };
        // A parent that settles on a state this job doesn't require (e.g.
        // FAILED where SUCCESSFUL was required) leaves the dependency wait
        // blocked forever; racing against this job's own CANCELLED event is
        // what lets tree-level cancellation (spec §4.3, §5) unblock it.
        tokio::select! {
            _ = wait_all_deps => {}
            _ = own_cancellation => {}
        }

        if job.state().is_done() {
            self.reevaluate_done();
            return;
        }

        if job.state() == JobState::Undef {
            job.transition(JobState::Running);
            job.transition(JobState::Successful);
            self.reevaluate_done();
            return;
        }

        let acquired = if job.resources().is_empty() {
            true
        } else {
            job.transition(JobState::Blocked);
            let ok = jobtree_core::acquire_all(job.resources(), self.max_attempts).await;
            if ok {
                job.transition(JobState::Idle);
            }
            ok
        };

        if !acquired {
            warn!(job = %job.name(), "resource acquisition exhausted max attempts");
            job.transition(JobState::Failed);
            job.record_fail();
            self.reevaluate_done();
            return;
        }

        job.transition(JobState::Running);
        job.record_exec();

        let success = self.execute(&job, &inherited_args).await;

        for resource in job.resources() {
            resource.release();
        }

        if success {
            job.transition(JobState::Successful);
        } else {
            job.transition(JobState::Failed);
            job.record_fail();
        }
        self.reevaluate_done();
    }

    async fn execute(self: &Arc<Self>, job: &Arc<Job>, inherited_args: &[String]) -> bool {
        match job.runner_kind() {
            RunnerKind::Command { path, args } => {
                let mut full_args = args;
                full_args.extend(inherited_args.iter().cloned());
                let request = RunRequest {
                    command_path: path,
                    args: full_args,
                    cwd: self.cwd.clone(),
                    log_path: job.log_path().cloned(),
                };
                match self.runner.run(request).await {
                    Ok(ok) => ok,
                    Err(error) => {
                        warn!(job = %job.name(), %error, "runner failed to launch");
                        false
                    }
                }
            }
            RunnerKind::Subtree(id) => match self.subtrees.get(&id) {
                Some(subtree) => {
                    subtree.iterrun_with(inherited_args).await;
                    subtree.is_success()
                }
                None => {
                    warn!(job = %job.name(), %id, "sub-tree reference not found");
                    false
                }
            },
        }
    }

    // ---- sub-tree iteration (spec §4.6) ----

    pub async fn iterrun(self: &Arc<Self>) -> Option<bool> {
        self.iterrun_with(&[]).await
    }

    async fn iterrun_with(self: &Arc<Self>, inherited: &[String]) -> Option<bool> {
        if self.iterator.is_none() {
            self.run_with(inherited, true, None).await;
            return None;
        }
        if self.iterator.as_ref().unwrap().is_exhausted() {
            return Some(false);
        }
        loop {
            self.run_with(inherited, true, None).await;
            if !self.is_success() {
                break;
            }
            self.advance();
            if self.iterator.as_ref().unwrap().is_exhausted() {
                break;
            }
        }
        Some(self.is_success())
    }

    /// Clears the done-flag and cancellation, advances the cursor, and
    /// resets every job for the next iteration.
    pub fn advance(self: &Arc<Self>) {
        self.done.clear();
        self.cancelled.store(false, Ordering::Release);
        if let Some(iterator) = &self.iterator {
            iterator.advance();
        }
        for job in self.jobs.values() {
            job.reset();
        }
    }

    // ---- status document (spec §6) ----

    pub fn status(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        self.collect_status(&mut map);
        serde_json::Value::Object(map)
    }

    fn collect_status(&self, map: &mut serde_json::Map<String, serde_json::Value>) {
        for job in self.jobs.values() {
            let mut entry = serde_json::Map::new();
            entry.insert(
                "status".into(),
                serde_json::Value::String(job.state().status_color().to_string()),
            );
            entry.insert(
                "progress".into(),
                serde_json::Value::Number(job.progress().into()),
            );
            if let RunnerKind::Subtree(id) = job.runner_kind() {
                if let Some(subtree) = self.subtrees.get(&id) {
                    if let Some(iterator) = &subtree.iterator {
                        entry.insert(
                            "iteration".into(),
                            serde_json::Value::String(iterator.progress_label()),
                        );
                    }
                }
            }
            map.insert(job.name().to_string(), serde_json::Value::Object(entry));
        }
        for subtree in self.subtrees.values() {
            subtree.collect_status(map);
        }
    }

    /// Spawn a background task that rewrites `path` with the status document
    /// every 5 seconds until the tree is done (spec §6, original source's
    /// `spawn_json_updater`).
    pub fn spawn_status_updater(self: &Arc<Self>, path: PathBuf) {
        let tree = self.clone();
        tokio::spawn(async move {
            while !tree.is_done() {
                tokio::time::sleep(Duration::from_secs(5)).await;
                let doc = tree.status();
                if let Err(error) = tokio::fs::write(&path, doc.to_string()).await {
                    warn!(%error, path = %path.display(), "failed to write status document");
                }
            }
        });
    }
}

#[cfg(test)]
#[path = "tree_tests.rs"]
mod tests;
