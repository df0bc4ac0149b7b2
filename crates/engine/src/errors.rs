// SPDX-License-Identifier: MIT

//! Runtime errors surfaced by tree construction, validation, and execution
//! (spec §7). Validation failures are not represented here — `Tree::validate`
//! accumulates human-readable strings rather than returning a `Result`,
//! matching the spec's "no exception; callers decide to abort" policy.

use jobtree_core::{DagError, JobId, TreeId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Dag(#[from] DagError),

    #[error("job {0} is already running and cannot be reconfigured")]
    NotPrestart(JobId),

    #[error("sub-tree {0} not found")]
    SubtreeNotFound(TreeId),

    #[error("failed to launch runner for job {job}: {source}")]
    Spawn {
        job: JobId,
        #[source]
        source: std::io::Error,
    },

    #[error("job {0} declares neither a command path nor a sub-tree reference")]
    NoRunner(JobId),

    #[error("job {0} declares both a command path and a sub-tree reference")]
    AmbiguousRunner(JobId),
}
