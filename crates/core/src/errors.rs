// SPDX-License-Identifier: MIT

//! Structural and runtime error types shared by the core data model.
//!
//! [`jobtree-engine`] and [`jobtree-codec`] define their own error enums for
//! concerns that belong to them (runner failures, XML parsing) and wrap
//! `DagError` via `#[from]` where a lower-layer failure can surface through.

use thiserror::Error;

use crate::id_types::{JobId, ResourceId};

/// Errors produced while building or mutating a tree's data model.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DagError {
    #[error("job {0} not found")]
    JobNotFound(JobId),

    #[error("resource {0} not found")]
    ResourceNotFound(ResourceId),

    #[error("duplicate job id {0}")]
    DuplicateJob(JobId),

    #[error("adding dependency would create a cycle through job {0}")]
    CyclicDependency(JobId),

    #[error("job {0} cannot depend on itself")]
    SelfDependency(JobId),

    #[error("'{state}' is not a valid dependency-satisfying state (must be successful or failed)")]
    InvalidDependencyState { state: String },

    #[error("command-path on job {0} can only be set while the job is idle, undef, or blocked")]
    NotPrestart(JobId),

    #[error("resource capacity must be non-zero, got {0}")]
    ZeroCapacity(i64),

    #[error("iterator argument index {index} out of bounds (len {len})")]
    IteratorExhausted { index: usize, len: usize },
}
