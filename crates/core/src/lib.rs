// SPDX-License-Identifier: MIT

//! Data-model types for the DAG execution engine: job state, the per-state
//! event primitive, resources, the sub-tree argument iterator, and
//! dependency edges.
//!
//! [`jobtree-engine`] composes these into `Job` and `Tree`; [`jobtree-codec`]
//! maps them to and from the on-disk document format.

pub mod macros;

pub mod clock;
pub mod dependency;
pub mod errors;
pub mod event;
pub mod id;
pub mod id_types;
pub mod iterator;
pub mod resource;
pub mod state;

pub use clock::{Clock, FakeClock, SystemClock};
pub use dependency::Dependency;
pub use errors::DagError;
pub use event::{OnceFlag, StateEvents};
pub use id::short;
pub use id_types::{JobId, ResourceId, TreeId};
pub use iterator::ArgIterator;
pub use resource::{acquire_all, Resource, ResourceBuilder};
pub use state::{DependencyState, JobState};
