// SPDX-License-Identifier: MIT

//! Concrete identifier types used across the data model, generated with
//! [`crate::define_id!`].

crate::define_id! {
    /// Identifier for a job within a tree. Stable across resets and re-runs.
    pub struct JobId;
}

crate::define_id! {
    /// Identifier for a resource (semaphore) within a tree.
    pub struct ResourceId;
}

crate::define_id! {
    /// Identifier for a tree itself, used in status documents and logs.
    pub struct TreeId;
}
