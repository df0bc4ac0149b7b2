// SPDX-License-Identifier: MIT

//! Counting-semaphore resources shared across jobs in a tree (spec §4.2).
//!
//! A negative `capacity` means "unbounded" — every reservation succeeds
//! immediately, matching the original implementation's `avail < 0` escape
//! hatch for resources that exist only to be named in a document but never
//! actually constrain anything.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::timeout as tokio_timeout;

use crate::id_types::ResourceId;

crate::builder! {
    pub struct ResourceBuilder => Resource {
        into { name: String = "resource" }
        set {
            capacity: i64 = 1,
            reserve_timeout: Duration = Duration::from_secs(60),
            id: ResourceId = ResourceId::new()
        }
        computed {
            in_use: AtomicI64 = AtomicI64::new(0),
            release_notify: Notify = Notify::new()
        }
    }
}

/// A shared counting semaphore. Cloning a `Resource` does not duplicate its
/// counter — wrap it in `Arc` to share one instance across jobs, which is
/// how [`crate::dependency`] and the engine's tree registry hold it.
#[derive(Debug)]
pub struct Resource {
    id: ResourceId,
    name: String,
    capacity: i64,
    in_use: AtomicI64,
    reserve_timeout: Duration,
    release_notify: Notify,
}

impl Resource {
    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> i64 {
        self.capacity
    }

    pub fn reserve_timeout(&self) -> Duration {
        self.reserve_timeout
    }

    pub fn in_use(&self) -> i64 {
        self.in_use.load(Ordering::Acquire)
    }

    /// Attempt to claim one unit, blocking up to `reserve_timeout` for a
    /// release if the resource is currently saturated.
    ///
    /// Unbounded resources (`capacity < 0`) always succeed immediately.
    pub async fn reserve(&self) -> bool {
        if self.capacity < 0 {
            return true;
        }
        if self.try_reserve() {
            return true;
        }
        match tokio_timeout(self.reserve_timeout, self.wait_and_try()).await {
            Ok(acquired) => acquired,
            Err(_elapsed) => false,
        }
    }

    async fn wait_and_try(&self) -> bool {
        loop {
            let notified = self.release_notify.notified();
            if self.try_reserve() {
                return true;
            }
            notified.await;
            if self.try_reserve() {
                return true;
            }
        }
    }

    fn try_reserve(&self) -> bool {
        let mut current = self.in_use.load(Ordering::Acquire);
        loop {
            if current >= self.capacity {
                return false;
            }
            match self.in_use.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(observed) => current = observed,
            }
        }
    }

    /// Release one unit, clamped at zero, and wake one waiter.
    pub fn release(&self) {
        if self.capacity < 0 {
            return;
        }
        let mut current = self.in_use.load(Ordering::Acquire);
        loop {
            if current == 0 {
                break;
            }
            match self.in_use.compare_exchange_weak(
                current,
                current - 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(observed) => current = observed,
            }
        }
        self.release_notify.notify_one();
    }
}

/// Attempt to acquire every resource in `resources`, in order, releasing
/// everything already held on partial failure and backing off before the
/// next attempt. Implements the deadlock-avoidance protocol in spec §4.2.
///
/// Returns `true` once every resource is held; `false` if `max_attempts` is
/// exhausted first.
pub async fn acquire_all(resources: &[Arc<Resource>], max_attempts: u32) -> bool {
    if resources.is_empty() {
        return true;
    }

    let min_timeout = resources
        .iter()
        .map(|r| r.reserve_timeout())
        .min()
        .unwrap_or(Duration::ZERO);
    let backoff = min_timeout * resources.len() as u32;

    for _attempt in 0..max_attempts.max(1) {
        let mut reserved = Vec::with_capacity(resources.len());
        let mut all_ok = true;
        for resource in resources {
            if resource.reserve().await {
                reserved.push(resource.clone());
            } else {
                all_ok = false;
                break;
            }
        }

        if all_ok {
            return true;
        }

        for resource in &reserved {
            resource.release();
        }

        let jitter = if min_timeout.is_zero() {
            Duration::ZERO
        } else {
            Duration::from_nanos(rand::random::<u64>() % (min_timeout.as_nanos() as u64).max(1))
        };
        tokio::time::sleep(backoff + jitter).await;
    }

    false
}

#[cfg(test)]
#[path = "resource_tests.rs"]
mod tests;
