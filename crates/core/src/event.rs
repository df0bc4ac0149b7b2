// SPDX-License-Identifier: MIT

//! Event primitives used to wake dependency-waiters when a job reaches a
//! terminal state.
//!
//! The original implementation gives every job one `gevent.event.Event()`
//! per state and has waiters block on the specific event for the state they
//! require. [`StateEvents`] is the async equivalent: one latch per
//! [`JobState`], plus a `changed` latch any state transition also fires, for
//! callers (like the status updater) that only care "did something happen".
//!
//! Each latch is a one-shot flag that, once set, stays set — consistent with
//! dependency waiters that may start waiting before or after the state they
//! need has already been reached.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

use crate::state::JobState;

/// A single-fire, idempotent, multi-waiter flag.
///
/// Race-safe: `notified()` is constructed before the flag is re-checked, so a
/// `set()` that lands between the first check and the `await` is not missed.
#[derive(Debug, Default)]
pub struct OnceFlag {
    set: AtomicBool,
    notify: Notify,
}

impl OnceFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_set(&self) -> bool {
        self.set.load(Ordering::Acquire)
    }

    /// Set the flag and wake every current and future waiter.
    pub fn set(&self) {
        self.set.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }

    /// Wait until the flag is set. Returns immediately if already set.
    pub async fn wait(&self) {
        loop {
            if self.is_set() {
                return;
            }
            let notified = self.notify.notified();
            if self.is_set() {
                return;
            }
            notified.await;
        }
    }

    /// Reset to unset. Only meaningful for `reset()`-style reuse of a job's
    /// events between iterations; does not wake anyone.
    pub fn clear(&self) {
        self.set.store(false, Ordering::Release);
    }
}

/// A repeatable "something changed" signal, as opposed to [`OnceFlag`]'s
/// single fire. Waiters observe a generation counter so a signal that lands
/// between their check and their `await` is never missed, and the signal can
/// fire again for the next change.
#[derive(Debug, Default)]
struct ChangeSignal {
    generation: AtomicU64,
    notify: Notify,
}

impl ChangeSignal {
    fn bump(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.notify.notify_waiters();
    }

    /// Wait for the generation to advance past `since`. Returns the new
    /// generation so repeated calls can keep waiting for further changes.
    async fn wait_past(&self, since: u64) -> u64 {
        loop {
            let current = self.generation.load(Ordering::Acquire);
            if current != since {
                return current;
            }
            let notified = self.notify.notified();
            let current = self.generation.load(Ordering::Acquire);
            if current != since {
                return current;
            }
            notified.await;
        }
    }

    fn current(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}

/// The full set of one-shot flags for a single job: one per [`JobState`] it
/// can terminate in, plus `changed` for any transition at all.
#[derive(Debug, Default)]
pub struct StateEvents {
    successful: OnceFlag,
    failed: OnceFlag,
    cancelled: OnceFlag,
    undef: OnceFlag,
    running: OnceFlag,
    blocked: OnceFlag,
    changed: ChangeSignal,
}

impl StateEvents {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Fire the flag matching `state`, plus `changed`. States with no
    /// matching flag (`Idle`, `Reset`) only fire `changed`.
    pub fn fire(&self, state: JobState) {
        match state {
            JobState::Successful => self.successful.set(),
            JobState::Failed => self.failed.set(),
            JobState::Cancelled => self.cancelled.set(),
            JobState::Undef => self.undef.set(),
            JobState::Running => self.running.set(),
            JobState::Blocked => self.blocked.set(),
            JobState::Idle | JobState::Reset => {}
        }
        self.changed.bump();
    }

    pub async fn wait_for(&self, state: JobState) {
        match state {
            JobState::Successful => self.successful.wait().await,
            JobState::Failed => self.failed.wait().await,
            JobState::Cancelled => self.cancelled.wait().await,
            JobState::Undef => self.undef.wait().await,
            JobState::Running => self.running.wait().await,
            JobState::Blocked => self.blocked.wait().await,
            JobState::Idle | JobState::Reset => {}
        }
    }

    pub async fn wait_for_any_done(&self) {
        let mut seen = self.changed.current();
        loop {
            if self.successful.is_set()
                || self.failed.is_set()
                || self.cancelled.is_set()
                || self.undef.is_set()
            {
                return;
            }
            seen = self.changed.wait_past(seen).await;
        }
    }

    /// Non-blocking check for whether `state`'s flag has fired.
    pub fn is_set(&self, state: JobState) -> bool {
        match state {
            JobState::Successful => self.successful.is_set(),
            JobState::Failed => self.failed.is_set(),
            JobState::Cancelled => self.cancelled.is_set(),
            JobState::Undef => self.undef.is_set(),
            JobState::Running => self.running.is_set(),
            JobState::Blocked => self.blocked.is_set(),
            JobState::Idle | JobState::Reset => false,
        }
    }

    /// Clear every per-state flag, for `Job::reset()`. The `changed` signal
    /// is bumped so anyone waiting on `wait_for_any_done` re-evaluates.
    pub fn clear_all(&self) {
        self.successful.clear();
        self.failed.clear();
        self.cancelled.clear();
        self.undef.clear();
        self.running.clear();
        self.blocked.clear();
        self.changed.bump();
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
