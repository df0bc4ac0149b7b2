// SPDX-License-Identifier: MIT

use super::*;
use std::time::Duration;

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn once_flag_wait_returns_immediately_once_set() {
    let flag = OnceFlag::new();
    flag.set();
    tokio::time::timeout(Duration::from_millis(10), flag.wait())
        .await
        .expect("already-set flag should not block");
}

#[tokio::test]
async fn once_flag_wakes_pending_waiter() {
    let flag = Arc::new(OnceFlag::new());
    let waiter = {
        let flag = flag.clone();
        tokio::spawn(async move {
            flag.wait().await;
        })
    };
    tokio::task::yield_now().await;
    flag.set();
    waiter.await.unwrap();
}

#[tokio::test]
async fn state_events_fire_wakes_matching_waiter_only() {
    let events = StateEvents::new();
    let successful_waiter = {
        let events = events.clone();
        tokio::spawn(async move {
            events.wait_for(JobState::Successful).await;
        })
    };
    tokio::task::yield_now().await;
    events.fire(JobState::Running);
    assert!(!successful_waiter.is_finished());

    events.fire(JobState::Successful);
    successful_waiter.await.unwrap();
}

#[tokio::test]
async fn wait_for_any_done_ignores_non_terminal_transitions() {
    let events = StateEvents::new();
    let waiter = {
        let events = events.clone();
        tokio::spawn(async move {
            events.wait_for_any_done().await;
        })
    };
    tokio::task::yield_now().await;
    events.fire(JobState::Blocked);
    events.fire(JobState::Running);
    tokio::task::yield_now().await;
    assert!(!waiter.is_finished());

    events.fire(JobState::Failed);
    waiter.await.unwrap();
}

#[tokio::test]
async fn is_set_reports_fired_states_without_blocking() {
    let events = StateEvents::new();
    assert!(!events.is_set(JobState::Successful));
    events.fire(JobState::Successful);
    assert!(events.is_set(JobState::Successful));
    assert!(!events.is_set(JobState::Failed));
}

#[tokio::test]
async fn clear_all_resets_flags_for_reuse() {
    let events = StateEvents::new();
    events.fire(JobState::Running);
    events.fire(JobState::Failed);
    events.clear_all();
    assert!(!events.is_set(JobState::Running));
    assert!(!events.is_set(JobState::Failed));

    // a cleared flag can fire and be waited on again
    let waiter = {
        let events = events.clone();
        tokio::spawn(async move { events.wait_for(JobState::Failed).await })
    };
    tokio::task::yield_now().await;
    events.fire(JobState::Failed);
    waiter.await.unwrap();
}

#[tokio::test]
async fn change_signal_unblocks_repeatedly_across_calls() {
    let events = StateEvents::new();

    events.fire(JobState::Blocked);
    // A fresh call after a prior bump must still observe the next one, not
    // the one it already missed.
    let waiter = {
        let events = events.clone();
        tokio::spawn(async move {
            events.wait_for_any_done().await;
        })
    };
    tokio::task::yield_now().await;
    assert!(!waiter.is_finished());
    events.fire(JobState::Cancelled);
    waiter.await.unwrap();
}
