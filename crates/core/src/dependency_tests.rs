// SPDX-License-Identifier: MIT

use super::*;
use crate::state::JobState;

#[tokio::test]
async fn wait_returns_immediately_if_parent_already_satisfied() {
    let parent = JobId::new();
    let child = JobId::new();
    let events = StateEvents::new();
    events.fire(JobState::Successful);

    let dep = Dependency::new(
        parent,
        child,
        DependencyState::Successful,
        events,
    );
    tokio::time::timeout(std::time::Duration::from_millis(10), dep.wait())
        .await
        .expect("dependency already satisfied should not block");
}

#[tokio::test]
async fn wait_blocks_until_required_state_fires() {
    let parent = JobId::new();
    let child = JobId::new();
    let events = StateEvents::new();

    let dep = Dependency::new(parent, child, DependencyState::Failed, events.clone());
    let waiter = tokio::spawn(async move { dep.wait().await });

    tokio::task::yield_now().await;
    assert!(!waiter.is_finished());

    events.fire(JobState::Failed);
    waiter.await.unwrap();
}

#[tokio::test]
async fn wait_ignores_unrelated_state_transitions() {
    let parent = JobId::new();
    let child = JobId::new();
    let events = StateEvents::new();

    let dep = Dependency::new(
        parent,
        child,
        DependencyState::Successful,
        events.clone(),
    );
    let waiter = tokio::spawn(async move { dep.wait().await });

    tokio::task::yield_now().await;
    events.fire(JobState::Running);
    events.fire(JobState::Failed);
    tokio::task::yield_now().await;
    assert!(!waiter.is_finished());

    events.fire(JobState::Successful);
    waiter.await.unwrap();
}
