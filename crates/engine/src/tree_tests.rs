// SPDX-License-Identifier: MIT

use super::*;
use crate::job::UNDEF_PATH;
use jobtree_core::DependencyState;
use std::time::Duration;

fn build_tree(
    jobs: Vec<Arc<Job>>,
    deps: Vec<DependencySpec>,
    resources: Vec<Arc<Resource>>,
    waitsuccess: bool,
) -> Arc<Tree> {
    Tree::new(
        "t",
        std::env::temp_dir(),
        waitsuccess,
        jobs,
        deps,
        resources,
        vec![],
        None,
        Arc::new(ProcessRunner),
    )
    .unwrap()
}

#[tokio::test]
async fn linear_success_chain_completes() {
    let a = Job::command("a", "/bin/true", vec![], true, vec![], None);
    let b = Job::command("b", "/bin/true", vec![], true, vec![], None);
    let dep = DependencySpec {
        parent: a.id(),
        child: b.id(),
        required_state: DependencyState::Successful,
    };
    let tree = build_tree(vec![a.clone(), b.clone()], vec![dep], vec![], true);

    let done = tree.run(true, Some(Duration::from_secs(5))).await;
    assert!(done);
    assert_eq!(a.state(), JobState::Successful);
    assert_eq!(b.state(), JobState::Successful);
}

#[tokio::test]
async fn failing_parent_blocks_child_until_cancellation() {
    let a = Job::command("a", "/bin/false", vec![], true, vec![], None);
    let b = Job::command("b", "/bin/true", vec![], true, vec![], None);
    let dep = DependencySpec {
        parent: a.id(),
        child: b.id(),
        required_state: DependencyState::Successful,
    };
    let tree = build_tree(vec![a.clone(), b.clone()], vec![dep], vec![], true);

    // b's dependency on a's SUCCESSFUL will never fire (a fails); only the
    // outer run() timeout can break the wait, per spec §4.3's edge case.
    let done = tree.run(true, Some(Duration::from_millis(300))).await;
    assert!(done);
    assert_eq!(a.state(), JobState::Failed);
    assert_eq!(b.state(), JobState::Cancelled);
}

#[tokio::test]
async fn undef_job_with_no_parents_short_circuits_to_successful() {
    let noop = Job::command("noop", UNDEF_PATH, vec![], true, vec![], None);
    let tree = build_tree(vec![noop.clone()], vec![], vec![], true);

    let done = tree.run(true, Some(Duration::from_secs(5))).await;
    assert!(done);
    assert_eq!(noop.state(), JobState::Successful);
}

#[tokio::test]
async fn not_must_complete_job_does_not_block_tree_done() {
    let a = Job::command("a", "/bin/true", vec![], true, vec![], None);
    let slowish = Job::command("b", "/bin/true", vec![], false, vec![], None);
    let tree = build_tree(vec![a.clone(), slowish.clone()], vec![], vec![], true);

    let done = tree.run(true, Some(Duration::from_secs(5))).await;
    assert!(done);
}

#[tokio::test]
async fn resource_contention_is_serialized_not_lost() {
    let resource = Arc::new(Resource::builder().name("slot").capacity(1).build());
    let a = Job::command("a", "/bin/true", vec![], true, vec![resource.clone()], None);
    let b = Job::command("b", "/bin/true", vec![], true, vec![resource.clone()], None);
    let tree = build_tree(vec![a.clone(), b.clone()], vec![], vec![resource], true);

    let done = tree.run(true, Some(Duration::from_secs(5))).await;
    assert!(done);
    assert_eq!(a.state(), JobState::Successful);
    assert_eq!(b.state(), JobState::Successful);
}

#[tokio::test]
async fn cycle_is_reported_by_validate() {
    let a = Job::command("a", "/bin/true", vec![], true, vec![], None);
    let b = Job::command("b", "/bin/true", vec![], true, vec![], None);
    let deps = vec![
        DependencySpec {
            parent: a.id(),
            child: b.id(),
            required_state: DependencyState::Successful,
        },
        DependencySpec {
            parent: b.id(),
            child: a.id(),
            required_state: DependencyState::Successful,
        },
    ];
    let tree = build_tree(vec![a, b], deps, vec![], true);
    let errors = tree.validate();
    assert!(!errors.is_empty(), "expected validation errors for a cycle");
}

#[tokio::test]
async fn empty_tree_is_reported_as_empty() {
    let tree = build_tree(vec![], vec![], vec![], true);
    let errors = tree.validate();
    assert!(errors.iter().any(|e| e.contains("empty")));
}

#[tokio::test]
async fn two_unrelated_jobs_are_reported_as_multiple_stems() {
    let a = Job::command("a", "/bin/true", vec![], true, vec![], None);
    let b = Job::command("b", "/bin/true", vec![], true, vec![], None);
    let tree = build_tree(vec![a, b], vec![], vec![], true);
    let errors = tree.validate();
    assert!(errors.iter().any(|e| e.contains("multiple stems")));
}

#[tokio::test]
async fn cancel_before_start_marks_idle_jobs_cancelled() {
    let a = Job::command("a", "/bin/true", vec![], true, vec![], None);
    let tree = build_tree(vec![a.clone()], vec![], vec![], true);
    tree.cancel();
    assert_eq!(a.state(), JobState::Cancelled);
    assert!(tree.is_cancelled());
}

#[tokio::test]
async fn status_reports_color_and_progress_per_job() {
    let a = Job::command("a", "/bin/true", vec![], true, vec![], None);
    a.set_progress(42);
    let tree = build_tree(vec![a.clone()], vec![], vec![], true);
    let status = tree.status();
    let entry = &status["a"];
    assert_eq!(entry["progress"], 42);
    assert_eq!(entry["status"], "white");
}

#[tokio::test]
async fn stems_excludes_jobs_with_defined_ancestors() {
    let a = Job::command("a", "/bin/true", vec![], true, vec![], None);
    let b = Job::command("b", "/bin/true", vec![], true, vec![], None);
    let dep = DependencySpec {
        parent: a.id(),
        child: b.id(),
        required_state: DependencyState::Successful,
    };
    let tree = build_tree(vec![a.clone(), b.clone()], vec![dep], vec![], true);
    let stems = tree.stems();
    assert_eq!(stems, vec![a.id()]);
}

#[tokio::test]
async fn find_job_locates_by_id() {
    let a = Job::command("a", "/bin/true", vec![], true, vec![], None);
    let tree = build_tree(vec![a.clone()], vec![], vec![], true);
    assert!(tree.find_job(a.id()).is_some());
    assert!(tree.find_job(JobId::new()).is_none());
}
