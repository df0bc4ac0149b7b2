// SPDX-License-Identifier: MIT

use super::*;

fn cmd(name: &str, path: &str) -> Arc<Job> {
    Job::command(name, path, vec![], true, vec![], None)
}

#[test]
fn dash_path_starts_undef() {
    let job = cmd("noop", UNDEF_PATH);
    assert_eq!(job.state(), JobState::Undef);
    assert!(!job.is_defined());
}

#[test]
fn real_path_starts_idle() {
    let job = cmd("real", "/bin/true");
    assert_eq!(job.state(), JobState::Idle);
    assert!(job.is_defined());
}

#[test]
fn set_command_path_to_dash_while_idle_transitions_to_undef() {
    let job = cmd("real", "/bin/true");
    job.set_command_path(UNDEF_PATH).unwrap();
    assert_eq!(job.state(), JobState::Undef);
}

#[test]
fn set_command_path_rejected_once_running() {
    let job = cmd("real", "/bin/true");
    job.transition(JobState::Running);
    assert!(job.set_command_path("/bin/false").is_err());
}

#[test]
fn set_command_path_allowed_while_blocked() {
    let job = cmd("real", "/bin/true");
    job.transition(JobState::Blocked);
    assert!(job.set_command_path("/bin/echo").is_ok());
}

#[test]
fn cancel_refuses_running_job() {
    let job = cmd("real", "/bin/true");
    job.transition(JobState::Running);
    assert!(!job.cancel());
    assert_eq!(job.state(), JobState::Running);
}

#[test]
fn cancel_is_noop_on_done_job() {
    let job = cmd("real", "/bin/true");
    job.transition(JobState::Successful);
    assert!(job.cancel());
    assert_eq!(job.state(), JobState::Successful);
}

#[test]
fn cancel_marks_idle_job_cancelled() {
    let job = cmd("real", "/bin/true");
    assert!(job.cancel());
    assert_eq!(job.state(), JobState::Cancelled);
}

#[test]
fn reset_is_noop_on_undef() {
    let job = cmd("noop", UNDEF_PATH);
    job.reset();
    assert_eq!(job.state(), JobState::Undef);
}

#[test]
fn reset_clears_events_and_clamps_progress() {
    let job = cmd("real", "/bin/true");
    job.set_progress(80);
    job.transition(JobState::Successful);
    job.reset();
    assert_eq!(job.state(), JobState::Reset);
    assert_eq!(job.progress(), 0);
    assert!(!job.events().is_set(JobState::Successful));
}

#[test]
fn progress_is_clamped_to_valid_range() {
    let job = cmd("real", "/bin/true");
    job.set_progress(500);
    assert_eq!(job.progress(), 100);
    job.set_progress(-50);
    assert_eq!(job.progress(), -1);
}

#[test]
fn exec_and_fail_counts_are_monotonic() {
    let job = cmd("real", "/bin/true");
    job.record_exec();
    job.record_exec();
    job.record_fail();
    assert_eq!(job.exec_count(), 2);
    assert_eq!(job.fail_count(), 1);
}

#[tokio::test]
async fn transition_fires_the_destination_states_event() {
    let job = cmd("real", "/bin/true");
    let events = job.events();
    job.transition(JobState::Running);
    tokio::time::timeout(std::time::Duration::from_millis(10), events.wait_for(JobState::Running))
        .await
        .expect("running event should have fired");
}
