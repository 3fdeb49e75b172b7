mod common;

use std::sync::Arc;

use common::ScriptedRunner;
use postgres::{Controller, PostgresError};

fn controller(runner: &Arc<ScriptedRunner>) -> Controller {
    Controller::new(runner.clone(), "11", "main")
}

#[test]
fn data_directory_is_pure_and_stable() {
    let runner = Arc::new(ScriptedRunner::new());
    let cluster = controller(&runner);

    assert_eq!(cluster.data_directory(), "/var/lib/postgresql/11/main");
    assert_eq!(cluster.data_directory(), "/var/lib/postgresql/11/main");
    assert!(runner.commands().is_empty(), "no remote call expected");
}

#[tokio::test]
async fn start_issues_the_start_command() {
    let runner = Arc::new(ScriptedRunner::new());
    let cluster = controller(&runner);

    cluster.start().await.unwrap();

    assert_eq!(runner.commands(), vec!["sudo pg_ctlcluster 11 main start"]);
}

#[tokio::test]
async fn start_failure_carries_the_captured_output() {
    let runner = Arc::new(ScriptedRunner::new());
    runner.push_exit(1, "could not start server");
    let cluster = controller(&runner);

    let err = cluster.start().await.unwrap_err();

    match err {
        PostgresError::Command { stderr, .. } => {
            assert_eq!(stderr, "could not start server");
        }
        other => panic!("expected a command error, got {other:?}"),
    }
}

#[tokio::test]
async fn is_running_reports_a_running_cluster() {
    let runner = Arc::new(ScriptedRunner::new());
    runner.push_success("online");
    let cluster = controller(&runner);

    assert!(cluster.is_running().await.unwrap());
    assert_eq!(runner.commands(), vec!["sudo pg_ctlcluster 11 main status"]);
}

#[tokio::test]
async fn status_exit_code_3_means_stopped_not_failed() {
    let runner = Arc::new(ScriptedRunner::new());
    runner.push_exit(3, "");
    let cluster = controller(&runner);

    assert!(!cluster.is_running().await.unwrap());
}

#[tokio::test]
async fn other_status_exit_codes_are_errors() {
    let runner = Arc::new(ScriptedRunner::new());
    runner.push_exit(1, "Error: specified cluster '42 main' does not exist");
    let cluster = controller(&runner);

    assert!(cluster.is_running().await.is_err());
}

#[tokio::test]
async fn transport_failures_are_errors_of_their_own() {
    let runner = Arc::new(ScriptedRunner::new());
    runner.push_transport_failure("connection refused");
    let cluster = controller(&runner);

    let err = cluster.is_running().await.unwrap_err();
    assert!(matches!(err, PostgresError::Transport(_)));
}

#[tokio::test]
async fn stop_is_a_no_op_for_a_stopped_cluster() {
    let runner = Arc::new(ScriptedRunner::new());
    runner.push_exit(3, "");
    let cluster = controller(&runner);

    cluster.stop().await.unwrap();

    assert_eq!(runner.commands(), vec!["sudo pg_ctlcluster 11 main status"]);
}

#[tokio::test]
async fn stopping_twice_issues_at_most_one_stop_command() {
    let runner = Arc::new(ScriptedRunner::new());
    runner.push_success(""); // first status: running
    runner.push_success(""); // stop
    runner.push_exit(3, ""); // second status: stopped
    let cluster = controller(&runner);

    cluster.stop().await.unwrap();
    cluster.stop().await.unwrap();

    let stops = runner
        .commands()
        .iter()
        .filter(|command| command.ends_with("stop"))
        .count();
    assert_eq!(stops, 1);
}

#[tokio::test]
async fn clear_removes_the_directory_contents_only() {
    let runner = Arc::new(ScriptedRunner::new());
    let cluster = controller(&runner);

    cluster.clear().await.unwrap();

    assert_eq!(
        runner.commands(),
        vec!["sudo -u postgres find /var/lib/postgresql/11/main -mindepth 1 -delete"]
    );
}
