//! Job lifecycle tests: polling, terminal outcomes and cancellation.

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use td_glance::engine::{
    EngineKind, JobClient, JobDebug, JobId, JobState, MockCall, MockJobClient, Value,
};
use td_glance::query::JobOrchestrator;
use td_glance::TdError;

fn orchestrator(client: &Arc<MockJobClient>) -> JobOrchestrator {
    let client: Arc<dyn JobClient> = client.clone();
    JobOrchestrator::new(client, EngineKind::Presto).with_poll_interval(Duration::from_millis(1))
}

#[tokio::test]
async fn test_result_round_trip() {
    let client = Arc::new(
        MockJobClient::new()
            .with_statuses([JobState::Queued, JobState::Success])
            .with_schema(r#"[["col1","string"],["col2","long"]]"#)
            .with_result("[\"a\",1]\n[\"b\",2]"),
    );

    let result = orchestrator(&client).run("db", "SELECT col1, col2 FROM t").await.unwrap();

    assert_eq!(result.fields, vec!["col1", "col2"]);
    assert_eq!(
        result.rows,
        vec![
            vec![Value::from("a"), Value::Int(1)],
            vec![Value::from("b"), Value::Int(2)],
        ]
    );
}

#[tokio::test]
async fn test_field_count_matches_schema() {
    let schemas = [
        (r#"[]"#, 0),
        (r#"[["a","int"]]"#, 1),
        (r#"[["a","int"],["b","varchar"],["c","double"],["d","array(int)"]]"#, 4),
    ];

    for (schema, expected) in schemas {
        let client = Arc::new(
            MockJobClient::new()
                .with_statuses([JobState::Running, JobState::Running, JobState::Success])
                .with_schema(schema),
        );
        let result = orchestrator(&client).run("db", "SELECT 1").await.unwrap();
        assert_eq!(result.fields.len(), expected, "schema {schema}");
    }
}

#[tokio::test]
async fn test_error_status_never_fetches_result() {
    let client = Arc::new(
        MockJobClient::new()
            .with_statuses([JobState::Queued, JobState::Running, JobState::Error])
            .with_debug(JobDebug {
                cmdout: Some("Query 20240101_000000_00001 failed".to_string()),
                stderr: None,
            })
            .with_result("[\"should not be read\"]"),
    );

    let err = orchestrator(&client).run("db", "SELEC 1").await.unwrap_err();

    assert_eq!(err.category(), "Query Execution Error");
    assert!(err.to_string().contains("20240101_000000_00001 failed"));
    assert!(!client
        .calls()
        .iter()
        .any(|c| matches!(c, MockCall::FetchResult(_))));
}

#[tokio::test]
async fn test_polls_until_terminal() {
    let client = Arc::new(MockJobClient::new().with_statuses([
        JobState::Queued,
        JobState::Booting,
        JobState::Running,
        JobState::Running,
        JobState::Success,
    ]));

    orchestrator(&client).run("db", "SELECT 1").await.unwrap();

    let polls = client
        .calls()
        .iter()
        .filter(|c| matches!(c, MockCall::Status(_)))
        .count();
    assert_eq!(polls, 5);
}

#[tokio::test]
async fn test_cancel_wins_even_if_job_succeeds_after_kill() {
    let client = Arc::new(
        MockJobClient::new()
            .with_job_id("42")
            .with_statuses([JobState::Running])
            .with_after_kill([JobState::Running, JobState::Running, JobState::Success])
            .with_schema(r#"[["a","int"]]"#)
            .with_result("[1]"),
    );
    let polled = client.polled();
    let (handle, future) = orchestrator(&client).start("db", "SELECT a FROM big");
    let task = tokio::spawn(future);

    polled.notified().await;
    handle.cancel();

    let err = task.await.unwrap().unwrap_err();
    assert!(matches!(err, TdError::Canceled));

    let calls = client.calls();
    let kill_at = calls
        .iter()
        .position(|c| *c == MockCall::Kill(JobId::from("42")))
        .expect("kill was sent");
    // The orchestrator keeps polling after the kill until the job is terminal.
    let polls_after_kill = calls[kill_at..]
        .iter()
        .filter(|c| matches!(c, MockCall::Status(_)))
        .count();
    assert_eq!(polls_after_kill, 3);
    assert!(!calls.iter().any(|c| matches!(c, MockCall::FetchResult(_))));
}

#[tokio::test]
async fn test_cancel_during_result_fetch_sends_no_kill() {
    let client = Arc::new(
        MockJobClient::new()
            .with_statuses([JobState::Running, JobState::Success])
            .with_schema(r#"[["a","int"]]"#)
            .with_result("[1]")
            .with_held_fetch(),
    );
    let fetching = client.fetching();
    let (handle, future) = orchestrator(&client).start("db", "SELECT a FROM t");
    let task = tokio::spawn(future);

    fetching.notified().await;
    handle.cancel();

    let err = task.await.unwrap().unwrap_err();
    assert!(matches!(err, TdError::Canceled));
    // The job was already terminal, so the fetch is dropped without a kill.
    assert_eq!(client.kill_count(), 0);
    assert!(matches!(client.calls().last(), Some(MockCall::FetchResult(_))));
}

#[tokio::test]
async fn test_cancel_queued_before_job_id_is_known() {
    let client = Arc::new(MockJobClient::new().with_statuses([JobState::Queued]));
    let (handle, future) = orchestrator(&client).start("db", "SELECT 1");

    // Nothing has been submitted yet.
    handle.cancel();
    assert!(client.calls().is_empty());

    let err = future.await.unwrap_err();
    assert!(err.is_canceled());
    assert_eq!(client.kill_count(), 1);
}

#[tokio::test]
async fn test_independent_runs_share_nothing() {
    let first = Arc::new(
        MockJobClient::new()
            .with_job_id("a")
            .with_statuses([JobState::Running, JobState::Success])
            .with_schema(r#"[["x","int"]]"#)
            .with_result("[1]"),
    );
    let second = Arc::new(
        MockJobClient::new()
            .with_job_id("b")
            .with_statuses([JobState::Running, JobState::Running, JobState::Error]),
    );

    let first_orch = orchestrator(&first);
    let second_orch = orchestrator(&second);
    let (a, b) = tokio::join!(
        first_orch.run("db", "SELECT x"),
        second_orch.run("db", "SELECT y"),
    );

    assert_eq!(a.unwrap().rows, vec![vec![Value::Int(1)]]);
    assert!(matches!(b.unwrap_err(), TdError::Engine(_)));
}
