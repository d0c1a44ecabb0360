//! Host adapter tests against the mock engine.

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use td_glance::adapter::ClientFactory;
use td_glance::config::{ConnectionConfig, HiveResultPolicy};
use td_glance::engine::{
    ColumnDef, EngineKind, JobClient, JobState, MockCall, MockJobClient, QueryResult,
    TableDescriptor, TableEntry, Value,
};
use td_glance::{QueryAdapter, TdError};

fn adapter_with(config: ConnectionConfig, client: Arc<MockJobClient>) -> QueryAdapter {
    let factory: ClientFactory = Arc::new(move |_: &ConnectionConfig| {
        let client: Arc<dyn JobClient> = client.clone();
        Ok(client)
    });
    QueryAdapter::with_client_factory(config, factory).with_poll_interval(Duration::from_millis(1))
}

fn three_row_job() -> Arc<MockJobClient> {
    Arc::new(
        MockJobClient::new()
            .with_statuses([JobState::Queued, JobState::Running, JobState::Success])
            .with_schema(r#"[["id","long"],["name","string"]]"#)
            .with_result("[1,\"a\"]\n[2,\"b\"]\n[3,\"c\"]\n"),
    )
}

#[tokio::test]
async fn test_fetch_tables_maps_listing() {
    let client = Arc::new(MockJobClient::new().with_tables(vec![TableEntry {
        name: "t".to_string(),
        schema: Some(r#"[["id","long"]]"#.to_string()),
        count: 5,
    }]));
    let adapter = adapter_with(ConnectionConfig::new("1/abc", "db"), client);

    let tables = adapter.fetch_tables().await.unwrap();

    assert_eq!(
        tables,
        vec![TableDescriptor {
            name: "t".to_string(),
            columns: vec![ColumnDef::new("id", "long")],
            count: 5,
            kind: "BASE TABLE".to_string(),
        }]
    );
}

#[tokio::test]
async fn test_fetch_tables_transport_error() {
    let client = Arc::new(
        MockJobClient::new().failing(td_glance::engine::MockOp::ListTables, "401 Unauthorized"),
    );
    let adapter = adapter_with(ConnectionConfig::new("1/abc", "db"), client);

    let err = adapter.fetch_tables().await.unwrap_err();
    assert!(matches!(err, TdError::Transport(_)));
}

#[tokio::test]
async fn test_hive_query_returns_empty_result() {
    // Pins current behavior: a successful Hive query with 3 rows comes back
    // empty. This is likely not what users expect; see hive_results.
    let client = three_row_job();
    let config = ConnectionConfig::new("1/abc", "db").with_engine(EngineKind::Hive);
    let adapter = adapter_with(config, client.clone());

    let result = adapter.execute("SELECT id, name FROM t").await.unwrap();

    assert_eq!(result, QueryResult { fields: vec![], rows: vec![] });
    assert!(matches!(
        &client.calls()[0],
        MockCall::Submit { engine: EngineKind::Hive, .. }
    ));
}

#[tokio::test]
async fn test_hive_query_pass_through_keeps_rows() {
    let client = three_row_job();
    let config = ConnectionConfig::new("1/abc", "db")
        .with_engine(EngineKind::Hive)
        .with_hive_results(HiveResultPolicy::PassThrough);
    let adapter = adapter_with(config, client);

    let result = adapter.execute("SELECT id, name FROM t").await.unwrap();

    assert_eq!(result.fields, vec!["id", "name"]);
    assert_eq!(result.rows[2], vec![Value::Int(3), Value::from("c")]);
}

#[tokio::test]
async fn test_presto_query_returns_result_verbatim() {
    let adapter = adapter_with(ConnectionConfig::new("1/abc", "db"), three_row_job());

    let result = adapter.execute("SELECT id, name FROM t").await.unwrap();

    assert_eq!(result.row_count(), 3);
    assert_eq!(result.rows[0], vec![Value::Int(1), Value::from("a")]);
}

#[tokio::test]
async fn test_cancel_with_no_query_in_flight() {
    let client = three_row_job();
    let adapter = adapter_with(ConnectionConfig::new("1/abc", "db"), client.clone());

    adapter.cancel();

    assert!(!adapter.is_running());
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn test_cancel_after_query_finished_is_noop() {
    let client = three_row_job();
    let adapter = adapter_with(ConnectionConfig::new("1/abc", "db"), client.clone());

    adapter.execute("SELECT 1").await.unwrap();
    adapter.cancel();

    assert_eq!(client.kill_count(), 0);
}

#[tokio::test]
async fn test_adapter_cancel_stops_running_query() {
    let client = Arc::new(MockJobClient::new().with_statuses([JobState::Running]));
    let polled = client.polled();
    let adapter = Arc::new(adapter_with(ConnectionConfig::new("1/abc", "db"), client.clone()));

    let task = {
        let adapter = adapter.clone();
        tokio::spawn(async move { adapter.execute("SELECT * FROM big").await })
    };
    polled.notified().await;
    assert!(adapter.is_running());

    adapter.cancel();

    let err = task.await.unwrap().unwrap_err();
    assert_eq!(err.to_string(), "Query is canceled");
    assert!(!adapter.is_running());
    assert_eq!(client.kill_count(), 1);
}

#[tokio::test]
async fn test_slot_released_when_execution_dropped() {
    let client = Arc::new(MockJobClient::new().with_statuses([JobState::Running]));
    let polled = client.polled();
    let adapter = Arc::new(adapter_with(ConnectionConfig::new("1/abc", "db"), client));

    let task = {
        let adapter = adapter.clone();
        tokio::spawn(async move { adapter.execute("SELECT 1").await })
    };
    polled.notified().await;
    task.abort();
    let _ = task.await;

    assert!(!adapter.is_running());
}

#[test]
fn test_table_summary_is_field_type_table() {
    let adapter = adapter_with(ConnectionConfig::new("1/abc", "db"), Arc::new(MockJobClient::new()));
    let table = TableDescriptor {
        name: "www_access".to_string(),
        columns: vec![ColumnDef::new("host", "string"), ColumnDef::new("time", "int")],
        count: 5000,
        kind: "BASE TABLE".to_string(),
    };

    let summary = adapter.fetch_table_summary(&table);

    assert_eq!(summary.name, "www_access");
    assert_eq!(summary.defs.fields, vec!["Field", "Type"]);
    assert_eq!(summary.defs.row_count(), 2);
}
