//! Tests against a real Treasure Data account.

use td_glance::config::ConnectionConfig;
use td_glance::QueryAdapter;

/// Helper to build a config from TD_API_KEY and TD_DATABASE.
fn get_test_config() -> Option<ConnectionConfig> {
    let mut config = ConnectionConfig::default();
    config.apply_env_defaults();
    config.validate().ok()?;
    Some(config)
}

#[tokio::test]
async fn test_live_presto_select() {
    let Some(config) = get_test_config() else {
        eprintln!("Skipping test: TD_API_KEY/TD_DATABASE not set");
        return;
    };

    let adapter = QueryAdapter::new(config);
    let result = adapter.execute("SELECT 1 AS one, 'x' AS two").await.unwrap();

    assert_eq!(result.fields, vec!["one", "two"]);
    assert_eq!(result.row_count(), 1);
}

#[tokio::test]
async fn test_live_fetch_tables() {
    let Some(config) = get_test_config() else {
        eprintln!("Skipping test: TD_API_KEY/TD_DATABASE not set");
        return;
    };

    let adapter = QueryAdapter::new(config);
    let tables = adapter.fetch_tables().await.unwrap();

    for table in &tables {
        assert_eq!(table.kind, "BASE TABLE");
    }
}
