//! Live Athena tests.
//!
//! Require AWS credentials and ATHENA_OUTPUT_LOCATION.

use athena_fetch::config::OUTPUT_LOCATION_ENV;
use athena_fetch::{AthenaError, ClientConfig, QueryClient};

/// Helper to create a live client, if configured.
async fn get_live_client() -> Option<QueryClient> {
    std::env::var(OUTPUT_LOCATION_ENV).ok()?;
    Some(QueryClient::connect(ClientConfig::from_env()).await)
}

#[tokio::test]
async fn test_live_select_literal() {
    let Some(client) = get_live_client().await else {
        eprintln!("Skipping test: {} not set", OUTPUT_LOCATION_ENV);
        return;
    };

    let table = client
        .run_and_fetch("SELECT 1 AS num, 'hello' AS greeting")
        .await
        .unwrap()
        .expect("Expected a table");

    assert_eq!(
        table.columns,
        Some(vec!["num".to_string(), "greeting".to_string()])
    );
    assert_eq!(table.rows, vec![vec!["1".to_string(), "hello".to_string()]]);
}

#[tokio::test]
async fn test_live_syntax_error() {
    let Some(client) = get_live_client().await else {
        eprintln!("Skipping test: {} not set", OUTPUT_LOCATION_ENV);
        return;
    };

    let err = client.run_and_fetch("SELECT FROM").await.unwrap_err();
    match err {
        AthenaError::Submission(_) | AthenaError::QueryFailed { .. } => {}
        other => panic!("Expected a submission or query failure, got {:?}", other),
    }
}
