//! End-to-end fetch tests.
//!
//! Submit, wait and read back results through the public client API.

use std::sync::Arc;
use std::time::Duration;

use athena_fetch::location::ObjectLocation;
use athena_fetch::logging::try_init_stderr_logging;
use athena_fetch::service::MockQueryService;
use athena_fetch::storage::ObjectStoreResultStore;
use athena_fetch::{AthenaError, ClientConfig, ExecutionState, QueryClient};
use pretty_assertions::assert_eq;

const OUTPUT_LOCATION: &str = "s3://query-results/athena/";

/// Helper to build a client over the given backends.
fn client(service: Arc<MockQueryService>, store: Arc<ObjectStoreResultStore>) -> QueryClient {
    try_init_stderr_logging();
    let config = ClientConfig::new()
        .with_output_location(OUTPUT_LOCATION)
        .with_poll_interval(Duration::from_millis(1));
    QueryClient::with_backends(config, service, store)
}

/// Stores the result file the n-th submitted job will produce.
async fn put_result(store: &ObjectStoreResultStore, job: usize, content: &'static str) {
    let location = ObjectLocation::new("query-results", format!("athena/job-{job}.csv"));
    store.put(&location, content).await.unwrap();
}

#[tokio::test]
async fn test_select_uses_header_row() {
    let service = Arc::new(MockQueryService::with_states(vec![
        ExecutionState::Queued,
        ExecutionState::Running,
        ExecutionState::Succeeded,
    ]));
    let store = Arc::new(ObjectStoreResultStore::in_memory());
    put_result(&store, 1, "\"id\",\"name\"\n\"1\",\"alice\"\n\"2\",\"bob\"\n\"3\",\"carol\"\n").await;

    let client = client(service.clone(), store);
    let table = client
        .run_and_fetch("SELECT id, name FROM users")
        .await
        .unwrap()
        .expect("Expected a table");

    assert_eq!(
        table.columns,
        Some(vec!["id".to_string(), "name".to_string()])
    );
    assert_eq!(table.row_count(), 3);
    assert_eq!(table.column("name"), Some(vec!["alice", "bob", "carol"]));
}

#[tokio::test]
async fn test_lowercase_select_still_has_header() {
    let service = Arc::new(MockQueryService::new());
    let store = Arc::new(ObjectStoreResultStore::in_memory());
    put_result(&store, 1, "\"n\"\n\"42\"\n").await;

    let client = client(service, store);
    let table = client
        .run_and_fetch("  select n from t")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(table.columns, Some(vec!["n".to_string()]));
    assert_eq!(table.rows, vec![vec!["42".to_string()]]);
}

#[tokio::test]
async fn test_non_select_is_headerless() {
    let service = Arc::new(MockQueryService::new());
    let store = Arc::new(ObjectStoreResultStore::in_memory());
    put_result(&store, 1, "col_a\tstring\ncol_b\tint\n").await;

    let client = client(service, store);
    let table = client
        .run_and_fetch("DESCRIBE events")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(table.columns, None);
    assert_eq!(table.row_count(), 2);
}

#[tokio::test]
async fn test_empty_result_is_none() {
    let service = Arc::new(MockQueryService::new());
    let store = Arc::new(ObjectStoreResultStore::in_memory());
    put_result(&store, 1, "").await;

    let client = client(service, store);
    let result = client
        .run_and_fetch("CREATE TABLE t (a int)")
        .await
        .unwrap();

    assert_eq!(result, None);
}

#[tokio::test]
async fn test_header_only_result_is_empty_table() {
    let service = Arc::new(MockQueryService::new());
    let store = Arc::new(ObjectStoreResultStore::in_memory());
    put_result(&store, 1, "\"id\"\n").await;

    let client = client(service, store);
    let table = client
        .run_and_fetch("SELECT id FROM users WHERE false")
        .await
        .unwrap()
        .expect("A header-only file is a table, not \"no results\"");

    assert!(table.is_empty());
    assert_eq!(table.columns, Some(vec!["id".to_string()]));
}

#[tokio::test]
async fn test_failed_query_carries_reason() {
    let reason = "SYNTAX_ERROR: line 1:8: Column 'nope' cannot be resolved";
    let service = Arc::new(
        MockQueryService::with_states(vec![ExecutionState::Queued, ExecutionState::Failed])
            .with_reason(reason),
    );
    let store = Arc::new(ObjectStoreResultStore::in_memory());

    let client = client(service, store);
    let err = client
        .run_and_fetch("SELECT nope FROM users")
        .await
        .unwrap_err();

    assert!(matches!(err, AthenaError::QueryFailed { .. }));
    assert!(err.to_string().contains(reason));
}

#[tokio::test]
async fn test_missing_result_object_is_storage_error() {
    let service = Arc::new(MockQueryService::new());
    let store = Arc::new(ObjectStoreResultStore::in_memory());

    let client = client(service, store);
    let err = client.run_and_fetch("SELECT 1").await.unwrap_err();

    assert!(matches!(err, AthenaError::Storage(_)));
}

#[tokio::test]
async fn test_result_key_derived_when_location_not_reported() {
    let service = Arc::new(MockQueryService::new().without_output_location());
    let store = Arc::new(ObjectStoreResultStore::in_memory());
    put_result(&store, 1, "\"x\"\n\"1\"\n").await;

    let client = client(service, store);
    let table = client.run_and_fetch("SELECT x FROM t").await.unwrap().unwrap();

    assert_eq!(table.row_count(), 1);
}

#[tokio::test]
async fn test_prefix_recurring_in_path() {
    let service = Arc::new(MockQueryService::new());
    let store = Arc::new(ObjectStoreResultStore::in_memory());
    store
        .put(
            &ObjectLocation::new("athena", "athena/athena/job-1.csv"),
            "\"v\"\n\"ok\"\n",
        )
        .await
        .unwrap();

    let config = ClientConfig::new()
        .with_output_location("athena/athena/athena")
        .with_poll_interval(Duration::from_millis(1));
    let client = QueryClient::with_backends(config, service.clone(), store);
    let table = client
        .run_and_fetch("SELECT v FROM t")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(table.column("v"), Some(vec!["ok"]));
    assert_eq!(
        service.submitted()[0].output_location,
        "s3://athena/athena/athena/"
    );
}

#[tokio::test]
async fn test_missing_output_location_fails_before_submission() {
    let service = Arc::new(MockQueryService::new());
    let store = Arc::new(ObjectStoreResultStore::in_memory());
    let client = QueryClient::with_backends(ClientConfig::new(), service.clone(), store);

    let err = client.run_and_fetch("SELECT 1").await.unwrap_err();

    assert_eq!(err.category(), "Configuration Error");
    assert!(service.submitted().is_empty());
}

#[tokio::test]
async fn test_concurrent_queries_on_one_client() {
    let service = Arc::new(MockQueryService::with_states(vec![
        ExecutionState::Running,
        ExecutionState::Succeeded,
    ]));
    let store = Arc::new(ObjectStoreResultStore::in_memory());
    put_result(&store, 1, "\"a\"\n\"1\"\n").await;
    put_result(&store, 2, "\"a\"\n\"1\"\n").await;

    let client = client(service.clone(), store);
    let (first, second) = tokio::join!(
        client.run_and_fetch("SELECT a FROM t"),
        client.run_and_fetch("SELECT a FROM t"),
    );

    assert_eq!(first.unwrap().unwrap().row_count(), 1);
    assert_eq!(second.unwrap().unwrap().row_count(), 1);
    assert_eq!(service.submitted().len(), 2);
}
