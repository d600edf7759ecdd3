//! End-to-end tests through the session facade.

use duckboard::catalog::{CatalogStore, ExportFormat, Value};
use duckboard::session::{LogStatusReporter, Session};
use duckboard::state::{QueryStatus, StateStore};
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::tempdir;

async fn create_session(dir: &Path) -> Session {
    let catalog = CatalogStore::open_in_memory().unwrap();
    let state = StateStore::open(&dir.join("state.db")).await.unwrap();
    Session::new(catalog, state, Arc::new(LogStatusReporter))
        .await
        .unwrap()
}

fn write_csv(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[tokio::test]
async fn test_load_query_and_history_flow() {
    let dir = tempdir().unwrap();
    let csv = write_csv(
        dir.path(),
        "sales.csv",
        "region,amount\nnorth,10\nsouth,20\nnorth,5\n",
    );
    let mut session = create_session(dir.path()).await;

    let table = session.load(csv.to_str().unwrap(), None).await.unwrap();
    assert_eq!(table, "sales");

    let run = session
        .query("SELECT SUM(amount) AS total FROM sales")
        .await
        .unwrap();
    assert_eq!(run.output.columns, vec!["total"]);
    assert_eq!(run.output.rows[0][0], Value::Int(35));

    // Durable side effects: one registration, one successful history entry.
    let sources = session.list_data_sources().await.unwrap();
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0].source_path, csv.to_str().unwrap());

    let history = session.list_history(None).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, QueryStatus::Success);

    session.close().await.unwrap();
}

#[tokio::test]
async fn test_failed_query_leaves_no_history() {
    let dir = tempdir().unwrap();
    let mut session = create_session(dir.path()).await;

    assert!(session.query("SELECT FROM").await.is_err());
    assert!(session.list_history(None).await.unwrap().is_empty());

    session.close().await.unwrap();
}

#[tokio::test]
async fn test_registrations_survive_state_reopen() {
    let dir = tempdir().unwrap();
    let csv = write_csv(dir.path(), "orders.csv", "id\n1\n2\n");

    let mut session = create_session(dir.path()).await;
    session.load(csv.to_str().unwrap(), None).await.unwrap();
    let workspace_id = session.workspace_id();
    session.close().await.unwrap();

    // A new session over the same state file sees the prior registration,
    // even though the in-memory catalog starts empty.
    let session = create_session(dir.path()).await;
    assert_eq!(session.workspace_id(), workspace_id);
    assert!(session.list_tables().unwrap().is_empty());

    let sources = session.list_data_sources().await.unwrap();
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0].table_name, "orders");

    session.close().await.unwrap();
}

#[tokio::test]
async fn test_export_through_session() {
    let dir = tempdir().unwrap();
    let csv = write_csv(dir.path(), "data.csv", "a,b\n1,x\n2,y\n");
    let out = dir.path().join("result.csv");

    let mut session = create_session(dir.path()).await;
    session.load(csv.to_str().unwrap(), None).await.unwrap();
    session
        .export("SELECT * FROM data ORDER BY a", &out, ExportFormat::Csv)
        .unwrap();

    let content = std::fs::read_to_string(&out).unwrap();
    assert_eq!(content.lines().next().unwrap(), "a,b");
    assert_eq!(content.lines().count(), 3);

    session.close().await.unwrap();
}

#[tokio::test]
async fn test_reload_replaces_registration_record() {
    let dir = tempdir().unwrap();
    let first = write_csv(dir.path(), "v1.csv", "a\n1\n");
    let second = write_csv(dir.path(), "v2.csv", "a\n1\n2\n");

    let mut session = create_session(dir.path()).await;
    session
        .load(first.to_str().unwrap(), Some("data"))
        .await
        .unwrap();
    session
        .load(second.to_str().unwrap(), Some("data"))
        .await
        .unwrap();

    let sources = session.list_data_sources().await.unwrap();
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0].source_path, second.to_str().unwrap());

    let stats = session.table_stats("data").unwrap();
    assert_eq!(stats.row_count, 2);

    session.close().await.unwrap();
}
