//! Integration tests for the durable state layer.

use duckboard::error::Result;
use duckboard::state::{QueryStatus, StateStore, DEFAULT_WORKSPACE_NAME};
use tempfile::tempdir;

async fn create_test_db() -> (StateStore, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test_state.db");
    let db = StateStore::open(&path).await.unwrap();
    (db, dir)
}

#[tokio::test]
async fn test_state_db_creation() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.db");

    let db = StateStore::open(&path).await.unwrap();
    assert!(path.exists());
    db.close().await;
}

#[tokio::test]
async fn test_default_workspace_survives_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.db");

    let db = StateStore::open(&path).await.unwrap();
    let first = db.ensure_default_workspace().await.unwrap();
    db.close().await;

    let db = StateStore::open(&path).await.unwrap();
    assert_eq!(db.ensure_default_workspace().await.unwrap(), first);

    let workspaces = db.list_workspaces().await.unwrap();
    assert_eq!(workspaces.len(), 1);
    assert_eq!(workspaces[0].name, DEFAULT_WORKSPACE_NAME);
    db.close().await;
}

#[tokio::test]
async fn test_workspace_scoping() -> Result<()> {
    let (db, _dir) = create_test_db().await;

    let alpha = db.create_workspace("alpha").await?;
    let beta = db.create_workspace("beta").await?;

    db.record_data_source(alpha, "sales", "/data/sales.csv", "csv")
        .await?;
    db.record_data_source(beta, "sales", "/other/sales.parquet", "parquet")
        .await?;

    // Same table name, different workspaces, no conflict.
    let alpha_sources = db.list_data_sources(alpha).await?;
    let beta_sources = db.list_data_sources(beta).await?;
    assert_eq!(alpha_sources[0].source_type, "csv");
    assert_eq!(beta_sources[0].source_type, "parquet");

    db.close().await;
    Ok(())
}

#[tokio::test]
async fn test_delete_workspace_cascades() -> Result<()> {
    let (db, _dir) = create_test_db().await;

    let kept = db.ensure_default_workspace().await?;
    let doomed = db.create_workspace("doomed").await?;

    db.record_data_source(doomed, "t", "/d/t.csv", "csv").await?;
    db.record_query(doomed, "SELECT 1", QueryStatus::Success, Some(2), None)
        .await?;
    db.record_query(kept, "SELECT 2", QueryStatus::Success, Some(2), None)
        .await?;

    assert_eq!(db.delete_workspace(doomed).await?, 1);

    assert!(db.get_workspace(doomed).await?.is_none());
    assert!(db.list_data_sources(doomed).await?.is_empty());
    assert_eq!(db.count_history(doomed).await?, 0);
    assert_eq!(db.count_history(kept).await?, 1);

    db.close().await;
    Ok(())
}

#[tokio::test]
async fn test_history_is_append_only_and_ordered() -> Result<()> {
    let (db, _dir) = create_test_db().await;
    let ws = db.ensure_default_workspace().await?;

    for i in 0..5 {
        db.record_query(
            ws,
            &format!("SELECT {i}"),
            QueryStatus::Success,
            Some(i),
            None,
        )
        .await?;
    }
    db.record_query(
        ws,
        "SELECT broken",
        QueryStatus::Error,
        None,
        Some("Parser Error"),
    )
    .await?;

    let all = db.list_history(ws, None).await?;
    assert_eq!(all.len(), 6);
    assert_eq!(all[0].query_text, "SELECT broken");
    assert_eq!(all[0].status, QueryStatus::Error);
    assert_eq!(all[5].query_text, "SELECT 0");

    let limited = db.list_history(ws, Some(2)).await?;
    assert_eq!(limited.len(), 2);

    db.close().await;
    Ok(())
}

#[tokio::test]
async fn test_settings_survive_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.db");

    let db = StateStore::open(&path).await.unwrap();
    db.set_setting("max_display_rows", "250").await.unwrap();
    db.close().await;

    let db = StateStore::open(&path).await.unwrap();
    assert_eq!(
        db.get_setting_int("max_display_rows", 100).await.unwrap(),
        250
    );
    db.close().await;
}

#[tokio::test]
async fn test_recovery_from_corrupted_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.db");

    // Not a SQLite database.
    std::fs::write(&path, "this is not a database").unwrap();

    let db = StateStore::open(&path).await.unwrap();
    db.ensure_default_workspace().await.unwrap();
    db.close().await;

    assert!(path.with_extension("db.bak").exists());
}
