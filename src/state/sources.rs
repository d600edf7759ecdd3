//! Per-workspace data-source registrations.
//!
//! Records which table names a workspace has registered and where the data
//! came from. A workspace cannot register the same table name twice; the
//! registration is replaced instead.

use crate::error::{DuckboardError, Result};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqlitePool;
use sqlx::FromRow;

/// A registered data source within a workspace.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DataSourceRecord {
    pub id: i64,
    pub workspace_id: i64,
    pub table_name: String,
    pub source_path: String,
    pub source_type: String,
    pub added_at: String,
}

/// Records a data source, replacing any prior registration of the same
/// table name in the workspace.
pub async fn record_data_source(
    pool: &SqlitePool,
    workspace_id: i64,
    table_name: &str,
    source_path: &str,
    source_type: &str,
) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO data_sources (workspace_id, table_name, source_path, source_type)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(workspace_id, table_name) DO UPDATE SET
            source_path = excluded.source_path,
            source_type = excluded.source_type,
            added_at = datetime('now')
        "#,
    )
    .bind(workspace_id)
    .bind(table_name)
    .bind(source_path)
    .bind(source_type)
    .execute(pool)
    .await
    .map_err(|e| {
        DuckboardError::state_store(format!("Failed to record data source '{table_name}': {e}"))
    })?;

    Ok(result.last_insert_rowid())
}

/// Lists the data sources registered in a workspace.
pub async fn list_data_sources(
    pool: &SqlitePool,
    workspace_id: i64,
) -> Result<Vec<DataSourceRecord>> {
    sqlx::query_as::<_, DataSourceRecord>(
        r#"
        SELECT id, workspace_id, table_name, source_path, source_type, added_at
        FROM data_sources
        WHERE workspace_id = ?
        ORDER BY table_name
        "#,
    )
    .bind(workspace_id)
    .fetch_all(pool)
    .await
    .map_err(|e| DuckboardError::state_store(format!("Failed to list data sources: {e}")))
}

/// Removes a data-source registration. Returns true if a row was deleted.
pub async fn remove_data_source(
    pool: &SqlitePool,
    workspace_id: i64,
    table_name: &str,
) -> Result<bool> {
    let result = sqlx::query("DELETE FROM data_sources WHERE workspace_id = ? AND table_name = ?")
        .bind(workspace_id)
        .bind(table_name)
        .execute(pool)
        .await
        .map_err(|e| DuckboardError::state_store(format!("Failed to remove data source: {e}")))?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{migrations, workspaces};
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> (SqlitePool, i64) {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        let ws = workspaces::ensure_default_workspace(&pool).await.unwrap();
        (pool, ws)
    }

    #[tokio::test]
    async fn test_record_and_list() {
        let (pool, ws) = test_pool().await;

        record_data_source(&pool, ws, "sales", "/data/sales.csv", "csv")
            .await
            .unwrap();
        record_data_source(&pool, ws, "orders", "/data/orders.parquet", "parquet")
            .await
            .unwrap();

        let sources = list_data_sources(&pool, ws).await.unwrap();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].table_name, "orders");
        assert_eq!(sources[1].table_name, "sales");
    }

    #[tokio::test]
    async fn test_same_table_name_replaces() {
        let (pool, ws) = test_pool().await;

        record_data_source(&pool, ws, "sales", "/old/sales.csv", "csv")
            .await
            .unwrap();
        record_data_source(&pool, ws, "sales", "/new/sales.parquet", "parquet")
            .await
            .unwrap();

        let sources = list_data_sources(&pool, ws).await.unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].source_path, "/new/sales.parquet");
        assert_eq!(sources[0].source_type, "parquet");
    }

    #[tokio::test]
    async fn test_remove_data_source() {
        let (pool, ws) = test_pool().await;

        record_data_source(&pool, ws, "sales", "/data/sales.csv", "csv")
            .await
            .unwrap();
        assert!(remove_data_source(&pool, ws, "sales").await.unwrap());
        assert!(!remove_data_source(&pool, ws, "sales").await.unwrap());
        assert!(list_data_sources(&pool, ws).await.unwrap().is_empty());
    }
}
