//! Query history persistence.
//!
//! Append-only: entries are never mutated after insertion and are removed
//! only by workspace cascade.

use crate::error::{DuckboardError, Result};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqlitePool;
use sqlx::FromRow;

/// Query execution status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryStatus {
    Success,
    Error,
}

impl QueryStatus {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }

    fn from_str(s: &str) -> Self {
        match s {
            "error" => Self::Error,
            _ => Self::Success,
        }
    }
}

/// A query history entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub workspace_id: i64,
    pub query_text: String,
    pub executed_at: String,
    pub execution_time_ms: Option<i64>,
    pub status: QueryStatus,
    pub error_message: Option<String>,
}

/// Raw database row for a history entry.
#[derive(Debug, Clone, FromRow)]
struct HistoryEntryRow {
    id: i64,
    workspace_id: i64,
    query_text: String,
    executed_at: String,
    execution_time_ms: Option<i64>,
    status: String,
    error_message: Option<String>,
}

impl From<HistoryEntryRow> for HistoryEntry {
    fn from(row: HistoryEntryRow) -> Self {
        Self {
            id: row.id,
            workspace_id: row.workspace_id,
            query_text: row.query_text,
            executed_at: row.executed_at,
            execution_time_ms: row.execution_time_ms,
            status: QueryStatus::from_str(&row.status),
            error_message: row.error_message,
        }
    }
}

/// Appends a query execution to history.
pub async fn record_query(
    pool: &SqlitePool,
    workspace_id: i64,
    query_text: &str,
    status: QueryStatus,
    execution_time_ms: Option<i64>,
    error_message: Option<&str>,
) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO query_history
        (workspace_id, query_text, status, execution_time_ms, error_message)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(workspace_id)
    .bind(query_text)
    .bind(status.as_str())
    .bind(execution_time_ms)
    .bind(error_message)
    .execute(pool)
    .await
    .map_err(|e| DuckboardError::state_store(format!("Failed to record query: {e}")))?;

    Ok(result.last_insert_rowid())
}

/// Lists a workspace's history entries, newest first.
pub async fn list_history(
    pool: &SqlitePool,
    workspace_id: i64,
    limit: Option<i64>,
) -> Result<Vec<HistoryEntry>> {
    let mut query = String::from(
        r#"
        SELECT id, workspace_id, query_text, executed_at,
               execution_time_ms, status, error_message
        FROM query_history
        WHERE workspace_id = ?
        ORDER BY executed_at DESC, id DESC
        "#,
    );
    if limit.is_some() {
        query.push_str(" LIMIT ?");
    }

    let mut sqlx_query = sqlx::query_as::<_, HistoryEntryRow>(&query).bind(workspace_id);
    if let Some(limit) = limit {
        sqlx_query = sqlx_query.bind(limit);
    }

    let rows = sqlx_query
        .fetch_all(pool)
        .await
        .map_err(|e| DuckboardError::state_store(format!("Failed to list history: {e}")))?;

    Ok(rows.into_iter().map(HistoryEntry::from).collect())
}

/// Returns the count of history entries for a workspace.
pub async fn count_history(pool: &SqlitePool, workspace_id: i64) -> Result<i64> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM query_history WHERE workspace_id = ?")
            .bind(workspace_id)
            .fetch_one(pool)
            .await
            .map_err(|e| DuckboardError::state_store(format!("Failed to count history: {e}")))?;

    Ok(count)
}
