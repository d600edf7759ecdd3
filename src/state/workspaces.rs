//! Workspace lifecycle persistence.
//!
//! A workspace scopes data-source registrations and query history. Exactly
//! one workspace named "default" is guaranteed to exist after initialization.

use crate::error::{DuckboardError, Result};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqlitePool;
use sqlx::FromRow;
use tracing::info;

pub const DEFAULT_WORKSPACE_NAME: &str = "default";

/// A workspace record.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Workspace {
    pub id: i64,
    pub name: String,
    pub created_at: String,
    pub last_accessed: String,
    pub is_active: bool,
}

/// Returns the default workspace's id, creating it when absent.
///
/// Safe under repeated calls: the insert is a no-op once the row exists, so
/// no duplicate default workspace can be created.
pub async fn ensure_default_workspace(pool: &SqlitePool) -> Result<i64> {
    sqlx::query(
        r#"
        INSERT INTO workspaces (name, is_active) VALUES (?, 1)
        ON CONFLICT(name) DO NOTHING
        "#,
    )
    .bind(DEFAULT_WORKSPACE_NAME)
    .execute(pool)
    .await
    .map_err(|e| {
        DuckboardError::state_store(format!("Failed to create default workspace: {e}"))
    })?;

    let (id,): (i64,) = sqlx::query_as("SELECT id FROM workspaces WHERE name = ?")
        .bind(DEFAULT_WORKSPACE_NAME)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            DuckboardError::state_store(format!("Failed to look up default workspace: {e}"))
        })?;

    Ok(id)
}

/// Creates a new workspace. Fails when the name is already taken.
pub async fn create_workspace(pool: &SqlitePool, name: &str) -> Result<i64> {
    let result = sqlx::query("INSERT INTO workspaces (name) VALUES (?)")
        .bind(name)
        .execute(pool)
        .await
        .map_err(|e| {
            DuckboardError::state_store(format!("Failed to create workspace '{name}': {e}"))
        })?;

    info!(workspace = name, "workspace created");
    Ok(result.last_insert_rowid())
}

/// Lists all workspaces, most recently accessed first.
pub async fn list_workspaces(pool: &SqlitePool) -> Result<Vec<Workspace>> {
    sqlx::query_as::<_, Workspace>(
        r#"
        SELECT id, name, created_at, last_accessed, is_active
        FROM workspaces
        ORDER BY last_accessed DESC, id
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(|e| DuckboardError::state_store(format!("Failed to list workspaces: {e}")))
}

/// Gets a workspace by id.
pub async fn get_workspace(pool: &SqlitePool, id: i64) -> Result<Option<Workspace>> {
    sqlx::query_as::<_, Workspace>(
        r#"
        SELECT id, name, created_at, last_accessed, is_active
        FROM workspaces
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|e| DuckboardError::state_store(format!("Failed to get workspace: {e}")))
}

/// Marks a workspace active (exclusively) and refreshes `last_accessed`.
pub async fn activate_workspace(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("UPDATE workspaces SET is_active = (id = ?)")
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| DuckboardError::state_store(format!("Failed to activate workspace: {e}")))?;

    let result = sqlx::query("UPDATE workspaces SET last_accessed = datetime('now') WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| DuckboardError::state_store(format!("Failed to touch workspace: {e}")))?;

    if result.rows_affected() == 0 {
        return Err(DuckboardError::state_store(format!(
            "No workspace with id {id}"
        )));
    }
    Ok(())
}

/// Deletes a workspace; owned data sources and history rows cascade.
pub async fn delete_workspace(pool: &SqlitePool, id: i64) -> Result<u64> {
    let result = sqlx::query("DELETE FROM workspaces WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| DuckboardError::state_store(format!("Failed to delete workspace: {e}")))?;

    if result.rows_affected() > 0 {
        info!(workspace_id = id, "workspace deleted");
    }
    Ok(result.rows_affected())
}
