//! Durable application state, independent of the catalog's lifetime.
//!
//! A small SQLite database holds settings, workspaces, per-workspace
//! data-source registrations, and query history. Every mutation commits
//! before the call returns, so a crash leaves the prior state intact rather
//! than a partial one.

mod history;
mod migrations;
mod settings;
mod sources;
mod workspaces;

pub use history::{HistoryEntry, QueryStatus};
pub use sources::DataSourceRecord;
pub use workspaces::{Workspace, DEFAULT_WORKSPACE_NAME};

use crate::error::{DuckboardError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

const MAX_RETRY_ATTEMPTS: u32 = 3;
const RETRY_DELAY_MS: u64 = 100;

/// Main persistence interface for the application state database.
pub struct StateStore {
    pool: SqlitePool,
    db_path: PathBuf,
}

impl StateStore {
    /// Opens or creates the state database at the default platform path.
    ///
    /// - Linux/macOS: `~/.config/duckboard/state.db`
    /// - Windows: `%APPDATA%\duckboard\state.db`
    pub async fn open_default() -> Result<Self> {
        let path = Self::default_path()?;
        Self::open(&path).await
    }

    /// Opens or creates the state database at the specified path.
    ///
    /// Initialization is idempotent: schema creation is safe against an
    /// existing database file.
    pub async fn open(path: &Path) -> Result<Self> {
        Self::ensure_parent_dirs(path)?;

        match Self::try_open(path).await {
            Ok(db) => Ok(db),
            Err(e) => {
                warn!("Failed to open state database: {e}. Attempting recovery...");
                Self::attempt_recovery(path).await
            }
        }
    }

    /// Returns the default state database path for the current platform.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| DuckboardError::state_store("Could not determine config directory"))?;
        Ok(config_dir.join("duckboard").join("state.db"))
    }

    /// Attempts to open the database with retries for lock contention.
    async fn try_open(path: &Path) -> Result<Self> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRY_ATTEMPTS {
            if attempt > 0 {
                tokio::time::sleep(Duration::from_millis(RETRY_DELAY_MS * 2u64.pow(attempt)))
                    .await;
            }

            match Self::connect(path).await {
                Ok(pool) => {
                    migrations::run_migrations(&pool).await?;
                    info!("State database opened at {}", path.display());
                    return Ok(Self {
                        pool,
                        db_path: path.to_path_buf(),
                    });
                }
                Err(e) => {
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| DuckboardError::state_store("Failed to open database after retries")))
    }

    /// Creates a connection pool to the SQLite database.
    ///
    /// Foreign keys are enabled explicitly; the workspace cascade deletes
    /// depend on it.
    async fn connect(path: &Path) -> Result<SqlitePool> {
        let conn_str = format!("sqlite:{}?mode=rwc", path.display());
        let options = SqliteConnectOptions::from_str(&conn_str)
            .map_err(|e| DuckboardError::state_store(format!("Invalid database path: {e}")))?
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .foreign_keys(true)
            .create_if_missing(true);

        SqlitePoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await
            .map_err(|e| {
                DuckboardError::state_store(format!("Failed to connect to state database: {e}"))
            })
    }

    /// Ensures parent directories exist for the database path.
    fn ensure_parent_dirs(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DuckboardError::state_store(format!(
                    "Failed to create config directory {}: {e}",
                    parent.display()
                ))
            })?;
        }
        Ok(())
    }

    /// Attempts to recover from a corrupted database by backing up and recreating.
    async fn attempt_recovery(path: &Path) -> Result<Self> {
        let backup_path = path.with_extension("db.bak");

        if path.exists() {
            std::fs::rename(path, &backup_path).map_err(|e| {
                DuckboardError::state_store(format!(
                    "Failed to backup corrupted database to {}: {e}",
                    backup_path.display()
                ))
            })?;
            warn!("Backed up corrupted database to {}", backup_path.display());
        }

        Self::try_open(path).await.map_err(|e| {
            DuckboardError::state_store(format!("Failed to recreate database after backup: {e}"))
        })
    }

    /// Returns the path to the state database.
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Closes the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    // --- Workspaces ---

    /// Returns the default workspace's id, creating it when absent.
    pub async fn ensure_default_workspace(&self) -> Result<i64> {
        workspaces::ensure_default_workspace(&self.pool).await
    }

    /// Creates a new workspace with a unique name.
    pub async fn create_workspace(&self, name: &str) -> Result<i64> {
        workspaces::create_workspace(&self.pool, name).await
    }

    /// Lists all workspaces, most recently accessed first.
    pub async fn list_workspaces(&self) -> Result<Vec<Workspace>> {
        workspaces::list_workspaces(&self.pool).await
    }

    /// Gets a workspace by id.
    pub async fn get_workspace(&self, id: i64) -> Result<Option<Workspace>> {
        workspaces::get_workspace(&self.pool, id).await
    }

    /// Marks a workspace active and refreshes its `last_accessed` timestamp.
    pub async fn activate_workspace(&self, id: i64) -> Result<()> {
        workspaces::activate_workspace(&self.pool, id).await
    }

    /// Deletes a workspace; its data sources and history cascade.
    pub async fn delete_workspace(&self, id: i64) -> Result<u64> {
        workspaces::delete_workspace(&self.pool, id).await
    }

    // --- Settings ---

    /// Upserts a setting with a fresh timestamp.
    pub async fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        settings::set_setting(&self.pool, key, value).await
    }

    /// Retrieves a setting, or `None` when absent.
    pub async fn get_setting(&self, key: &str) -> Result<Option<String>> {
        settings::get_setting(&self.pool, key).await
    }

    /// Retrieves a setting, falling back to a default when absent.
    pub async fn get_setting_or(&self, key: &str, default: &str) -> Result<String> {
        settings::get_setting_or(&self.pool, key, default).await
    }

    /// Retrieves an integer setting, defaulting on absence or parse failure.
    pub async fn get_setting_int(&self, key: &str, default: i64) -> Result<i64> {
        settings::get_setting_int(&self.pool, key, default).await
    }

    // --- Data sources ---

    /// Records a data-source registration for a workspace.
    pub async fn record_data_source(
        &self,
        workspace_id: i64,
        table_name: &str,
        source_path: &str,
        source_type: &str,
    ) -> Result<i64> {
        sources::record_data_source(&self.pool, workspace_id, table_name, source_path, source_type)
            .await
    }

    /// Lists the data sources registered in a workspace.
    pub async fn list_data_sources(&self, workspace_id: i64) -> Result<Vec<DataSourceRecord>> {
        sources::list_data_sources(&self.pool, workspace_id).await
    }

    /// Removes a data-source registration.
    pub async fn remove_data_source(&self, workspace_id: i64, table_name: &str) -> Result<bool> {
        sources::remove_data_source(&self.pool, workspace_id, table_name).await
    }

    // --- Query history ---

    /// Appends a query execution to history.
    pub async fn record_query(
        &self,
        workspace_id: i64,
        query_text: &str,
        status: QueryStatus,
        execution_time_ms: Option<i64>,
        error_message: Option<&str>,
    ) -> Result<i64> {
        history::record_query(
            &self.pool,
            workspace_id,
            query_text,
            status,
            execution_time_ms,
            error_message,
        )
        .await
    }

    /// Lists a workspace's history entries, newest first.
    pub async fn list_history(
        &self,
        workspace_id: i64,
        limit: Option<i64>,
    ) -> Result<Vec<HistoryEntry>> {
        history::list_history(&self.pool, workspace_id, limit).await
    }

    /// Returns the count of history entries for a workspace.
    pub async fn count_history(&self, workspace_id: i64) -> Result<i64> {
        history::count_history(&self.pool, workspace_id).await
    }
}
