//! Session facade tying the catalog, state store and task runners together.
//!
//! A session owns one catalog, one workspace in the state store and one
//! background runner per task kind. All ingestion and query work funnels
//! through here so that durable bookkeeping (data-source registrations,
//! query history) stays consistent with what the engine actually did.

use crate::catalog::{
    CatalogStore, ColumnInfo, ExportFormat, QueryOutput, SourceFormat, TableStats,
};
use crate::error::{DuckboardError, Result};
use crate::state::{DataSourceRecord, HistoryEntry, QueryStatus, StateStore, Workspace};
use crate::tasks::{TaskKind, TaskOutcome, TaskRunner};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::info;

/// Receives human-readable progress messages from the session.
///
/// The terminal frontend prints these; embedders can route them anywhere.
pub trait StatusReporter: Send + Sync {
    fn report(&self, message: &str);
}

/// Default reporter that forwards messages to the log.
pub struct LogStatusReporter;

impl StatusReporter for LogStatusReporter {
    fn report(&self, message: &str) {
        info!("{message}");
    }
}

/// Outcome of a successful ingestion.
#[derive(Debug, Clone)]
pub struct LoadedSource {
    pub table: String,
    pub source: String,
    pub format: SourceFormat,
}

/// Outcome of a successful query, with wall-clock timing for history.
#[derive(Debug)]
pub struct QueryRun {
    pub output: QueryOutput,
    pub elapsed: Duration,
}

pub struct Session {
    catalog: Arc<Mutex<CatalogStore>>,
    state: Arc<StateStore>,
    workspace_id: i64,
    loads: TaskRunner<LoadedSource>,
    queries: TaskRunner<QueryRun>,
    status: Arc<dyn StatusReporter>,
}

impl Session {
    /// Creates a session bound to the default workspace, creating it if
    /// this is the first run.
    pub async fn new(
        catalog: CatalogStore,
        state: StateStore,
        status: Arc<dyn StatusReporter>,
    ) -> Result<Self> {
        let workspace_id = state.ensure_default_workspace().await?;
        Ok(Self {
            catalog: Arc::new(Mutex::new(catalog)),
            state: Arc::new(state),
            workspace_id,
            loads: TaskRunner::new(),
            queries: TaskRunner::new(),
            status,
        })
    }

    /// The workspace this session's registrations and history belong to.
    pub fn workspace_id(&self) -> i64 {
        self.workspace_id
    }

    fn lock_catalog(&self) -> Result<std::sync::MutexGuard<'_, CatalogStore>> {
        self.catalog
            .lock()
            .map_err(|_| DuckboardError::internal("catalog lock poisoned"))
    }

    /// Loads a file or URL into the catalog on the background runner, then
    /// records the registration durably.
    ///
    /// Returns the table name the data is queryable under. A failed load
    /// leaves both the catalog registry and the state store untouched.
    ///
    /// Format detection happens before submission so an unrecognized suffix
    /// comes back as the typed error instead of a stringified task failure.
    pub async fn load(&mut self, source: &str, table_name: Option<&str>) -> Result<String> {
        let format = SourceFormat::detect(source)?;
        let catalog = Arc::clone(&self.catalog);
        let source_owned = source.to_string();
        let name_owned = table_name.map(str::to_string);

        self.loads.submit(TaskKind::Load, move || {
            let mut guard = catalog
                .lock()
                .map_err(|_| DuckboardError::internal("catalog lock poisoned"))?;
            let table = guard.load_file(&source_owned, name_owned.as_deref())?;
            Ok(LoadedSource {
                table,
                source: source_owned,
                format,
            })
        })?;

        match self.loads.wait().await {
            Some(TaskOutcome::Succeeded(loaded)) => {
                self.state
                    .record_data_source(
                        self.workspace_id,
                        &loaded.table,
                        &loaded.source,
                        loaded.format.as_str(),
                    )
                    .await?;
                self.status.report(&format!(
                    "Loaded '{}' from {}",
                    loaded.table, loaded.source
                ));
                Ok(loaded.table)
            }
            Some(TaskOutcome::Failed(msg)) => {
                self.status.report(&format!("Load failed: {msg}"));
                Err(DuckboardError::ingestion(msg))
            }
            None => Err(DuckboardError::internal("load task vanished")),
        }
    }

    /// Runs SQL on the background runner and materializes the full result.
    ///
    /// Successful runs are appended to the workspace's query history with
    /// their execution time; failed runs are reported but not recorded.
    pub async fn query(&mut self, sql: &str) -> Result<QueryRun> {
        let catalog = Arc::clone(&self.catalog);
        let sql_owned = sql.to_string();

        self.queries.submit(TaskKind::Query, move || {
            let guard = catalog
                .lock()
                .map_err(|_| DuckboardError::internal("catalog lock poisoned"))?;
            let started = Instant::now();
            let mut handle = guard.execute_query(&sql_owned)?;
            let output = handle.materialize()?;
            Ok(QueryRun {
                output,
                elapsed: started.elapsed(),
            })
        })?;

        match self.queries.wait().await {
            Some(TaskOutcome::Succeeded(run)) => {
                let elapsed_ms = run.elapsed.as_millis() as i64;
                self.state
                    .record_query(
                        self.workspace_id,
                        sql,
                        QueryStatus::Success,
                        Some(elapsed_ms),
                        None,
                    )
                    .await?;
                self.status.report(&format!(
                    "Query finished in {elapsed_ms}ms ({} rows)",
                    run.output.row_count()
                ));
                Ok(run)
            }
            Some(TaskOutcome::Failed(msg)) => {
                self.status.report(&format!("Query failed: {msg}"));
                Err(DuckboardError::query(msg))
            }
            None => Err(DuckboardError::internal("query task vanished")),
        }
    }

    /// Re-executes `sql` and writes the result to `output_path`.
    pub fn export(&self, sql: &str, output_path: &Path, format: ExportFormat) -> Result<()> {
        let catalog = self.lock_catalog()?;
        catalog.export_result(sql, output_path, format)?;
        self.status
            .report(&format!("Exported result to {}", output_path.display()));
        Ok(())
    }

    /// Ordered column schema of a registered table.
    pub fn table_schema(&self, table: &str) -> Result<Vec<ColumnInfo>> {
        self.lock_catalog()?.get_table_schema(table)
    }

    /// Live row/column statistics of a registered table.
    pub fn table_stats(&self, table: &str) -> Result<TableStats> {
        self.lock_catalog()?.get_table_stats(table)
    }

    /// Registered table names, sorted.
    pub fn list_tables(&self) -> Result<Vec<String>> {
        Ok(self.lock_catalog()?.list_tables())
    }

    /// Data sources recorded for this session's workspace.
    pub async fn list_data_sources(&self) -> Result<Vec<DataSourceRecord>> {
        self.state.list_data_sources(self.workspace_id).await
    }

    /// This workspace's query history, newest first.
    pub async fn list_history(&self, limit: Option<i64>) -> Result<Vec<HistoryEntry>> {
        self.state.list_history(self.workspace_id, limit).await
    }

    /// All workspaces known to the state store.
    pub async fn list_workspaces(&self) -> Result<Vec<Workspace>> {
        self.state.list_workspaces().await
    }

    /// Direct access to the state store for settings and workspace admin.
    pub fn state(&self) -> &StateStore {
        &self.state
    }

    /// Shuts down the engine connection and the state database.
    pub async fn close(self) -> Result<()> {
        self.lock_catalog()?.close()?;
        self.state.close().await;
        Ok(())
    }
}
