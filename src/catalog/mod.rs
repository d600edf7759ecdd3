//! Catalog layer over the embedded analytical engine.
//!
//! Bridges arbitrary tabular inputs (local files, remote CSV URLs) into a
//! queryable relational namespace. The store owns a single DuckDB connection
//! and performs no locking of its own; concurrent callers must serialize
//! access (the session wraps the store in a mutex for exactly that reason).

mod format;
mod result;

pub use format::{default_table_name, ExportFormat, SourceFormat};
pub use result::{ColumnInfo, QueryOutput, ResultHandle, Row, TableStats, Value};

use crate::error::{DuckboardError, Result};
use duckdb::Connection;
use format::{escape_literal, quote_ident};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// Registry of loaded relations backed by a DuckDB connection.
///
/// Every registry entry corresponds to a live, queryable view in the engine;
/// a failed registration is never recorded.
pub struct CatalogStore {
    conn: Option<Connection>,
    registry: HashMap<String, String>,
}

impl CatalogStore {
    /// Opens a catalog backed by an in-memory engine instance.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| DuckboardError::internal(format!("Failed to open engine: {e}")))?;
        Ok(Self {
            conn: Some(conn),
            registry: HashMap::new(),
        })
    }

    /// Opens a catalog persisted at the given database file.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| {
            DuckboardError::internal(format!(
                "Failed to open engine at {}: {e}",
                path.display()
            ))
        })?;
        Ok(Self {
            conn: Some(conn),
            registry: HashMap::new(),
        })
    }

    /// Returns the live connection, or a deterministic error after `close()`.
    fn conn(&self) -> Result<&Connection> {
        self.conn.as_ref().ok_or(DuckboardError::Closed)
    }

    /// Registers a data file or URL as a named relation.
    ///
    /// The table name defaults to the sanitized file stem. Registration uses
    /// view semantics: re-registering a name replaces the prior relation.
    pub fn load_file(&mut self, source: &str, table_name: Option<&str>) -> Result<String> {
        let conn = self.conn()?;
        let format = SourceFormat::detect(source)?;
        let table = match table_name {
            Some(name) => name.to_string(),
            None => default_table_name(source),
        };

        let sql = format!(
            "CREATE OR REPLACE VIEW {} AS SELECT * FROM {}",
            quote_ident(&table),
            format.reader_expr(source)
        );
        debug!(table = %table, source = %source, "registering relation");
        conn.execute_batch(&sql)
            .map_err(|e| DuckboardError::ingestion(e.to_string()))?;

        self.registry.insert(table.clone(), source.to_string());
        info!(table = %table, format = format.as_str(), "relation registered");
        Ok(table)
    }

    /// Executes caller-supplied SQL verbatim against the current namespace.
    ///
    /// Returns a forward-only handle; re-reading requires re-executing. The
    /// registry is never mutated here, success or failure.
    pub fn execute_query(&self, sql: &str) -> Result<ResultHandle> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| DuckboardError::query(e.to_string()))?;

        let mut data: Vec<Row> = Vec::new();
        {
            let mut rows = stmt
                .query([])
                .map_err(|e| DuckboardError::query(e.to_string()))?;
            while let Some(row) = rows
                .next()
                .map_err(|e| DuckboardError::query(e.to_string()))?
            {
                let column_count = row.as_ref().column_count();
                let mut out = Vec::with_capacity(column_count);
                for idx in 0..column_count {
                    let value: duckdb::types::Value = row
                        .get(idx)
                        .map_err(|e| DuckboardError::query(e.to_string()))?;
                    out.push(Value::from_engine(value));
                }
                data.push(out);
            }
        }
        // Result schema is available on the statement once it has executed,
        // which also covers zero-row results.
        let columns = stmt.column_names();

        Ok(ResultHandle::new(columns, data))
    }

    /// Returns the ordered `(column_name, declared_type)` schema of a table.
    pub fn get_table_schema(&self, table: &str) -> Result<Vec<ColumnInfo>> {
        let conn = self.conn()?;
        if !self.registry.contains_key(table) {
            return Err(DuckboardError::unknown_table(table));
        }

        let sql = format!("DESCRIBE {}", quote_ident(table));
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| DuckboardError::query(e.to_string()))?;
        let columns = stmt
            .query_map([], |row| {
                Ok(ColumnInfo::new(
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                ))
            })
            .map_err(|e| DuckboardError::query(e.to_string()))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| DuckboardError::query(e.to_string()))?;
        Ok(columns)
    }

    /// Computes row/column statistics for a table, on demand and uncached.
    ///
    /// Reflects the live relation: results can change between calls if the
    /// underlying file changes.
    pub fn get_table_stats(&self, table: &str) -> Result<TableStats> {
        let conn = self.conn()?;
        if !self.registry.contains_key(table) {
            return Err(DuckboardError::unknown_table(table));
        }

        let count_sql = format!("SELECT COUNT(*) FROM {}", quote_ident(table));
        let row_count: i64 = conn
            .query_row(&count_sql, [], |row| row.get(0))
            .map_err(|e| DuckboardError::query(e.to_string()))?;
        let columns = self.get_table_schema(table)?;

        Ok(TableStats {
            row_count,
            column_count: columns.len(),
            columns,
        })
    }

    /// Lists registered table names, sorted for stable display.
    pub fn list_tables(&self) -> Vec<String> {
        let mut tables: Vec<String> = self.registry.keys().cloned().collect();
        tables.sort();
        tables
    }

    /// Returns the source path or URL a table was registered from.
    pub fn source_of(&self, table: &str) -> Option<&str> {
        self.registry.get(table).map(String::as_str)
    }

    /// Re-executes `sql` and streams the result to `output_path`.
    pub fn export_result(&self, sql: &str, output_path: &Path, format: ExportFormat) -> Result<()> {
        let conn = self.conn()?;
        let copy = format!(
            "COPY ({sql}) TO '{}' ({})",
            escape_literal(&output_path.display().to_string()),
            format.copy_options()
        );
        conn.execute_batch(&copy)
            .map_err(|e| DuckboardError::query(e.to_string()))?;
        info!(path = %output_path.display(), format = format.as_str(), "result exported");
        Ok(())
    }

    /// Returns true once the store has been closed.
    pub fn is_closed(&self) -> bool {
        self.conn.is_none()
    }

    /// Releases the engine connection. Subsequent calls on the store fail
    /// with [`DuckboardError::Closed`] rather than silently no-op.
    pub fn close(&mut self) -> Result<()> {
        match self.conn.take() {
            Some(conn) => conn
                .close()
                .map_err(|(_, e)| DuckboardError::internal(format!("Failed to close engine: {e}"))),
            None => Err(DuckboardError::Closed),
        }
    }
}
