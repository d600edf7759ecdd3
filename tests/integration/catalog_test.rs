//! Integration tests for the catalog layer: ingestion, querying and export.

use duckboard::catalog::{CatalogStore, ExportFormat, Value};
use duckboard::error::DuckboardError;
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write_csv(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_load_query_roundtrip() {
    let dir = tempdir().unwrap();
    let csv = write_csv(
        dir.path(),
        "sales.csv",
        "region,amount\nnorth,10\nsouth,20\nnorth,5\n",
    );

    let mut catalog = CatalogStore::open_in_memory().unwrap();
    catalog.load_file(csv.to_str().unwrap(), None).unwrap();

    let mut handle = catalog
        .execute_query(
            "SELECT region, SUM(amount) AS total FROM sales GROUP BY region ORDER BY region",
        )
        .unwrap();
    let output = handle.materialize().unwrap();

    assert_eq!(output.columns, vec!["region", "total"]);
    assert_eq!(output.rows.len(), 2);
    assert_eq!(output.rows[0][0], Value::String("north".to_string()));
    assert_eq!(output.rows[0][1], Value::Int(15));
    assert_eq!(output.rows[1][1], Value::Int(20));
}

#[test]
fn test_result_handle_single_use() {
    let catalog = CatalogStore::open_in_memory().unwrap();
    let mut handle = catalog.execute_query("SELECT 1").unwrap();

    handle.materialize().unwrap();
    assert!(matches!(
        handle.materialize(),
        Err(DuckboardError::AlreadyConsumed)
    ));
}

#[test]
fn test_zero_row_result_keeps_columns() {
    let catalog = CatalogStore::open_in_memory().unwrap();
    let mut handle = catalog
        .execute_query("SELECT 1 AS a, 'x' AS b WHERE false")
        .unwrap();
    let output = handle.materialize().unwrap();

    assert_eq!(output.columns, vec!["a", "b"]);
    assert!(output.is_empty());
}

#[test]
fn test_temporal_columns_render_as_text() {
    let catalog = CatalogStore::open_in_memory().unwrap();
    let mut handle = catalog
        .execute_query(
            "SELECT DATE '2024-01-01' AS d, \
             TIMESTAMP '2024-01-01 12:34:56' AS ts, \
             TIME '08:30:00' AS t",
        )
        .unwrap();
    let output = handle.materialize().unwrap();

    assert_eq!(output.rows[0][0], Value::String("2024-01-01".to_string()));
    assert_eq!(
        output.rows[0][1],
        Value::String("2024-01-01 12:34:56".to_string())
    );
    assert_eq!(output.rows[0][2], Value::String("08:30:00".to_string()));
    assert_eq!(
        output.to_csv(),
        "d,ts,t\n2024-01-01,2024-01-01 12:34:56,08:30:00\n"
    );
}

#[test]
fn test_csv_export_reloads_identically() {
    let dir = tempdir().unwrap();
    let csv = write_csv(dir.path(), "input.csv", "id,name\n1,Alice\n2,Bob\n3,Cara\n");
    let out = dir.path().join("exported.csv");

    let mut catalog = CatalogStore::open_in_memory().unwrap();
    catalog.load_file(csv.to_str().unwrap(), None).unwrap();
    catalog
        .export_result("SELECT * FROM input ORDER BY id", &out, ExportFormat::Csv)
        .unwrap();

    // The exported file is itself a loadable source.
    catalog
        .load_file(out.to_str().unwrap(), Some("reloaded"))
        .unwrap();
    let stats = catalog.get_table_stats("reloaded").unwrap();
    assert_eq!(stats.row_count, 3);
    assert_eq!(stats.column_count, 2);
}

#[test]
fn test_parquet_export_reloads_identically() {
    let dir = tempdir().unwrap();
    let csv = write_csv(dir.path(), "input.csv", "id,amount\n1,9.5\n2,3.25\n");
    let out = dir.path().join("exported.parquet");

    let mut catalog = CatalogStore::open_in_memory().unwrap();
    catalog.load_file(csv.to_str().unwrap(), None).unwrap();
    catalog
        .export_result("SELECT * FROM input", &out, ExportFormat::Parquet)
        .unwrap();

    catalog
        .load_file(out.to_str().unwrap(), Some("reloaded"))
        .unwrap();
    let mut handle = catalog
        .execute_query("SELECT COUNT(*) FROM reloaded")
        .unwrap();
    let output = handle.materialize().unwrap();
    assert_eq!(output.rows[0][0], Value::Int(2));
}

#[test]
fn test_persistent_catalog_file() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("catalog.duckdb");

    let mut catalog = CatalogStore::open(&db_path).unwrap();
    let mut handle = catalog.execute_query("SELECT 40 + 2").unwrap();
    assert_eq!(handle.materialize().unwrap().rows[0][0], Value::Int(42));
    catalog.close().unwrap();

    assert!(db_path.exists());
}

#[test]
fn test_query_against_replaced_relation() {
    let dir = tempdir().unwrap();
    let first = write_csv(dir.path(), "v1.csv", "a\n1\n2\n");
    let second = write_csv(dir.path(), "v2.csv", "a\n1\n2\n3\n4\n");

    let mut catalog = CatalogStore::open_in_memory().unwrap();
    catalog
        .load_file(first.to_str().unwrap(), Some("data"))
        .unwrap();
    catalog
        .load_file(second.to_str().unwrap(), Some("data"))
        .unwrap();

    let stats = catalog.get_table_stats("data").unwrap();
    assert_eq!(stats.row_count, 4);
    assert_eq!(
        catalog.source_of("data"),
        Some(second.to_str().unwrap())
    );
}
