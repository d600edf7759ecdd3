//! Query result types and materialization.
//!
//! A [`ResultHandle`] behaves like a forward-only cursor: the result set it
//! wraps can be materialized into rows and columns exactly once.

use crate::error::{DuckboardError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::path::Path;

/// Metadata about a column in a table schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,

    /// Declared engine type (e.g. `BIGINT`, `DOUBLE`, `VARCHAR`).
    pub data_type: String,
}

impl ColumnInfo {
    /// Creates a new column info with the given name and type.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// On-demand statistics for a registered table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableStats {
    pub row_count: i64,
    pub column_count: usize,
    pub columns: Vec<ColumnInfo>,
}

/// A row of data from a query result.
pub type Row = Vec<Value>;

/// A single value from a query result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// NULL value.
    #[default]
    Null,

    /// Boolean value.
    Bool(bool),

    /// Signed integer (up to i64).
    Int(i64),

    /// Floating point number.
    Float(f64),

    /// Text/string value.
    String(String),

    /// Binary data.
    Bytes(Vec<u8>),
}

impl Value {
    /// Returns true if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Converts the value to its display string.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => s.clone(),
            Value::Bytes(b) => format!("<{} bytes>", b.len()),
        }
    }

    /// Converts an engine value into the display-oriented representation.
    ///
    /// Integer families collapse to `Int`, floats to `Float`. Engine types
    /// without a direct counterpart (decimals, temporal values, nested types)
    /// degrade to their string rendering.
    pub(crate) fn from_engine(value: duckdb::types::Value) -> Self {
        use duckdb::types::Value as Engine;
        match value {
            Engine::Null => Value::Null,
            Engine::Boolean(b) => Value::Bool(b),
            Engine::TinyInt(i) => Value::Int(i64::from(i)),
            Engine::SmallInt(i) => Value::Int(i64::from(i)),
            Engine::Int(i) => Value::Int(i64::from(i)),
            Engine::BigInt(i) => Value::Int(i),
            Engine::HugeInt(i) => match i64::try_from(i) {
                Ok(v) => Value::Int(v),
                Err(_) => Value::String(i.to_string()),
            },
            Engine::UTinyInt(i) => Value::Int(i64::from(i)),
            Engine::USmallInt(i) => Value::Int(i64::from(i)),
            Engine::UInt(i) => Value::Int(i64::from(i)),
            Engine::UBigInt(i) => match i64::try_from(i) {
                Ok(v) => Value::Int(v),
                Err(_) => Value::String(i.to_string()),
            },
            Engine::Float(f) => Value::Float(f64::from(f)),
            Engine::Double(f) => Value::Float(f),
            Engine::Decimal(d) => Value::String(d.to_string()),
            Engine::Text(s) => Value::String(s),
            Engine::Enum(s) => Value::String(s),
            Engine::Blob(b) => Value::Bytes(b),
            Engine::Date32(days) => Value::String(format_date(i64::from(days))),
            Engine::Time64(unit, t) => {
                Value::String(format_time(unit_to_micros(unit, t)))
            }
            Engine::Timestamp(unit, t) => {
                Value::String(format_timestamp(unit_to_micros(unit, t)))
            }
            Engine::Interval {
                months,
                days,
                nanos,
            } => Value::String(format_interval(months, days, nanos)),
            other => Value::String(format!("{other:?}")),
        }
    }

    /// Serializes the value for CSV output. NULL becomes an empty field.
    fn to_csv_field(&self) -> String {
        match self {
            Value::Null => String::new(),
            other => csv_escape(&other.to_display_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

const MICROS_PER_DAY: i64 = 86_400_000_000;

fn unit_to_micros(unit: duckdb::types::TimeUnit, value: i64) -> i64 {
    use duckdb::types::TimeUnit;
    match unit {
        TimeUnit::Second => value.saturating_mul(1_000_000),
        TimeUnit::Millisecond => value.saturating_mul(1_000),
        TimeUnit::Microsecond => value,
        TimeUnit::Nanosecond => value / 1_000,
    }
}

/// Days since the Unix epoch to a proleptic Gregorian `(year, month, day)`.
fn civil_from_days(z: i64) -> (i64, u32, u32) {
    let z = z + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = (z - era * 146_097) as u64;
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let m = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
    (if m <= 2 { y + 1 } else { y }, m, d)
}

/// Days since the epoch as `YYYY-MM-DD`.
fn format_date(days: i64) -> String {
    let (y, m, d) = civil_from_days(days);
    format!("{y:04}-{m:02}-{d:02}")
}

/// Microseconds as a clock reading. Hours are not wrapped, so interval
/// magnitudes beyond one day stay exact.
fn format_micros_clock(micros: i64) -> String {
    let sign = if micros < 0 { "-" } else { "" };
    let micros = micros.abs();
    let secs = micros / 1_000_000;
    let frac = micros % 1_000_000;
    let (h, m, s) = (secs / 3_600, (secs / 60) % 60, secs % 60);
    if frac == 0 {
        format!("{sign}{h:02}:{m:02}:{s:02}")
    } else {
        format!("{sign}{h:02}:{m:02}:{s:02}.{frac:06}")
    }
}

/// Microseconds since midnight as `HH:MM:SS[.ffffff]`.
fn format_time(micros: i64) -> String {
    format_micros_clock(micros.rem_euclid(MICROS_PER_DAY))
}

/// Microseconds since the epoch as `YYYY-MM-DD HH:MM:SS[.ffffff]`.
fn format_timestamp(micros: i64) -> String {
    let days = micros.div_euclid(MICROS_PER_DAY);
    let tod = micros.rem_euclid(MICROS_PER_DAY);
    format!("{} {}", format_date(days), format_time(tod))
}

fn format_interval(months: i32, days: i32, nanos: i64) -> String {
    fn plural(n: i32) -> &'static str {
        if n.abs() == 1 {
            ""
        } else {
            "s"
        }
    }

    let mut parts = Vec::new();
    let years = months / 12;
    let months = months % 12;
    if years != 0 {
        parts.push(format!("{years} year{}", plural(years)));
    }
    if months != 0 {
        parts.push(format!("{months} month{}", plural(months)));
    }
    if days != 0 {
        parts.push(format!("{days} day{}", plural(days)));
    }
    if nanos != 0 || parts.is_empty() {
        parts.push(format_micros_clock(nanos / 1_000));
    }
    parts.join(" ")
}

/// Quotes a CSV field when it contains a delimiter, quote, or line break.
fn csv_escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// A fully-executed result set that can be materialized exactly once.
#[derive(Debug)]
pub struct ResultHandle {
    inner: Option<(Vec<String>, Vec<Row>)>,
}

impl ResultHandle {
    pub(crate) fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self {
            inner: Some((columns, rows)),
        }
    }

    /// Pulls the result set into an in-memory row/column representation.
    ///
    /// Consumes the handle's contents; a second call fails with
    /// [`DuckboardError::AlreadyConsumed`]. Re-reading requires re-executing
    /// the query.
    pub fn materialize(&mut self) -> Result<QueryOutput> {
        let (columns, rows) = self.inner.take().ok_or(DuckboardError::AlreadyConsumed)?;
        Ok(QueryOutput { columns, rows })
    }

    /// Returns true once the handle has been materialized.
    pub fn is_consumed(&self) -> bool {
        self.inner.is_none()
    }
}

/// Materialized query result: ordered column names plus all data rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryOutput {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl QueryOutput {
    /// Returns the number of data rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the result set has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Renders the result as CSV: a header row followed by all data rows.
    ///
    /// The full result set is written; callers needing bounded output cap
    /// rows at the query layer with `LIMIT`.
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        let header: Vec<String> = self.columns.iter().map(|c| csv_escape(c)).collect();
        out.push_str(&header.join(","));
        out.push('\n');
        for row in &self.rows {
            let fields: Vec<String> = row.iter().map(Value::to_csv_field).collect();
            out.push_str(&fields.join(","));
            out.push('\n');
        }
        out
    }

    /// Writes the CSV rendering to a file.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut file = std::fs::File::create(path).map_err(|e| {
            DuckboardError::ingestion(format!("Failed to create {}: {e}", path.display()))
        })?;
        file.write_all(self.to_csv().as_bytes()).map_err(|e| {
            DuckboardError::ingestion(format!("Failed to write {}: {e}", path.display()))
        })?;
        Ok(())
    }
}
