//! Source and export format handling.
//!
//! File suffixes map onto a closed set of ingestion formats; anything outside
//! the set is rejected up front instead of being handed to the engine.

use crate::error::{DuckboardError, Result};
use serde::{Deserialize, Serialize};
use url::Url;

/// Supported ingestion formats, inferred from the source suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    CsvGz,
    Parquet,
    Arrow,
}

impl SourceFormat {
    /// Infers the format for a file path or URL.
    ///
    /// HTTP(S) sources without a recognizable suffix default to CSV, matching
    /// the remote-CSV loading behavior. Local paths with an unknown suffix are
    /// an error.
    pub fn detect(source: &str) -> Result<Self> {
        let (name, is_http) = source_file_name(source);

        if let Some(format) = Self::from_file_name(&name) {
            return Ok(format);
        }

        if is_http {
            return Ok(Self::Csv);
        }

        Err(DuckboardError::unsupported_format(source))
    }

    /// Matches a bare file name against the known suffix set.
    fn from_file_name(name: &str) -> Option<Self> {
        let name = name.to_lowercase();
        if name.ends_with(".csv.gz") {
            Some(Self::CsvGz)
        } else if name.ends_with(".csv") {
            Some(Self::Csv)
        } else if name.ends_with(".parquet") {
            Some(Self::Parquet)
        } else if name.ends_with(".arrow") {
            Some(Self::Arrow)
        } else {
            None
        }
    }

    /// Returns the table function call that reads this source.
    pub fn reader_expr(&self, source: &str) -> String {
        let literal = escape_literal(source);
        match self {
            Self::Csv | Self::CsvGz => format!("read_csv_auto('{literal}')"),
            Self::Parquet => format!("read_parquet('{literal}')"),
            Self::Arrow => format!("read_arrow('{literal}')"),
        }
    }

    /// Returns the format label stored in data-source records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::CsvGz => "csv.gz",
            Self::Parquet => "parquet",
            Self::Arrow => "arrow",
        }
    }
}

/// Supported export output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Parquet,
    Arrow,
}

impl ExportFormat {
    /// Returns the format name for display and config round-trips.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Parquet => "parquet",
            Self::Arrow => "arrow",
        }
    }

    /// Returns the COPY option clause for this format.
    pub fn copy_options(&self) -> &'static str {
        match self {
            Self::Csv => "FORMAT CSV, HEADER",
            Self::Parquet => "FORMAT PARQUET",
            Self::Arrow => "FORMAT ARROW",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = DuckboardError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "parquet" => Ok(Self::Parquet),
            "arrow" => Ok(Self::Arrow),
            other => Err(DuckboardError::unsupported_format(other)),
        }
    }
}

/// Derives a default table name from the source's file stem.
///
/// Strips `.gz` then the data extension, and normalizes every remaining
/// non-alphanumeric character to an underscore.
pub fn default_table_name(source: &str) -> String {
    let (name, is_http) = source_file_name(source);

    let mut stem = name.as_str();
    if let Some(s) = stem.strip_suffix(".gz") {
        stem = s;
    }
    for ext in [".csv", ".parquet", ".arrow"] {
        if let Some(s) = stem.strip_suffix(ext) {
            stem = s;
            break;
        }
    }

    let sanitized: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();

    if sanitized.chars().all(|c| c == '_') {
        if is_http {
            "url_data".to_string()
        } else {
            "data".to_string()
        }
    } else {
        sanitized
    }
}

/// Extracts the last path segment of a file path or URL, and whether the
/// source is an HTTP(S) URL.
fn source_file_name(source: &str) -> (String, bool) {
    if let Ok(url) = Url::parse(source) {
        if url.scheme() == "http" || url.scheme() == "https" {
            let name = url
                .path_segments()
                .and_then(|segments| segments.last().map(String::from))
                .unwrap_or_default();
            return (name, true);
        }
    }

    let name = source
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(source)
        .to_string();
    (name, false)
}

/// Escapes a string for embedding in a single-quoted SQL literal.
pub(crate) fn escape_literal(s: &str) -> String {
    s.replace('\'', "''")
}

/// Quotes an identifier for safe use in generated SQL.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
