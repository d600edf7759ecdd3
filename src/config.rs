//! Configuration management for Duckboard.
//!
//! Loads configuration from a TOML file, falling back to defaults when the
//! file is absent. Command-line flags take precedence over everything here.

use crate::catalog::ExportFormat;
use crate::error::{DuckboardError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_max_display_rows() -> usize {
    100
}

/// Main configuration structure for Duckboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the state database. Defaults to the platform config directory.
    pub state_db: Option<PathBuf>,

    /// Maximum rows printed to the terminal for a query result.
    #[serde(default = "default_max_display_rows")]
    pub max_display_rows: usize,

    /// Export format used when `--format` is not given.
    #[serde(default)]
    pub default_export_format: ExportFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            state_db: None,
            max_display_rows: default_max_display_rows(),
            default_export_format: ExportFormat::default(),
        }
    }
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("duckboard")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file.
    ///
    /// A missing file is not an error; defaults apply.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| DuckboardError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            DuckboardError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }
}
