//! Command-line argument parsing for Duckboard.

use clap::Parser;
use std::path::PathBuf;

/// Load tabular files into an analytical catalog and query them with SQL.
#[derive(Parser, Debug)]
#[command(name = "duckboard")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Data files or URLs to load (CSV, CSV.GZ, Parquet, Arrow)
    #[arg(value_name = "SOURCE")]
    pub sources: Vec<String>,

    /// SQL query to run after loading
    #[arg(short = 'q', long, value_name = "SQL")]
    pub query: Option<String>,

    /// Write the query result to a file instead of printing it
    #[arg(long, value_name = "PATH", requires = "query")]
    pub export: Option<PathBuf>,

    /// Export format: csv, parquet, or arrow
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// Print each loaded table's schema and row count
    #[arg(long)]
    pub describe: bool,

    /// State database path (overrides the config file)
    #[arg(long, value_name = "PATH")]
    pub state_db: Option<PathBuf>,

    /// Config file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Maximum rows to print for a query result
    #[arg(long, value_name = "N")]
    pub max_rows: Option<usize>,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(crate::config::Config::default_path)
    }
}
