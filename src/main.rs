//! Duckboard - load tabular files into an analytical catalog and query them.

use duckboard::catalog::{CatalogStore, ExportFormat, QueryOutput};
use duckboard::cli::Cli;
use duckboard::config::Config;
use duckboard::error::Result;
use duckboard::logging;
use duckboard::session::{LogStatusReporter, Session};
use duckboard::state::StateStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    logging::init_stderr_logging();

    if let Err(e) = run().await {
        error!("{}: {}", e.category(), e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let config = Config::load_from_file(&config_path)?;

    // State path precedence: CLI flag, then config file, then platform default.
    let state_path: PathBuf = match cli.state_db.clone().or_else(|| config.state_db.clone()) {
        Some(path) => path,
        None => StateStore::default_path()?,
    };

    let state = StateStore::open(&state_path).await?;
    let catalog = CatalogStore::open_in_memory()?;
    let mut session = Session::new(catalog, state, Arc::new(LogStatusReporter)).await?;

    for source in &cli.sources {
        session.load(source, None).await?;
    }

    if cli.describe {
        describe_tables(&session)?;
    }

    if let Some(sql) = &cli.query {
        let run = session.query(sql).await?;

        match &cli.export {
            Some(path) => {
                let format = match &cli.format {
                    Some(name) => name.parse::<ExportFormat>()?,
                    None => config.default_export_format,
                };
                session.export(sql, path, format)?;
            }
            None => {
                let max_rows = cli.max_rows.unwrap_or(config.max_display_rows);
                print_table(&run.output, max_rows);
            }
        }
    }

    session.close().await
}

/// Prints each loaded table with its schema and row count.
fn describe_tables(session: &Session) -> Result<()> {
    for table in session.list_tables()? {
        let stats = session.table_stats(&table)?;
        println!(
            "{table} ({} rows, {} columns)",
            stats.row_count, stats.column_count
        );
        for column in &stats.columns {
            println!("  {} {}", column.name, column.data_type);
        }
    }
    Ok(())
}

/// Prints a query result as an aligned text table, truncated to `max_rows`.
fn print_table(output: &QueryOutput, max_rows: usize) {
    print!("{}", render_table(output, max_rows));
}

/// Renders a query result as an aligned text table.
///
/// Column widths are measured in characters, not bytes, so multi-byte
/// values line up.
fn render_table(output: &QueryOutput, max_rows: usize) -> String {
    let shown = output.rows.len().min(max_rows);

    let mut widths: Vec<usize> = output.columns.iter().map(|c| c.chars().count()).collect();
    let rendered: Vec<Vec<String>> = output.rows[..shown]
        .iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .map(|(i, value)| {
                    let text = value.to_display_string();
                    let chars = text.chars().count();
                    if chars > widths[i] {
                        widths[i] = chars;
                    }
                    text
                })
                .collect()
        })
        .collect();

    let mut out = String::new();
    let header: Vec<String> = output
        .columns
        .iter()
        .enumerate()
        .map(|(i, name)| format!("{name:<width$}", width = widths[i]))
        .collect();
    out.push_str(header.join("  ").trim_end());
    out.push('\n');
    out.push_str(
        &widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    out.push('\n');

    for row in &rendered {
        let cells: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, text)| format!("{text:<width$}", width = widths[i]))
            .collect();
        out.push_str(cells.join("  ").trim_end());
        out.push('\n');
    }

    let total = output.rows.len();
    if total > shown {
        out.push_str(&format!("({shown} of {total} rows shown)\n"));
    } else {
        out.push_str(&format!("({total} rows)\n"));
    }
    out
}
