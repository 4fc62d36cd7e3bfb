//! reviewkit CLI.
//!
//! Thin wrappers over the library: manage daily work records against the
//! remote store, preview spreadsheet imports, and generate/export the
//! self-assessment report offline.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};

use reviewkit::config::{load_config, Config};
use reviewkit::export::export_report;
use reviewkit::generate::{generate_report, RemoteGenerator, TemplateGenerator};
use reviewkit::importer;
use reviewkit::records::{self, DailyRecordStore, RecordsClient};
use reviewkit::state::{Action, AppState, Store};

#[derive(Parser)]
#[command(name = "reviewkit")]
#[command(about = "Collect work evidence and draft your self-assessment report", long_about = None)]
struct Cli {
    /// Records owner (defaults to userName from ~/.reviewkit/config.json)
    #[arg(long, global = true)]
    name: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage daily work records
    Record {
        #[command(subcommand)]
        command: RecordCommands,
    },
    /// Parse a spreadsheet or CSV file and show what an upload would import
    Import {
        #[arg(long)]
        file: PathBuf,
    },
    /// Generate the self-assessment report and export it as markdown
    Generate {
        /// Include a spreadsheet or CSV file as evidence
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long, default_value = "reports")]
        out: PathBuf,
        /// POST the normalized input to a remote report service instead of
        /// rendering the built-in template
        #[arg(long)]
        remote: Option<String>,
    },
}

#[derive(Subcommand)]
enum RecordCommands {
    /// Add or overwrite the entry for a date
    Add {
        /// YYYY-MM-DD; defaults to today
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        content: String,
    },
    /// Remove the entry for a date
    Remove {
        #[arg(long)]
        date: String,
    },
    /// List all records, newest first
    List,
    /// Delete every record in a month
    Clear {
        /// YYYY-MM
        #[arg(long)]
        month: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = load_config().context("failed to load configuration")?;

    match cli.command {
        Commands::Record { command } => {
            let mut store = open_store(&config, cli.name)?;
            match command {
                RecordCommands::Add { date, content } => {
                    let date = date
                        .unwrap_or_else(|| chrono::Local::now().format("%Y-%m-%d").to_string());
                    // Sync first so empty content clears a remote entry even
                    // from a cold cache.
                    store.refresh().await.context("failed to fetch records")?;
                    store.add(&date, &content).await?;
                    println!("Recorded {date}.");
                }
                RecordCommands::Remove { date } => {
                    store.refresh().await.context("failed to fetch records")?;
                    store.remove(&date).await?;
                    println!("Removed entry for {date}.");
                }
                RecordCommands::List => {
                    store.refresh().await.context("failed to fetch records")?;
                    let mut entries = store.list();
                    if entries.is_empty() {
                        println!("No daily records for {}.", store.owner());
                        return Ok(());
                    }
                    entries.sort_by(|a, b| b.date.cmp(&a.date));
                    for entry in entries {
                        println!("- {}: {}", entry.date, entry.content);
                    }
                }
                RecordCommands::Clear { month } => {
                    store.clear_range(&month).await?;
                    println!("Cleared all records in {month}.");
                }
            }
        }
        Commands::Import { file } => {
            let result = importer::parse_file(&file)?;
            println!("Parsed {} ({})", result.file_name, result.file_type);
            println!("Sheets:");
            for sheet in &result.sheets {
                println!(
                    "- {} ({} rows x {} columns)",
                    sheet.name, sheet.row_count, sheet.column_count
                );
            }
            println!("Headers: {}", result.headers.join(", "));
            println!(
                "{} data rows in the first sheet across {} sheets.",
                result.summary.total_rows, result.summary.total_sheets
            );
        }
        Commands::Generate { file, out, remote } => {
            let mut records_store = open_store(&config, cli.name)?;
            records_store
                .refresh()
                .await
                .context("failed to fetch daily records")?;

            let mut store = Store::new(AppState::from_config(&config));
            store.dispatch(Action::SetDailyRecords(records_store.as_map()));

            if let Some(path) = file {
                let result = importer::parse_file(&path)?;
                store.dispatch(Action::SetFile(Some(result.file_name.clone())));
                store.dispatch(Action::SetFileUploaded(true));
                store.dispatch(Action::SetFileData(Some(result)));
                store.dispatch(Action::SetFileParsed(true));
            }

            let report = match remote {
                Some(endpoint) => {
                    generate_report(&mut store, &RemoteGenerator::new(endpoint)).await?
                }
                None => {
                    let generator = match config.simulate_latency_ms {
                        0 => TemplateGenerator::new(),
                        ms => TemplateGenerator::with_latency(Duration::from_millis(ms)),
                    };
                    generate_report(&mut store, &generator).await?
                }
            };

            let path = export_report(&report, &out)?;
            println!("Report written to {}.", path.display());
        }
    }

    Ok(())
}

/// Build the record store for the resolved owner, warm-started from the
/// local cache when one is available.
fn open_store(config: &Config, name: Option<String>) -> anyhow::Result<DailyRecordStore> {
    let owner = name
        .or_else(|| (!config.user_name.is_empty()).then(|| config.user_name.clone()))
        .context("no records owner: set userName in ~/.reviewkit/config.json or pass --name")?;

    let api = Box::new(RecordsClient::new(&config.records_api_base));
    let store = match records::default_cache_path() {
        Ok(path) => DailyRecordStore::with_warm_cache(owner, api, path),
        Err(_) => DailyRecordStore::new(owner, api),
    };
    Ok(store)
}
