//! roster-import - bulk user roster import
//!
//! Reads a CSV roster and, for every row, creates or refreshes the user's
//! identity and role profile, uploading the profile image when one is given.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use roster_common::config::{
    default_config_path, write_toml_config, RootFolderInitializer, RootFolderResolver,
};
use roster_common::events::EventBus;
use roster_import::config::{starter_toml_config, AssetMode, CliOverrides, ImportConfig};
use roster_import::logging::{init_tracing, load_startup_config};
use roster_import::models::BatchReport;
use roster_import::source::CsvSource;

/// Command-line arguments for roster-import
#[derive(Parser, Debug)]
#[command(name = "roster-import")]
#[command(about = "Import user rosters into the identity directory and profile store")]
#[command(version)]
struct Cli {
    /// Root folder holding roster.db and the local asset bucket
    #[arg(long, global = true)]
    root_folder: Option<PathBuf>,

    /// TOML config file (default: ~/.config/roster/roster.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import a CSV roster
    Run {
        /// CSV file with a header row
        csv: PathBuf,

        /// Field delimiter (single character, or "tab")
        #[arg(long)]
        delimiter: Option<String>,

        /// Storage bucket for profile images
        #[arg(long)]
        bucket: Option<String>,

        /// Where profile images are stored
        #[arg(long, value_enum)]
        asset_mode: Option<AssetMode>,

        /// Print the batch report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List recent import runs, or show one run in full
    History {
        #[arg(long, default_value = "10")]
        limit: u32,

        /// Show the report of this run, including failed records
        #[arg(long)]
        run: Option<Uuid>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a config file with every default filled in
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().or_else(default_config_path);
    let toml_config = load_startup_config(config_path.as_deref())?;

    init_tracing(&toml_config).context("Failed to set up logging")?;

    info!(
        "Starting roster-import v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let root_folder = RootFolderResolver::new("roster-import")
        .with_cli_arg(cli.root_folder.clone())
        .with_toml_config(&toml_config)
        .resolve();

    match cli.command {
        Command::InitConfig { force } => init_config(config_path, &root_folder, force),
        Command::Run {
            csv,
            delimiter,
            bucket,
            asset_mode,
            json,
        } => {
            let overrides = CliOverrides {
                delimiter,
                bucket,
                asset_mode,
            };
            let config = ImportConfig::resolve(&overrides, &toml_config, &root_folder)?;
            info!(
                asset_mode = config.asset_mode.as_str(),
                bucket = %config.bucket,
                "Import configuration resolved"
            );

            let records = CsvSource::open(&csv, config.delimiter)
                .and_then(CsvSource::read_all)
                .with_context(|| format!("Failed to read roster {}", csv.display()))?;

            let pool = open_database(root_folder).await?;
            let engine = roster_import::build_engine(&pool, &config, EventBus::new(100))
                .context("Failed to set up asset transfer")?;

            let cancel = CancellationToken::new();
            let ctrl_c_token = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupt received, stopping after the current record");
                    ctrl_c_token.cancel();
                }
            });

            let report = engine
                .run(&csv.display().to_string(), records, &cancel)
                .await;

            if let Err(e) = roster_import::db::runs::save_run(&pool, &report).await {
                warn!("Failed to save run history: {}", e);
            }
            pool.close().await;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_summary(&report);
            }
            Ok(())
        }
        Command::History { limit, run, json } => {
            let pool = open_database(root_folder).await?;
            let result = show_history(&pool, limit, run, json).await;
            pool.close().await;
            result
        }
    }
}

/// Create the root folder if needed and open `roster.db`
async fn open_database(root_folder: PathBuf) -> Result<SqlitePool> {
    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .context("Failed to initialize root folder")?;

    let db_path = initializer.database_path();
    info!("Database: {}", db_path.display());
    roster_common::db::init_database(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))
}

fn init_config(config_path: Option<PathBuf>, root_folder: &Path, force: bool) -> Result<()> {
    let Some(path) = config_path else {
        bail!("No config directory for this user; pass --config");
    };
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    write_toml_config(&starter_toml_config(root_folder), &path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}

async fn show_history(pool: &SqlitePool, limit: u32, run: Option<Uuid>, json: bool) -> Result<()> {
    if let Some(run_id) = run {
        let Some(report) = roster_import::db::runs::load_run(pool, run_id).await? else {
            bail!("No import run {}", run_id);
        };
        if json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print_summary(&report);
        }
        return Ok(());
    }

    let runs = roster_import::db::runs::list_runs(pool, limit).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&runs)?);
        return Ok(());
    }
    if runs.is_empty() {
        println!("No import runs recorded");
    }
    for run in &runs {
        println!(
            "{}  {}  {}  ok={} failed={} skipped={}{}",
            run.started_at.format("%Y-%m-%d %H:%M:%S"),
            run.run_id,
            run.source,
            run.succeeded,
            run.failed,
            run.not_attempted,
            if run.cancelled { "  (cancelled)" } else { "" }
        );
    }
    Ok(())
}

fn print_summary(report: &BatchReport) {
    println!("Import {} ({})", report.run_id, report.source);
    println!(
        "  submitted: {}  succeeded: {}  failed: {}  not attempted: {}",
        report.submitted, report.succeeded, report.failed, report.not_attempted
    );
    println!(
        "  created: {}  updated: {}  images attached: {}",
        report.created, report.updated, report.images_attached
    );
    if report.cancelled {
        println!("  run was cancelled before all records were processed");
    }
    if !report.failures.is_empty() {
        println!("Failed records:");
        for failure in &report.failures {
            println!(
                "  line {}  {}  [{}] {}",
                failure.line_number,
                failure.email.as_deref().unwrap_or("<no email>"),
                failure.kind,
                failure.message
            );
        }
    }
}
