//! Sheetfolio CLI
//!
//! ```bash
//! # One load, dashboard JSON on stdout
//! sheetfolio load
//!
//! # Periodic summary tab, custom config
//! sheetfolio --config ~/sheetfolio.toml load --sheet Resumen_Activo
//!
//! # Refresh every `refresh_interval_secs` until Ctrl-C
//! sheetfolio watch
//!
//! # Last stored snapshot, no network
//! sheetfolio cached
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use sheetfolio_core::DashboardConfig;
use sheetfolio_persistence::{get_setting, set_setting, Database};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

mod loader;
mod logging;

use loader::{DashboardLoader, LoadOutcome};

const LAST_SHEET_KEY: &str = "last_sheet";

#[derive(Parser)]
#[command(name = "sheetfolio")]
#[command(about = "Crypto portfolio dashboard backed by a public Google Sheet", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML configuration file (defaults to <data-dir>/config.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory for the snapshot database
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Skip the network and serve stored data only
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch once and print the dashboard as JSON
    Load {
        /// Tab to read (defaults to the configured portfolio tab)
        #[arg(short, long)]
        sheet: Option<String>,
    },

    /// Reload on the configured interval until interrupted
    Watch {
        #[arg(short, long)]
        sheet: Option<String>,

        /// Override the refresh interval in seconds
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Print the last stored snapshot without fetching
    Cached {
        #[arg(short, long)]
        sheet: Option<String>,
    },
}

fn default_data_dir() -> PathBuf {
    dirs_next::data_local_dir()
        .map(|p| p.join("Sheetfolio"))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn load_config(explicit: Option<&Path>, data_dir: &Path) -> anyhow::Result<DashboardConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => data_dir.join("config.toml"),
    };
    if explicit.is_none() && !path.is_file() {
        let config = DashboardConfig::default();
        config.validate()?;
        return Ok(config);
    }

    // `load` validates
    let config = DashboardConfig::load(&path)
        .with_context(|| format!("reading config {}", path.display()))?;
    Ok(config)
}

fn print_outcome(outcome: &LoadOutcome) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&outcome.report())?;
    println!("{}", json);
    Ok(())
}

async fn resolve_sheet(
    requested: Option<String>,
    db: Option<&Database>,
    config: &DashboardConfig,
) -> String {
    if let Some(sheet) = requested {
        return sheet;
    }
    if let Some(db) = db {
        match get_setting(db.pool(), LAST_SHEET_KEY).await {
            Ok(Some(sheet)) => return sheet,
            Ok(None) => {}
            Err(e) => warn!("Could not read last sheet: {}", e),
        }
    }
    config.sheets.portfolio.clone()
}

/// Reload until `shutdown` resolves; a shutdown during a refresh cancels it
async fn watch<F>(loader: &DashboardLoader, interval_secs: u64, shutdown: F) -> anyhow::Result<()>
where
    F: Future,
{
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!("Watching {} every {}s", loader.sheet(), interval_secs);

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Interrupted, stopping");
                return Ok(());
            }
            _ = ticker.tick() => {
                tokio::select! {
                    outcome = loader.load_cycle() => {
                        info!("Status: {}", outcome.status());
                        print_outcome(&outcome)?;
                    }
                    _ = &mut shutdown => {
                        info!("Interrupted during refresh, stopping");
                        return Ok(());
                    }
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let data_dir = cli.data_dir.clone().unwrap_or_else(default_data_dir);
    let config = load_config(cli.config.as_deref(), &data_dir)?;
    logging::init_logging(&config.logging)?;

    let db_path = data_dir.join("sheetfolio.db");
    let db = match Database::connect(&db_path).await {
        Ok(db) => Some(db),
        Err(e) => {
            warn!("Snapshot store unavailable at {}: {}", db_path.display(), e);
            None
        }
    };

    match cli.command {
        Commands::Load { sheet } => {
            let sheet = resolve_sheet(sheet, db.as_ref(), &config).await;
            remember_sheet(db.as_ref(), &sheet).await;
            let loader = DashboardLoader::new(config, sheet, db, cli.offline)?;
            let outcome = loader.load_cycle().await;
            print_outcome(&outcome)?;
            if let LoadOutcome::Failed { reason } = &outcome {
                error!("{}", reason);
                std::process::exit(1);
            }
        }
        Commands::Watch { sheet, interval } => {
            let sheet = resolve_sheet(sheet, db.as_ref(), &config).await;
            remember_sheet(db.as_ref(), &sheet).await;
            let interval_secs = interval.unwrap_or(config.refresh_interval_secs);
            let loader = DashboardLoader::new(config, sheet, db, cli.offline)?;
            watch(&loader, interval_secs, tokio::signal::ctrl_c()).await?;
        }
        Commands::Cached { sheet } => {
            let sheet = resolve_sheet(sheet, db.as_ref(), &config).await;
            let loader = DashboardLoader::new(config, sheet, db, true)?;
            match loader.stored_snapshot().await? {
                Some(snapshot) => println!("{}", serde_json::to_string_pretty(&snapshot)?),
                None => {
                    warn!("No stored snapshot for {}", loader.sheet_key());
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

async fn remember_sheet(db: Option<&Database>, sheet: &str) {
    if let Some(db) = db {
        if let Err(e) = set_setting(db.pool(), LAST_SHEET_KEY, sheet).await {
            warn!("Could not store last sheet: {}", e);
        }
    }
}
