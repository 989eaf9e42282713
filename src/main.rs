//! Command-line front end for the canvassing log.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::Path;
use std::sync::Arc;

use doorknock::config::AppConfig;
use doorknock::directory::{ParseMode, ParseOptions, PropertyDirectory};
use doorknock::export::{Exporter, LogShareSheet, TransitionGate};
use doorknock::ledger::ActivityLedger;
use doorknock::logging::init_logging;
use doorknock::models::{ActivityAction, PropertyRecord};
use doorknock::storage::{KeyValueStore, SledStore};
use tracing::{info, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every property in the dataset
    Properties,
    /// Look up the property record for an address
    Search {
        /// Street address, as returned by the geocoder
        #[arg(short, long)]
        address: String,
    },
    /// Log a door knock
    Log {
        /// What happened: flyer, conversation or dnc
        #[arg(short, long)]
        action: ActivityAction,

        /// Street address of the visit
        #[arg(short, long)]
        location: String,
    },
    /// Show today's counts
    Stats,
    /// Write the activity log to a CSV file
    Export {
        /// Output directory (defaults to the configured one)
        #[arg(short, long)]
        output_dir: Option<String>,
    },
    /// Delete every logged activity
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;

    // Initialize logging
    let _log_guard = init_logging(&config.logging)?;

    info!("Starting doorknock");

    // Parse command line arguments
    let cli = Cli::parse();

    let store: Arc<dyn KeyValueStore> = Arc::new(
        SledStore::open(&config.get_storage_path()).context("Failed to open local store")?,
    );

    match cli.command {
        Commands::Properties => list_properties(&load_directory(&config)?),
        Commands::Search { address } => search_property(&load_directory(&config)?, &address),
        Commands::Log { action, location } => {
            let mut ledger = ActivityLedger::new(store);
            let record = ledger.log_activity(&location, action);
            info!("Logged {} at {} ({})", record.action, record.location_label, record.record_id);
        }
        Commands::Stats => {
            let ledger = ActivityLedger::new(store);
            let stats = ledger.daily_counts();
            info!(
                "Today: {} total, {} flyers, {} conversations, {} do-not-contact",
                stats.total, stats.flyers, stats.conversations, stats.do_not_contact
            );
        }
        Commands::Export { output_dir } => export_log(&config, store, output_dir).await?,
        Commands::Clear => ActivityLedger::new(store).clear_all(),
    }

    Ok(())
}

/// Load the property dataset named in the configuration
fn load_directory(config: &AppConfig) -> Result<PropertyDirectory> {
    let options = ParseOptions {
        mode: config.directory.parser.parse::<ParseMode>()?,
        numeric_default: config.directory.numeric_default,
    };
    Ok(PropertyDirectory::load(Path::new(&config.directory.dataset_path), options))
}

fn list_properties(directory: &PropertyDirectory) {
    for record in directory.records() {
        describe(record);
    }
}

fn search_property(directory: &PropertyDirectory, address: &str) {
    match directory.find_property(address) {
        Some(record) => describe(record),
        None => warn!("No property found for: {}", address),
    }
}

fn describe(record: &PropertyRecord) {
    info!(
        "{} | owner {} | {} bd / {} ba | built {} | {} sqft | lot {} | owned {} yrs | sold {} for ${}",
        record.address,
        record.owner_name,
        record.bedrooms,
        record.bathrooms,
        record.year_built,
        record.square_feet,
        record.lot_size,
        record.years_owned,
        record.sale_date,
        record.sale_price
    );
}

/// Export the activity log to a timestamped CSV file
async fn export_log(config: &AppConfig, store: Arc<dyn KeyValueStore>, output_dir: Option<String>) -> Result<()> {
    let ledger = ActivityLedger::new(store);

    let mut export_config = config.export.clone();
    if let Some(dir) = output_dir {
        export_config.output_directory = dir;
    }

    let exporter = Exporter::new(&export_config, Box::new(LogShareSheet));
    let csv = ledger.to_csv()?;
    let path = exporter.export_and_share(&csv, TransitionGate::Immediate).await?;
    info!("Exported {} records to {}", ledger.len(), path.display());
    Ok(())
}
