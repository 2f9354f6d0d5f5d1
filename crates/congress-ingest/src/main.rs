//! Congress Ingest - Congress.gov fetch-and-hydrate tool

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use congress_common::logging::{init_logging, LogConfig, LogLevel};
use congress_common::{Chamber, CongressNumber};
use congress_ingest::credentials::load_api_key;
use congress_ingest::{
    CongressClient, IngestConfig, PassOutcome, Pipeline, Resource, SqliteDatabase, SyncMode,
    SyncReport,
};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "congress-ingest")]
#[command(author, version, about = "Fetch and hydrate Congress.gov committee data")]
struct Cli {
    /// Resource to sync
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// data.gov API key (falls back to DATA_GOV_API_KEY, then ~/.data.gov.key)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// SQLite database file
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Disable progress bars
    #[arg(long, global = true)]
    no_progress: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sync committee meetings for one congress and chamber
    Events {
        /// Congress number
        #[arg(long, default_value_t = CongressNumber::default())]
        congress: CongressNumber,

        /// house, senate or nochamber
        #[arg(long, default_value_t = Chamber::House)]
        chamber: Chamber,

        #[arg(long, value_enum, default_value_t = SyncMode::Auto)]
        mode: SyncMode,
    },

    /// Sync committees for one chamber
    Committees {
        /// house or senate
        #[arg(long, default_value_t = Chamber::House)]
        chamber: Chamber,

        #[arg(long, value_enum, default_value_t = SyncMode::Auto)]
        mode: SyncMode,
    },
}

impl Command {
    fn resource(&self) -> congress_ingest::Result<(Resource, SyncMode)> {
        match *self {
            Command::Events {
                congress,
                chamber,
                mode,
            } => Ok((Resource::committee_meetings(congress, chamber), mode)),
            Command::Committees { chamber, mode } => Ok((Resource::committees(chamber)?, mode)),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("congress-ingest")
        .filter_directives("sqlx=warn,hyper=warn,reqwest=warn")
        .build()
        .merge_env()?;

    init_logging(&log_config)?;

    let (resource, mode) = cli.command.resource()?;

    let mut config = IngestConfig::from_env()?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }

    let api_key = load_api_key(cli.api_key.as_deref())?;

    let db = SqliteDatabase::open(&config.db_path)
        .await
        .with_context(|| format!("Failed to open database {}", config.db_path.display()))?;
    info!(path = %config.db_path.display(), "Using database");

    let client = CongressClient::with_api_key(config, api_key)?;
    let pipeline = Pipeline::new(client).with_progress(!cli.no_progress);

    let report = pipeline.sync_database(&db, &resource, mode).await;
    db.close().await;

    summarize(&report?);
    Ok(())
}

fn summarize(report: &SyncReport) {
    let hydration = &report.hydration;

    if let Some(listed) = report.listed {
        info!(resource = %report.resource, listed, "Listing recorded");
    }
    if !hydration.deferred.is_empty() {
        let ids: Vec<&str> = hydration.deferred.iter().map(|id| id.as_str()).collect();
        warn!(
            count = ids.len(),
            ids = %ids.join(","),
            "Records deferred to the next run"
        );
    }

    match &hydration.outcome {
        PassOutcome::Drained => info!(
            resource = %report.resource,
            total = hydration.total,
            persisted = hydration.persisted,
            skipped = hydration.skipped,
            deferred = hydration.deferred.len(),
            "Done with all records"
        ),
        PassOutcome::Halted { identifier } => warn!(
            resource = %report.resource,
            identifier = %identifier,
            persisted = hydration.persisted,
            "Rate limit hit; rerun later to continue"
        ),
    }
}
