//! A terminal front end for the Store/Ingestor/TransferBuilder/Planner
//! stack — exists so the crates underneath are runnable and testable from a
//! shell, in the same spirit as the teacher's own small demo binaries.

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};

use gtfs_ingest::{ArchiveSource, FeedConfig};
use gtfs_store::Store;
use journey_planner::{summary, Mode, Planner};

#[derive(Parser)]
#[clap(name = "transit-cli", version, about = "GTFS ingestion and journey search")]
struct Cli {
    /// Path to the store's SQLite file.
    #[clap(long, global = true, default_value = "transit.sqlite")]
    store: PathBuf,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Loads every feed named in the JSON config into a fresh store.
    Init { config: PathBuf },
    /// Reloads feeds only if the store is stale, or always with --force.
    Update {
        config: PathBuf,
        #[clap(long)]
        force: bool,
    },
    /// Runs a journey search and prints a summary.
    Search {
        from: String,
        to: String,
        /// Naive UTC departure time, "YYYY-MM-DD HH:MM:SS".
        departure: String,
        #[clap(long, default_value = "fastest")]
        mode: String,
    },
    /// Looks up stops by name prefix.
    SearchStop {
        prefix: String,
        #[clap(long, default_value_t = 10)]
        limit: usize,
    },
}

#[derive(thiserror::Error, Debug)]
enum AppError {
    #[error(transparent)]
    Store(#[from] gtfs_store::StoreError),
    #[error(transparent)]
    Ingest(#[from] gtfs_ingest::IngestError),
    #[error(transparent)]
    Planner(#[from] journey_planner::PlannerError),
    #[error("{0}")]
    Usage(String),
}

/// The config's `archive_url` field is treated as a local path: fetching a
/// remote URL is explicitly out of scope (§1) and left to a collaborator.
fn feed_sources(config_path: &PathBuf) -> Result<Vec<(FeedConfig, ArchiveSource)>, AppError> {
    let configs = gtfs_ingest::load_feed_config(config_path)?;
    Ok(configs
        .into_iter()
        .map(|config| {
            let source = ArchiveSource::Path(PathBuf::from(&config.archive_url));
            (config, source)
        })
        .collect())
}

fn run(cli: Cli) -> Result<(), AppError> {
    match cli.command {
        Command::Init { config } => {
            let store = Store::open(&cli.store)?;
            let feeds = feed_sources(&config)?;
            let feed_count = feeds.len();
            gtfs_ingest::load_and_prepare(&store, &feeds)?;
            println!("initialised {} from {} feeds", cli.store.display(), feed_count);
            Ok(())
        }
        Command::Update { config, force } => {
            let store = Store::open(&cli.store)?;
            let feeds = feed_sources(&config)?;
            let ran = gtfs_ingest::update(&store, &feeds, force)?;
            println!("{}", if ran { "reloaded" } else { "already up to date" });
            Ok(())
        }
        Command::Search { from, to, departure, mode } => {
            let store = Store::open(&cli.store)?;
            let planner = Planner::new(&store);
            let mode: Mode = mode
                .parse()
                .map_err(|_| AppError::Usage(format!("unknown mode: {}", mode)))?;
            let departure_utc = NaiveDateTime::parse_from_str(&departure, "%Y-%m-%d %H:%M:%S")
                .map_err(|err| AppError::Usage(format!("invalid departure time: {}", err)))?;
            let (result, elapsed) = planner.journey_search(&from, &to, departure_utc, mode, None)?;
            match result {
                Some(itinerary) => {
                    let steps = planner.get_journey_details(&itinerary.path, chrono_tz::UTC)?;
                    println!("{}", summary::summarize(&steps));
                }
                None => println!("no path found within budget ({:.1}s elapsed)", elapsed),
            }
            Ok(())
        }
        Command::SearchStop { prefix, limit } => {
            let store = Store::open(&cli.store)?;
            let planner = Planner::new(&store);
            for (stop_id, stop_name) in planner.search_stop_custom(&prefix, limit)? {
                println!("{}\t{}", stop_id, stop_name);
            }
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}
