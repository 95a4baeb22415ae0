//! simstore command line
//!
//! Creates result databases, runs simulations of JSON datasets through the
//! job queue, and reads stored bundle pairs back.
//!
//! ## Usage
//!
//! ```bash
//! # Create the database named in the config (or simstore.db)
//! simstore init-db
//!
//! # Simulate a dataset and print the stored results
//! simstore submit runs/dispatch.json --wait
//!
//! # Inspect stored pairs
//! simstore list
//! simstore show 3 --input
//! simstore delete 3
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use simstore_core::BundlePairId;
use simstore_engine::{
    check_job, to_transport, Config, EngineError, JobQueue, JobStatus, JsonDatasetSimulator,
    ResultStore,
};

#[derive(Parser, Debug)]
#[command(name = "simstore")]
#[command(about = "Persist and restore simulation input and result bundles")]
struct Args {
    /// Path to config file
    #[arg(short, long, env = "SIMSTORE_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database file, overriding the config
    #[arg(long, env = "SIMSTORE_DATABASE")]
    database: Option<PathBuf>,

    /// Read any non-empty stored bool as true (databases from older deployments)
    #[arg(long)]
    legacy_bools: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the database and its tables
    InitDb,

    /// Simulate a dataset and store its input and result bundles
    Submit {
        /// JSON dataset file
        dataset: PathBuf,

        /// Print the stored results instead of just the pair id
        #[arg(long)]
        wait: bool,

        /// Worker threads, overriding the config
        #[arg(long)]
        workers: Option<usize>,

        /// Seconds to wait for the job
        #[arg(long, default_value = "3600")]
        timeout: u64,
    },

    /// Print a stored pair's results (or inputs) as JSON
    Show {
        id: i64,

        /// Show the input bundle instead of the result bundle
        #[arg(long)]
        input: bool,
    },

    /// Delete a stored pair and both of its bundles
    Delete { id: i64 },

    /// List stored pairs
    List,
}

#[derive(Serialize)]
struct PairSummary {
    pair_id: BundlePairId,
    input_id: i64,
    result_id: i64,
    created_at_ms: i64,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "simstore=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "command failed");
            ExitCode::FAILURE
        }
    }
}

fn load_config(args: &Args) -> Result<Config, EngineError> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(database) = &args.database {
        config.store.database_path = database.clone();
    }
    if args.legacy_bools {
        config.store.legacy_bool_decoding = true;
    }
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), EngineError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run(args: Args) -> Result<ExitCode, EngineError> {
    let mut config = load_config(&args)?;

    match args.command {
        Command::InitDb => {
            let store = ResultStore::open(config.store.clone())?;
            info!(
                database = %config.store.database_path.display(),
                schema_version = store.storage().schema_version()?,
                "database ready"
            );
        }

        Command::Submit {
            dataset,
            wait,
            workers,
            timeout,
        } => {
            if let Some(workers) = workers {
                config.queue.workers = workers;
            }
            let queue = JobQueue::start(&config, Arc::new(JsonDatasetSimulator))?;
            let job = queue.submit(&dataset)?;
            info!(job = %job, dataset = %dataset.display(), "submitted");

            let status = queue.wait(job, Duration::from_secs(timeout))?;
            match status {
                JobStatus::Finished if wait => {
                    let store = ResultStore::open(config.store.clone())?;
                    print_json(&check_job(&queue, &store, job)?)?;
                }
                JobStatus::Finished => {
                    if let Some(pair_id) = queue.result(job)? {
                        println!("{pair_id}");
                    }
                }
                JobStatus::Failed => {
                    let reason = queue.failure(job)?.unwrap_or_default();
                    error!(job = %job, %reason, "job failed");
                    return Ok(ExitCode::FAILURE);
                }
                JobStatus::Pending | JobStatus::Running => {
                    error!(job = %job, %status, timeout_secs = timeout, "job did not finish in time");
                    queue.detach();
                    return Ok(ExitCode::FAILURE);
                }
            }
            queue.shutdown();
        }

        Command::Show { id, input } => {
            let store = ResultStore::open(config.store)?;
            let (input_mapping, result_mapping) = store.restore(BundlePairId::new(id))?;
            let mapping = if input { &input_mapping } else { &result_mapping };
            print_json(&to_transport(mapping)?)?;
        }

        Command::Delete { id } => {
            let mut store = ResultStore::open(config.store)?;
            store.delete(BundlePairId::new(id))?;
        }

        Command::List => {
            let store = ResultStore::open(config.store)?;
            let pairs: Vec<PairSummary> = store
                .list()?
                .into_iter()
                .map(|pair| PairSummary {
                    pair_id: pair.pair_id,
                    input_id: pair.input_id.get(),
                    result_id: pair.result_id.get(),
                    created_at_ms: pair.created_at_ms,
                })
                .collect();
            print_json(&pairs)?;
        }
    }

    Ok(ExitCode::SUCCESS)
}
