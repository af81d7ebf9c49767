#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line interface for the accident hotspot toolchain.
//!
//! Subcommands compute hotspots, generate advisories, list datasets, or
//! start the API server. Run without a subcommand to pick a tool from an
//! interactive menu.

mod output;
mod pipeline;

use std::time::Duration;

use accident_map_ai::annotate::{DEFAULT_LANGUAGE, DEFAULT_SEVERE_THRESHOLD};
use accident_map_hotspot::DEFAULT_OCCURRENCE_THRESHOLD;
use accident_map_source::registry::DEFAULT_DATASET;
use clap::{Args, Parser, Subcommand};
use dialoguer::Select;

use crate::pipeline::{AdviseConfig, RunConfig};

#[derive(Parser)]
#[command(name = "accident_map_cli", about = "Traffic accident hotspot toolchain")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct RunArgs {
    /// Dataset identifier (see `datasets`)
    #[arg(long, default_value = DEFAULT_DATASET)]
    dataset: String,
    /// A location needs strictly more accidents than this
    #[arg(long, default_value_t = DEFAULT_OCCURRENCE_THRESHOLD)]
    threshold: u64,
    /// Show at most this many hotspots
    #[arg(long)]
    limit: Option<usize>,
    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
    /// Give up after this many seconds (defaults to `REQUEST_TIMEOUT_SECS`)
    #[arg(long)]
    timeout_secs: Option<u64>,
}

impl From<RunArgs> for RunConfig {
    fn from(args: RunArgs) -> Self {
        Self {
            dataset: args.dataset,
            threshold: args.threshold,
            limit: args.limit,
            json: args.json,
            timeout: args.timeout_secs.map_or_else(
                accident_map_server::request_timeout_from_env,
                Duration::from_secs,
            ),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Rank locations by accident count
    Hotspots {
        #[command(flatten)]
        run: RunArgs,
    },
    /// Rank locations and generate safety advisories for the severe ones
    Advise {
        #[command(flatten)]
        run: RunArgs,
        /// Only hotspots with more accidents than this get an advisory
        #[arg(long, default_value_t = DEFAULT_SEVERE_THRESHOLD)]
        severe_threshold: u64,
        /// Language for the advisories
        #[arg(long, default_value = DEFAULT_LANGUAGE)]
        language: String,
        /// Maximum advisory requests in flight
        #[arg(long, default_value_t = 1)]
        concurrency: usize,
    },
    /// List the configured datasets
    Datasets,
    /// Start the API server (configured from the environment)
    Serve,
}

/// Top-level tool selection for the interactive menu.
enum Tool {
    Hotspots,
    Advise,
    Datasets,
    Server,
}

impl Tool {
    const ALL: &[Self] = &[Self::Hotspots, Self::Advise, Self::Datasets, Self::Server];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Hotspots => "Show accident hotspots",
            Self::Advise => "Generate safety advisories",
            Self::Datasets => "List datasets",
            Self::Server => "Start server",
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Hotspots { run }) => pipeline::hotspots(&run.into()).await?,
        Some(Commands::Advise {
            run,
            severe_threshold,
            language,
            concurrency,
        }) => {
            let config = AdviseConfig {
                run: run.into(),
                severe_threshold,
                language,
                concurrency,
            };
            pipeline::advise(&config).await?;
        }
        Some(Commands::Datasets) => pipeline::datasets(),
        Some(Commands::Serve) => serve().await?,
        None => menu().await?,
    }

    Ok(())
}

async fn menu() -> Result<(), Box<dyn std::error::Error>> {
    println!("Accident Hotspot Toolchain");
    println!();

    let labels: Vec<&str> = Tool::ALL.iter().map(Tool::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Tool::ALL[idx] {
        Tool::Hotspots => pipeline::interactive_hotspots().await?,
        Tool::Advise => pipeline::interactive_advise().await?,
        Tool::Datasets => pipeline::datasets(),
        Tool::Server => {
            // The server uses actix-web's runtime, so we need to run it
            // in a blocking task to avoid nesting tokio runtimes.
            tokio::task::spawn_blocking(|| {
                actix_web::rt::System::new().block_on(accident_map_server::interactive::run())
            })
            .await??;
        }
    }

    Ok(())
}

async fn serve() -> Result<(), Box<dyn std::error::Error>> {
    let config = accident_map_server::ServerConfig::from_env();
    tokio::task::spawn_blocking(move || {
        actix_web::rt::System::new().block_on(accident_map_server::run_server(config))
    })
    .await??;
    Ok(())
}
