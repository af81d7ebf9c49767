//! Fetch, aggregate, and annotate flows behind the CLI commands.

use std::time::{Duration, Instant};

use accident_map_ai::annotate::{AnnotateOptions, annotate_hotspots};
use accident_map_ai::create_provider_from_env;
use accident_map_hotspot::{HotspotOptions, HotspotReport, find_hotspots};
use accident_map_source::FetchOptions;
use accident_map_source::registry::{DEFAULT_DATASET, all_datasets, find_dataset};
use dialoguer::{Input, Select};

use crate::output;

/// Settings for a hotspot run.
pub struct RunConfig {
    pub dataset: String,
    pub threshold: u64,
    pub limit: Option<usize>,
    pub json: bool,
    /// Budget for the whole run, fetch and advisories included.
    pub timeout: Duration,
}

impl RunConfig {
    fn deadline(&self) -> tokio::time::Instant {
        tokio::time::Instant::now() + self.timeout
    }
}

/// Settings for an advisory run.
pub struct AdviseConfig {
    pub run: RunConfig,
    pub severe_threshold: u64,
    pub language: String,
    pub concurrency: usize,
}

async fn load(
    config: &RunConfig,
    fetch: &FetchOptions,
) -> Result<HotspotReport, Box<dyn std::error::Error>> {
    let dataset = find_dataset(&config.dataset)?;
    let client = reqwest::Client::new();

    log::info!("Fetching {} ({})...", dataset.name(), dataset.id());
    let start = Instant::now();
    let extracted = dataset.fetch(&client, fetch).await?;
    log::info!(
        "Fetched {} rows in {:.1}s ({} without coordinates)",
        extracted.fetched(),
        start.elapsed().as_secs_f64(),
        extracted.skipped
    );

    let options = HotspotOptions {
        threshold: config.threshold,
        limit: config.limit,
    };
    Ok(find_hotspots(&extracted.records, &options)?)
}

/// Prints the ranked hotspots.
///
/// # Errors
///
/// * If the dataset is unknown or the fetch fails
/// * If aggregation hits an invalid state
pub async fn hotspots(config: &RunConfig) -> Result<(), Box<dyn std::error::Error>> {
    let fetch = FetchOptions::from_env().with_deadline(config.deadline());
    let report = load(config, &fetch).await?;

    if config.json {
        println!("{}", serde_json::to_string_pretty(&report.hotspots)?);
    } else {
        output::print_hotspots(&report.hotspots);
        println!();
        println!(
            "{} hotspots above {} accidents across {} locations",
            report.hotspots.len(),
            config.threshold,
            report.locations
        );
    }

    Ok(())
}

/// Prints the ranked hotspots with advisories for the severe ones.
///
/// # Errors
///
/// * If no AI provider is configured
/// * If the dataset is unknown or the fetch fails
/// * If aggregation hits an invalid state
pub async fn advise(config: &AdviseConfig) -> Result<(), Box<dyn std::error::Error>> {
    let provider = create_provider_from_env()?;
    let deadline = config.run.deadline();
    let fetch = FetchOptions::from_env().with_deadline(deadline);
    let mut report = load(&config.run, &fetch).await?;

    let options = AnnotateOptions {
        severe_threshold: config.severe_threshold,
        language: config.language.clone(),
        concurrency: config.concurrency.max(1),
        deadline: Some(deadline),
        ..AnnotateOptions::default()
    };
    let annotation = annotate_hotspots(provider.as_ref(), &mut report.hotspots, &options).await;

    if config.run.json {
        println!("{}", serde_json::to_string_pretty(&report.hotspots)?);
    } else {
        output::print_hotspots(&report.hotspots);
        println!();
        println!(
            "{} of {} severe hotspots annotated ({} failed, {} skipped)",
            annotation.annotated, annotation.eligible, annotation.failed, annotation.skipped
        );
    }

    Ok(())
}

/// Prints the configured datasets.
pub fn datasets() {
    output::print_datasets(&all_datasets());
}

fn prompt_run_config() -> Result<RunConfig, Box<dyn std::error::Error>> {
    let datasets = all_datasets();
    let dataset = if datasets.len() > 1 {
        let labels: Vec<String> = datasets
            .iter()
            .map(|d| format!("{} ({})", d.name(), d.id()))
            .collect();
        let idx = Select::new()
            .with_prompt("Dataset")
            .items(&labels)
            .default(0)
            .interact()?;
        datasets[idx].id().to_string()
    } else {
        DEFAULT_DATASET.to_string()
    };

    let threshold: u64 = Input::new()
        .with_prompt("Minimum accidents (exclusive)")
        .default(accident_map_hotspot::DEFAULT_OCCURRENCE_THRESHOLD)
        .interact_text()?;

    let limit: usize = Input::new()
        .with_prompt("Maximum hotspots to show (0 = all)")
        .default(25)
        .interact_text()?;

    Ok(RunConfig {
        dataset,
        threshold,
        limit: (limit > 0).then_some(limit),
        json: false,
        timeout: accident_map_server::request_timeout_from_env(),
    })
}

/// Prompts for run settings, then runs [`hotspots`].
///
/// # Errors
///
/// * If a prompt fails
/// * If the run fails
pub async fn interactive_hotspots() -> Result<(), Box<dyn std::error::Error>> {
    let run = prompt_run_config()?;
    hotspots(&run).await
}

/// Prompts for run and advisory settings, then runs [`advise`].
///
/// # Errors
///
/// * If a prompt fails
/// * If the run fails
pub async fn interactive_advise() -> Result<(), Box<dyn std::error::Error>> {
    let run = prompt_run_config()?;

    let severe_threshold: u64 = Input::new()
        .with_prompt("Minimum accidents for an advisory (exclusive)")
        .default(accident_map_ai::annotate::DEFAULT_SEVERE_THRESHOLD)
        .interact_text()?;

    let language: String = Input::new()
        .with_prompt("Advisory language")
        .default(accident_map_ai::annotate::DEFAULT_LANGUAGE.to_string())
        .interact_text()?;

    let config = AdviseConfig {
        run,
        severe_threshold,
        language,
        concurrency: 1,
    };
    advise(&config).await
}
