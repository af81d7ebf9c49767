#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Accident hotspot engine.
//!
//! Normalizes raw accident records, folds them into per-location
//! aggregates, and ranks the locations whose accident count exceeds a
//! threshold. Everything here is synchronous and free of I/O; fetching
//! lives in `accident_map_source` and advisory generation in
//! `accident_map_ai`.
//!
//! [`find_hotspots`] runs the whole pass in one go.

pub mod aggregate;
pub mod mode;
pub mod normalize;
pub mod rank;

use accident_map_accident_models::RawAccidentRecord;
use accident_map_hotspot_models::HotspotSummary;
use thiserror::Error;

pub use aggregate::{LocationAggregator, LocationMap, aggregate_records};
pub use mode::select_mode;
pub use normalize::normalize_record;
pub use rank::{DEFAULT_OCCURRENCE_THRESHOLD, rank_hotspots};

/// Errors that can occur while building hotspots.
#[derive(Debug, Error)]
pub enum HotspotError {
    /// An internal invariant did not hold.
    #[error("Invalid state: {message}")]
    InvalidState {
        /// Description of what went wrong.
        message: String,
    },
}

/// Parameters for [`find_hotspots`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotspotOptions {
    /// A location must have strictly more accidents than this.
    pub threshold: u64,
    /// Keep at most this many hotspots after ranking.
    pub limit: Option<usize>,
}

impl Default for HotspotOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_OCCURRENCE_THRESHOLD,
            limit: None,
        }
    }
}

/// Result of a hotspot pass.
#[derive(Debug, Clone, PartialEq)]
pub struct HotspotReport {
    /// Ranked hotspots.
    pub hotspots: Vec<HotspotSummary>,
    /// Number of records aggregated.
    pub records: usize,
    /// Number of distinct rounded locations.
    pub locations: usize,
}

/// Normalizes, aggregates, and ranks `records` in a single pass.
///
/// # Errors
///
/// * If an aggregate violates its invariants while being summarized
pub fn find_hotspots<'a>(
    records: impl IntoIterator<Item = &'a RawAccidentRecord>,
    options: &HotspotOptions,
) -> Result<HotspotReport, HotspotError> {
    let mut aggregator = LocationAggregator::new();
    for raw in records {
        aggregator.push(&normalize_record(raw));
    }

    let records = aggregator.records();
    let locations = aggregator.locations();
    let map = aggregator.finish();

    let mut hotspots = rank_hotspots(&map, options.threshold)?;
    if let Some(limit) = options.limit {
        hotspots.truncate(limit);
    }

    log::info!(
        "Aggregated {records} records into {locations} locations, {} hotspots (threshold {})",
        hotspots.len(),
        options.threshold
    );

    Ok(HotspotReport {
        hotspots,
        records,
        locations,
    })
}
