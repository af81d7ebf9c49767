//! Hotspot selection and ordering.

use accident_map_accident_models::LocationKey;
use accident_map_hotspot_models::{HotspotSummary, LocationAggregate};

use crate::HotspotError;
use crate::aggregate::LocationMap;
use crate::mode::select_mode;

/// Default minimum accident count a location must strictly exceed.
pub const DEFAULT_OCCURRENCE_THRESHOLD: u64 = 10;

/// Builds summaries for every location whose count is strictly greater
/// than `threshold`.
///
/// Output is ordered by count descending, then by location key ascending,
/// so the result does not depend on how the map was built.
///
/// # Errors
///
/// * If a selected aggregate has an empty weather or time histogram.
pub fn rank_hotspots(
    locations: &LocationMap,
    threshold: u64,
) -> Result<Vec<HotspotSummary>, HotspotError> {
    let mut selected: Vec<(&LocationKey, &LocationAggregate)> = locations
        .iter()
        .filter(|(_, aggregate)| aggregate.count > threshold)
        .collect();

    selected.sort_by(|(a_key, a), (b_key, b)| b.count.cmp(&a.count).then_with(|| a_key.cmp(b_key)));

    log::debug!(
        "{} of {} locations exceed threshold {threshold}",
        selected.len(),
        locations.len()
    );

    selected
        .into_iter()
        .map(|(key, aggregate)| summarize(*key, aggregate))
        .collect()
}

/// Builds the summary for one location.
///
/// # Errors
///
/// * If the weather or time histogram is empty.
pub fn summarize(
    key: LocationKey,
    aggregate: &LocationAggregate,
) -> Result<HotspotSummary, HotspotError> {
    Ok(HotspotSummary {
        latitude: key.latitude(),
        longitude: key.longitude(),
        count: aggregate.count,
        severities: aggregate.severities.clone(),
        weather: select_mode(&aggregate.weather)?.to_string(),
        time: select_mode(&aggregate.times)?.to_string(),
        advisory: None,
    })
}
