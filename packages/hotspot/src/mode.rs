//! Mode selection over a [`Histogram`].

use accident_map_hotspot_models::Histogram;

use crate::HotspotError;

/// Returns the category with the highest count.
///
/// Ties go to the category that was seen first, so the result is stable
/// for a given histogram.
///
/// # Errors
///
/// * If the histogram is empty. Aggregates always hold at least one
///   record, so this indicates a broken invariant upstream.
pub fn select_mode(histogram: &Histogram) -> Result<&str, HotspotError> {
    let mut best: Option<(&str, u64)> = None;

    for (category, count) in histogram.iter() {
        if best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((category, count));
        }
    }

    best.map(|(category, _)| category)
        .ok_or_else(|| HotspotError::InvalidState {
            message: "cannot select the mode of an empty histogram".to_string(),
        })
}
