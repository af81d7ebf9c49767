#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Histogram, location aggregate, and hotspot summary types.
//!
//! These are the values produced by the aggregation engine in
//! `accident_map_hotspot` and handed to the advisory annotator and the
//! API layer.

use accident_map_accident_models::LocationKey;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Occurrence counts per category label.
///
/// Categories keep the order in which they were first seen. That order is
/// what makes mode selection deterministic when counts tie, and it is
/// preserved when the histogram is serialized as a JSON object.
///
/// Equality compares contents only, so two histograms built from the same
/// records in a different order are equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Histogram(IndexMap<String, u64>);

impl Histogram {
    /// Creates an empty histogram.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one occurrence of `category`.
    pub fn increment(&mut self, category: &str) {
        if let Some(count) = self.0.get_mut(category) {
            *count += 1;
        } else {
            self.0.insert(category.to_string(), 1);
        }
    }

    /// Number of distinct categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no category has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all counts.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    /// Iterates `(category, count)` pairs in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(category, count)| (category.as_str(), *count))
    }
}

impl<S: Into<String>> FromIterator<(S, u64)> for Histogram {
    fn from_iter<I: IntoIterator<Item = (S, u64)>>(iter: I) -> Self {
        let mut map: IndexMap<String, u64> = IndexMap::new();
        for (category, count) in iter {
            *map.entry(category.into()).or_insert(0) += count;
        }
        Self(map)
    }
}

/// Accumulated statistics for one rounded location.
///
/// Every record folded into the aggregate adds exactly one to `count` and
/// one to each histogram, so `count` always equals each histogram's total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationAggregate {
    /// Number of accidents at this location (at least 1).
    pub count: u64,
    /// Accidents per severity label.
    pub severities: Histogram,
    /// Accidents per weather label.
    pub weather: Histogram,
    /// Accidents per hour label.
    pub times: Histogram,
}

/// A location whose accident count passed the occurrence threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotspotSummary {
    /// Rounded latitude.
    pub latitude: f64,
    /// Rounded longitude.
    pub longitude: f64,
    /// Number of accidents.
    pub count: u64,
    /// Full severity distribution.
    pub severities: Histogram,
    /// Most frequent weather label.
    pub weather: String,
    /// Most frequent hour label.
    pub time: String,
    /// Generated safety tip, present only for annotated locations.
    #[serde(default)]
    pub advisory: Option<String>,
}

impl HotspotSummary {
    /// Returns the grouping key this summary was built from.
    #[must_use]
    pub fn location(&self) -> LocationKey {
        LocationKey::from_coordinates(self.latitude, self.longitude)
    }
}
