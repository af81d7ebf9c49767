//! Location aggregation.
//!
//! Folds normalized records into one [`LocationAggregate`] per
//! [`LocationKey`]. The fold only ever increments counters, so the result
//! does not depend on the order records arrive in.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use accident_map_accident_models::{LocationKey, NormalizedRecord};
use accident_map_hotspot_models::{Histogram, LocationAggregate};

/// Aggregates keyed by location, iterated in key order.
pub type LocationMap = BTreeMap<LocationKey, LocationAggregate>;

/// Incremental builder for a [`LocationMap`].
#[derive(Debug, Default)]
pub struct LocationAggregator {
    locations: LocationMap,
    records: usize,
}

impl LocationAggregator {
    /// Creates an empty aggregator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one record into its location's aggregate.
    pub fn push(&mut self, record: &NormalizedRecord) {
        self.records += 1;

        match self.locations.entry(record.location) {
            Entry::Vacant(entry) => {
                entry.insert(first_observation(record));
            }
            Entry::Occupied(mut entry) => {
                let aggregate = entry.get_mut();
                aggregate.count += 1;
                aggregate.severities.increment(&record.severity);
                aggregate.weather.increment(record.weather.as_ref());
                aggregate.times.increment(&record.hour);
            }
        }
    }

    /// Number of records folded so far.
    #[must_use]
    pub const fn records(&self) -> usize {
        self.records
    }

    /// Number of distinct locations seen so far.
    #[must_use]
    pub fn locations(&self) -> usize {
        self.locations.len()
    }

    /// Returns the finished location map.
    #[must_use]
    pub fn finish(self) -> LocationMap {
        self.locations
    }
}

impl<'a> Extend<&'a NormalizedRecord> for LocationAggregator {
    fn extend<I: IntoIterator<Item = &'a NormalizedRecord>>(&mut self, iter: I) {
        for record in iter {
            self.push(record);
        }
    }
}

/// Aggregates a sequence of normalized records.
#[must_use]
pub fn aggregate_records<'a>(
    records: impl IntoIterator<Item = &'a NormalizedRecord>,
) -> LocationMap {
    let mut aggregator = LocationAggregator::new();
    aggregator.extend(records);
    aggregator.finish()
}

fn first_observation(record: &NormalizedRecord) -> LocationAggregate {
    let mut severities = Histogram::new();
    let mut weather = Histogram::new();
    let mut times = Histogram::new();
    severities.increment(&record.severity);
    weather.increment(record.weather.as_ref());
    times.increment(&record.hour);

    LocationAggregate {
        count: 1,
        severities,
        weather,
        times,
    }
}
