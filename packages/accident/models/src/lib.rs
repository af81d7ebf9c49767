#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Traffic accident record types, weather taxonomy, and location keys.
//!
//! This crate defines the canonical shapes that flow through the accident
//! hotspot pipeline. Upstream datasets are extracted into
//! [`RawAccidentRecord`]s, normalized into [`NormalizedRecord`]s, and
//! grouped by [`LocationKey`].

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Category label used whenever a raw value is missing or unrecognized.
pub const UNKNOWN: &str = "unknown";

/// Number of rounding steps per degree (4 decimal places).
const COORDINATE_SCALE: f64 = 10_000.0;

/// Weather condition at the time of an accident.
///
/// Decoded from the numeric weather code published with the Montréal
/// collision dataset. Codes outside the published table decode to
/// [`WeatherCondition::Unknown`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum WeatherCondition {
    /// Code 11
    Clear,
    /// Code 12
    Cloudy,
    /// Code 13
    Foggy,
    /// Code 14
    Rainy,
    /// Code 15
    VeryRainy,
    /// Code 16
    Windy,
    /// Code 17
    SnowHail,
    /// Code 18
    Snowstorm,
    /// Code 19
    Icy,
    /// Code 99
    Other,
    /// Missing or unpublished code
    Unknown,
}

impl WeatherCondition {
    /// Decodes a raw weather code.
    #[must_use]
    pub const fn from_code(code: i64) -> Self {
        match code {
            11 => Self::Clear,
            12 => Self::Cloudy,
            13 => Self::Foggy,
            14 => Self::Rainy,
            15 => Self::VeryRainy,
            16 => Self::Windy,
            17 => Self::SnowHail,
            18 => Self::Snowstorm,
            19 => Self::Icy,
            99 => Self::Other,
            _ => Self::Unknown,
        }
    }
}

/// Grouping key for accidents that share a rounded coordinate pair.
///
/// Coordinates are stored as whole ten-thousandths of a degree so that
/// equality is exact on the rounded values and the key can be hashed and
/// ordered. Keys order by latitude, then longitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocationKey {
    latitude_e4: i64,
    longitude_e4: i64,
}

impl LocationKey {
    /// Builds the key for a raw coordinate pair, rounding both axes to
    /// 4 decimal places with halves rounded away from zero.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_coordinates(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude_e4: (latitude * COORDINATE_SCALE).round() as i64,
            longitude_e4: (longitude * COORDINATE_SCALE).round() as i64,
        }
    }

    /// Rounded latitude in degrees.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn latitude(self) -> f64 {
        self.latitude_e4 as f64 / COORDINATE_SCALE
    }

    /// Rounded longitude in degrees.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn longitude(self) -> f64 {
        self.longitude_e4 as f64 / COORDINATE_SCALE
    }
}

impl std::fmt::Display for LocationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4},{:.4}", self.latitude(), self.longitude())
    }
}

/// One accident record as extracted from an upstream dataset.
///
/// Only records with usable coordinates are represented; the remaining
/// fields are optional because the open data is not consistently filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAccidentRecord {
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// Source severity label (e.g. `"Léger"`, `"Mortel"`).
    pub severity: Option<String>,
    /// Numeric weather code.
    pub weather_code: Option<i64>,
    /// Time-of-day range, e.g. `"16:00:00-16:59:00"`.
    pub time: Option<String>,
}

/// An accident record in canonical form, ready for aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRecord {
    /// Rounded coordinate pair.
    pub location: LocationKey,
    /// Severity category, or [`UNKNOWN`].
    pub severity: String,
    /// Decoded weather condition.
    pub weather: WeatherCondition,
    /// Hour category, or [`UNKNOWN`].
    pub hour: String,
}
