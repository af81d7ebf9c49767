//! Record normalization.
//!
//! Turns a [`RawAccidentRecord`] into the canonical [`NormalizedRecord`]
//! used as aggregation input. Missing or malformed values never fail: they
//! become the [`UNKNOWN`] category.

use accident_map_accident_models::{
    LocationKey, NormalizedRecord, RawAccidentRecord, UNKNOWN, WeatherCondition,
};

/// Separator between the components of a time-of-day range.
pub const TIME_SEPARATOR: char = '-';

/// Normalizes one raw record.
#[must_use]
pub fn normalize_record(raw: &RawAccidentRecord) -> NormalizedRecord {
    NormalizedRecord {
        location: LocationKey::from_coordinates(raw.latitude, raw.longitude),
        severity: normalize_severity(raw.severity.as_deref()),
        weather: raw
            .weather_code
            .map_or(WeatherCondition::Unknown, WeatherCondition::from_code),
        hour: extract_hour(raw.time.as_deref()),
    }
}

/// Returns the trimmed severity label, or [`UNKNOWN`] when blank.
#[must_use]
pub fn normalize_severity(severity: Option<&str>) -> String {
    severity
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(UNKNOWN)
        .to_string()
}

/// Extracts the hour category: the last component of the time string.
///
/// `"16:00:00-16:59:00"` yields `"16:59:00"` and `"13-14"` yields `"14"`.
/// A missing string, one without a separator, or one whose last component
/// is blank yields [`UNKNOWN`].
#[must_use]
pub fn extract_hour(time: Option<&str>) -> String {
    time.and_then(|t| t.rsplit_once(TIME_SEPARATOR))
        .map(|(_, hour)| hour.trim())
        .filter(|hour| !hour.is_empty())
        .unwrap_or(UNKNOWN)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(weather_code: Option<i64>, time: Option<&str>) -> RawAccidentRecord {
        RawAccidentRecord {
            latitude: 45.500_04,
            longitude: -73.499_96,
            severity: Some(" Léger ".to_string()),
            weather_code,
            time: time.map(String::from),
        }
    }

    #[test]
    fn normalizes_complete_record() {
        let record = normalize_record(&raw(Some(14), Some("16:00:00-16:59:00")));
        assert_eq!(record.location, LocationKey::from_coordinates(45.5, -73.5));
        assert_eq!(record.severity, "Léger");
        assert_eq!(record.weather, WeatherCondition::Rainy);
        assert_eq!(record.hour, "16:59:00");
    }

    #[test]
    fn hour_is_last_component() {
        assert_eq!(extract_hour(Some("13-14")), "14");
        assert_eq!(extract_hour(Some("a-b-c")), "c");
    }

    #[test]
    fn malformed_time_is_unknown() {
        assert_eq!(extract_hour(None), UNKNOWN);
        assert_eq!(extract_hour(Some("")), UNKNOWN);
        assert_eq!(extract_hour(Some("Non précisé")), UNKNOWN);
        assert_eq!(extract_hour(Some("14- ")), UNKNOWN);
    }

    #[test]
    fn unrecognized_weather_is_unknown() {
        assert_eq!(normalize_record(&raw(Some(42), None)).weather, WeatherCondition::Unknown);
        assert_eq!(normalize_record(&raw(None, None)).weather, WeatherCondition::Unknown);
        assert_eq!(normalize_record(&raw(Some(99), None)).weather, WeatherCondition::Other);
    }

    #[test]
    fn blank_severity_is_unknown() {
        assert_eq!(normalize_severity(None), UNKNOWN);
        assert_eq!(normalize_severity(Some("  ")), UNKNOWN);
        assert_eq!(normalize_severity(Some("Mortel")), "Mortel");
    }
}
