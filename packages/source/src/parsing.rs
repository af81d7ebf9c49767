//! Shared parsing utilities for raw dataset rows.
//!
//! Open-data portals are inconsistent about types: the same column may be
//! a JSON number in one dataset and a numeric string in another. These
//! helpers accept both.

use serde_json::Value;

/// Parses a coordinate from a JSON number or numeric string. Returns
/// `None` if missing, null, unparseable, or not finite.
#[must_use]
pub fn parse_coordinate(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

/// Parses a lat/lng pair. Returns `None` if either is missing, zero, or
/// outside the WGS84 range.
#[must_use]
pub fn parse_lat_lng(lat: Option<&Value>, lng: Option<&Value>) -> Option<(f64, f64)> {
    let latitude = parse_coordinate(lat)?;
    let longitude = parse_coordinate(lng)?;
    if latitude == 0.0 || longitude == 0.0 {
        return None;
    }
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return None;
    }
    Some((latitude, longitude))
}

/// Parses an integer code from a JSON integer, an integral float, or a
/// numeric string.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn parse_code(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.is_finite())
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Returns a trimmed, non-empty string value.
#[must_use]
pub fn parse_text(value: Option<&Value>) -> Option<String> {
    let s = value?.as_str()?.trim();
    (!s.is_empty()).then(|| s.to_string())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_numeric_and_string_coordinates() {
        let number = json!(45.512_34);
        let string = json!("-73.5567");
        assert!((parse_coordinate(Some(&number)).unwrap() - 45.512_34).abs() < f64::EPSILON);
        assert!((parse_coordinate(Some(&string)).unwrap() - -73.5567).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_null_and_garbage_coordinates() {
        assert!(parse_coordinate(None).is_none());
        assert!(parse_coordinate(Some(&Value::Null)).is_none());
        assert!(parse_coordinate(Some(&json!("n/a"))).is_none());
        assert!(parse_coordinate(Some(&json!("NaN"))).is_none());
    }

    #[test]
    fn rejects_zero_and_out_of_range_lat_lng() {
        assert!(parse_lat_lng(Some(&json!(0.0)), Some(&json!(-73.5))).is_none());
        assert!(parse_lat_lng(Some(&json!(45.5)), Some(&json!(0))).is_none());
        assert!(parse_lat_lng(Some(&json!(295_000.1)), Some(&json!(5_040_000.2))).is_none());
        assert!(parse_lat_lng(Some(&json!(45.5)), Some(&json!(-73.5))).is_some());
    }

    #[test]
    fn parses_codes_in_several_shapes() {
        assert_eq!(parse_code(Some(&json!(11))), Some(11));
        assert_eq!(parse_code(Some(&json!(14.0))), Some(14));
        assert_eq!(parse_code(Some(&json!(" 99 "))), Some(99));
        assert_eq!(parse_code(Some(&json!(11.5))), None);
        assert_eq!(parse_code(Some(&json!("clear"))), None);
        assert_eq!(parse_code(Some(&Value::Null)), None);
    }

    #[test]
    fn blank_text_is_none() {
        assert_eq!(parse_text(Some(&json!("  Léger "))), Some("Léger".to_string()));
        assert_eq!(parse_text(Some(&json!("   "))), None);
        assert_eq!(parse_text(Some(&json!(3))), None);
    }
}
