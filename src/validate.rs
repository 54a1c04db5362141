//! Input validation and normalization
//!
//! Pure functions shared by the stores and the HTTP layer. Each failure is an
//! [`Error::Validation`] naming the offending field.

use crate::constants::limits::TITLE_MAX_CHARS;
use crate::coord::Coordinates;
use crate::error::{Error, Result};

/// Trim message text; empty text is rejected
pub fn normalize_text(text: &str) -> Result<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(Error::validation("text", "This field may not be blank"));
    }
    Ok(trimmed.to_string())
}

/// Trim an optional title, mapping blank to absent
pub fn normalize_title(title: Option<&str>) -> Option<String> {
    title
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Reject titles longer than [`TITLE_MAX_CHARS`] characters
pub fn check_title_length(title: Option<&str>) -> Result<()> {
    match title {
        Some(t) if t.chars().count() > TITLE_MAX_CHARS => Err(Error::validation(
            "title",
            format!("Ensure this field has no more than {} characters", TITLE_MAX_CHARS),
        )),
        _ => Ok(()),
    }
}

pub fn validate_coordinate(lat: f64, lng: f64) -> Result<Coordinates> {
    let coords = Coordinates::new(lat, lng);
    coords.validate()?;
    Ok(coords)
}

/// Check a search radius in kilometers against zero and the optional ceiling
pub fn validate_radius(radius_km: f64, ceiling_km: Option<f64>) -> Result<f64> {
    if !radius_km.is_finite() {
        return Err(Error::validation("radius", "A finite number is required"));
    }
    if radius_km < 0.0 {
        return Err(Error::validation(
            "radius",
            "Ensure this value is greater than or equal to 0",
        ));
    }
    if let Some(ceiling) = ceiling_km {
        if radius_km > ceiling {
            return Err(Error::validation(
                "radius",
                format!("Radius must not exceed {} km", ceiling),
            ));
        }
    }
    Ok(radius_km)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(err: Error) -> String {
        match err {
            Error::Validation { field, .. } => field,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  hello ").unwrap(), "hello");
        assert_eq!(normalize_text("a b").unwrap(), "a b");
        assert_eq!(field_of(normalize_text("").unwrap_err()), "text");
        assert_eq!(field_of(normalize_text(" \t\n ").unwrap_err()), "text");
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title(Some(" A ")), Some("A".to_string()));
        assert_eq!(normalize_title(Some("")), None);
        assert_eq!(normalize_title(Some("   ")), None);
        assert_eq!(normalize_title(None), None);
    }

    #[test]
    fn test_check_title_length() {
        let longest = "x".repeat(TITLE_MAX_CHARS);
        assert!(check_title_length(Some(longest.as_str())).is_ok());
        assert!(check_title_length(None).is_ok());

        let too_long = "я".repeat(TITLE_MAX_CHARS + 1);
        assert_eq!(field_of(check_title_length(Some(too_long.as_str())).unwrap_err()), "title");
    }

    #[test]
    fn test_validate_coordinate() {
        let coords = validate_coordinate(55.751244, 37.618423).unwrap();
        assert_eq!(coords, Coordinates::new(55.751244, 37.618423));

        assert_eq!(field_of(validate_coordinate(-90.1, 0.0).unwrap_err()), "latitude");
        assert_eq!(field_of(validate_coordinate(0.0, 181.0).unwrap_err()), "longitude");
    }

    #[test]
    fn test_validate_radius_without_ceiling() {
        for radius in [0.0, 0.001, 1.0, 25_000.0] {
            assert_eq!(validate_radius(radius, None).unwrap(), radius);
        }
        for radius in [-0.001, -1.0, f64::NAN, f64::INFINITY] {
            assert!(validate_radius(radius, None).is_err(), "radius {} accepted", radius);
        }
    }

    #[test]
    fn test_validate_radius_with_ceiling() {
        for radius in [0.0, 0.5, 1.0] {
            assert!(validate_radius(radius, Some(1.0)).is_ok());
        }
        for radius in [1.0001, 2.0, 1000.0] {
            let err = validate_radius(radius, Some(1.0)).unwrap_err();
            assert!(err.to_string().contains("1 km"), "message was {}", err);
        }
        assert!(validate_radius(-1.0, Some(1.0)).is_err());
    }
}
