//! Great-circle distance on a spherical Earth

use crate::constants::geo::EARTH_RADIUS_KM;
use crate::coord::Coordinates;

/// Calculate the distance between two points in kilometers (Haversine formula)
///
/// Works on angular differences, so pairs straddling the antimeridian
/// (e.g. 179.9 and -179.9) come out as neighbours. The haversine term is
/// clamped to [0, 1] so rounding near antipodal pairs cannot produce NaN.
///
/// # Returns
/// Distance in kilometers, finite and non-negative for valid coordinates
pub fn distance_km(a: Coordinates, b: Coordinates) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);
    let h = h.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Check if a point is within `radius_km` of `center`
///
/// The boundary is inclusive: a point at exactly `radius_km` is inside.
pub fn is_within_radius(point: Coordinates, center: Coordinates, radius_km: f64) -> bool {
    distance_km(center, point) <= radius_km
}
