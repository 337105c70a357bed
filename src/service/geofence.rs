//! Great-circle distance and radius checks for kiosk punches.

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine distance in meters between two WGS84 points.
///
/// Non-finite input yields NaN; callers filter out punches without
/// coordinates before getting here.
pub fn distance_meters(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_M * a.sqrt().asin()
}

/// Inclusive: a punch exactly on the boundary is inside.
pub fn within_radius(distance_meters: f64, radius_meters: f64) -> bool {
    distance_meters <= radius_meters
}
