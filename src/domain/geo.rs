//! Dead-reckoning projection.
//!
//! Equirectangular local approximation: good for the few seconds between
//! snapshots, not for long-range navigation.

use crate::domain::entities::LatLon;

pub const METERS_PER_DEGREE_LAT: f64 = 111_320.0;

// Floor for meters per longitude degree near the poles.
const MIN_METERS_PER_DEGREE_LON: f64 = 1e-6;

/// Extrapolates a position along `heading_deg` (clockwise from north) at
/// `speed_mps` for `elapsed_sec`.
///
/// Returns the input unchanged when there is no motion to apply, including
/// non-finite heading, speed or elapsed values.
pub fn project(
    latitude: f64,
    longitude: f64,
    heading_deg: f64,
    speed_mps: f64,
    elapsed_sec: f64,
) -> LatLon {
    let origin = LatLon::new(latitude, longitude);
    if !(heading_deg.is_finite() && speed_mps.is_finite() && elapsed_sec.is_finite()) {
        return origin;
    }
    if speed_mps <= 0.0 || elapsed_sec <= 0.0 {
        return origin;
    }

    let distance = speed_mps * elapsed_sec;
    let heading_rad = heading_deg.to_radians();

    let north_meters = heading_rad.cos() * distance;
    let east_meters = heading_rad.sin() * distance;

    let meters_per_lon_degree =
        (METERS_PER_DEGREE_LAT * latitude.to_radians().cos()).max(MIN_METERS_PER_DEGREE_LON);

    LatLon::new(
        latitude + north_meters / METERS_PER_DEGREE_LAT,
        longitude + east_meters / meters_per_lon_degree,
    )
}
