//! Great-circle distance and interpolation on a spherical Earth.

use crate::config::constants::{ANGULAR_EPSILON, EARTH_RADIUS_KM};
use crate::models::coordinate::Coordinate;

/// Central angle between two points in radians (haversine form).
fn central_angle(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = lat2 - lat1;
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * h.sqrt().min(1.0).asin()
}

/// Great-circle distance in km between two points.
pub fn distance(a: &Coordinate, b: &Coordinate) -> f64 {
    EARTH_RADIUS_KM * central_angle(a, b)
}

/// Point at `fraction` of the way along the great-circle arc from `a` to `b`.
///
/// `fraction` is not clamped; values outside [0, 1] extrapolate along the
/// same circle. Coincident endpoints return `a`.
pub fn interpolate(a: &Coordinate, b: &Coordinate, fraction: f64) -> Coordinate {
    let d = central_angle(a, b);
    if d < ANGULAR_EPSILON {
        return *a;
    }

    let (lat1, lon1) = (a.lat.to_radians(), a.lon.to_radians());
    let (lat2, lon2) = (b.lat.to_radians(), b.lon.to_radians());

    let sin_d = d.sin();
    let wa = ((1.0 - fraction) * d).sin() / sin_d;
    let wb = (fraction * d).sin() / sin_d;

    let x = wa * lat1.cos() * lon1.cos() + wb * lat2.cos() * lon2.cos();
    let y = wa * lat1.cos() * lon1.sin() + wb * lat2.cos() * lon2.sin();
    let z = wa * lat1.sin() + wb * lat2.sin();

    let lat = z.atan2((x * x + y * y).sqrt());
    let lon = y.atan2(x);
    Coordinate::new(lat.to_degrees(), lon.to_degrees())
}
