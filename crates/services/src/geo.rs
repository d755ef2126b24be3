//! Geometry helpers for waypoint tours.

use crate::traits::Coordinates;

/// A named, geocoded waypoint.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoPoint {
    pub name: String,
    pub coordinates: Coordinates,
}

impl GeoPoint {
    pub fn new(name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self { name: name.into(), coordinates: Coordinates::new(lat, lon) }
    }
}

/// Great-circle distance in kilometers.
pub fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;

    let p1 = a.lat.to_radians();
    let p2 = b.lat.to_radians();
    let dphi = (b.lat - a.lat).to_radians();
    let dlambda = (b.lon - a.lon).to_radians();

    let x = (dphi / 2.0).sin().powi(2) + p1.cos() * p2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * x.sqrt().asin()
}

/// Order waypoints greedily by nearest neighbor, starting from the first.
///
/// Good enough for a handful of sights in one city; not an optimal tour.
pub fn order_nearest(points: Vec<GeoPoint>) -> Vec<GeoPoint> {
    if points.len() <= 2 {
        return points;
    }

    let mut remaining = points;
    let mut route = vec![remaining.remove(0)];

    while !remaining.is_empty() {
        let last = route[route.len() - 1].coordinates;
        let mut best_i = 0;
        let mut best_d = f64::INFINITY;
        for (i, p) in remaining.iter().enumerate() {
            let d = haversine_km(last, p.coordinates);
            if d < best_d {
                best_d = d;
                best_i = i;
            }
        }
        route.push(remaining.remove(best_i));
    }
    route
}
