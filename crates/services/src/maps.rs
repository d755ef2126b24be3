//! Google Maps link builders. Pure functions, no network.

use crate::geo::GeoPoint;
use crate::traits::Coordinates;
use reqwest::Url;

const SEARCH_BASE: &str = "https://www.google.com/maps/search/";
const DIRECTIONS_BASE: &str = "https://www.google.com/maps/dir/";

fn coord_param(c: Coordinates) -> String {
    format!("{},{}", c.lat, c.lon)
}

/// Link that searches the map for a free-text query.
pub fn search_url(query: &str) -> Option<String> {
    let url =
        Url::parse_with_params(SEARCH_BASE, &[("api", "1"), ("query", query)]).ok()?;
    Some(url.to_string())
}

/// A → B directions link.
pub fn directions_url(start: Coordinates, end: Coordinates, travelmode: &str) -> Option<String> {
    let url = Url::parse_with_params(
        DIRECTIONS_BASE,
        &[
            ("api", "1"),
            ("origin", coord_param(start).as_str()),
            ("destination", coord_param(end).as_str()),
            ("travelmode", travelmode),
        ],
    )
    .ok()?;
    Some(url.to_string())
}

/// Multi-stop directions link over an ordered tour. Needs at least two
/// points; intermediate stops become waypoints.
pub fn waypoints_url(ordered: &[GeoPoint], travelmode: &str) -> Option<String> {
    if ordered.len() < 2 {
        return None;
    }

    let origin = coord_param(ordered[0].coordinates);
    let destination = coord_param(ordered[ordered.len() - 1].coordinates);
    let mut params: Vec<(&str, String)> = vec![
        ("api", "1".to_string()),
        ("origin", origin),
        ("destination", destination),
        ("travelmode", travelmode.to_string()),
    ];

    let middle: Vec<String> = ordered[1..ordered.len() - 1]
        .iter()
        .map(|p| coord_param(p.coordinates))
        .collect();
    if !middle.is_empty() {
        params.push(("waypoints", middle.join("|")));
    }

    let url = Url::parse_with_params(DIRECTIONS_BASE, &params).ok()?;
    Some(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_url_encodes_query() {
        let url = search_url("Senso-ji Temple, Tokyo").unwrap();
        assert!(url.starts_with(SEARCH_BASE));
        assert!(url.contains("api=1"));
        assert!(!url.contains(' '));
    }

    #[test]
    fn directions_url_carries_both_endpoints() {
        let url = directions_url(
            Coordinates::new(35.6812, 139.7671),
            Coordinates::new(34.9858, 135.7588),
            "driving",
        )
        .unwrap();
        assert!(url.contains("origin=35.6812"));
        assert!(url.contains("destination=34.9858"));
        assert!(url.contains("travelmode=driving"));
    }

    #[test]
    fn waypoints_url_puts_middle_stops_in_waypoints() {
        let points = vec![
            GeoPoint::new("a", 1.0, 1.0),
            GeoPoint::new("b", 2.0, 2.0),
            GeoPoint::new("c", 3.0, 3.0),
        ];
        let url = waypoints_url(&points, "walking").unwrap();
        assert!(url.contains("origin=1%2C1") || url.contains("origin=1,1"));
        assert!(url.contains("waypoints="));
        assert!(url.contains("travelmode=walking"));
    }

    #[test]
    fn waypoints_url_requires_two_points() {
        let single = vec![GeoPoint::new("a", 1.0, 1.0)];
        assert!(waypoints_url(&single, "walking").is_none());
        assert!(waypoints_url(&[], "walking").is_none());
    }
}
