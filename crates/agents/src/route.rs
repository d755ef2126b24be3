//! Route agent: point-to-point driving directions and waypoint walking
//! tours.
//!
//! A geocoder miss or a routing refusal degrades to a notes-only payload
//! (the user still gets a readable explanation); transport failures toward
//! the collaborators surface as domain failures.

use std::sync::Arc;
use tracing::{debug, info};
use wayfarer_core::payload::{DomainFailure, RouteKind, RoutePayload, TourismPayload};
use wayfarer_services::geo::{GeoPoint, order_nearest};
use wayfarer_services::maps;
use wayfarer_services::traits::{Geocoder, RoutingApi};

/// How many tour stops to geocode at most.
const MAX_TOUR_STOPS: usize = 8;

pub struct RouteAgent {
    geocoder: Arc<dyn Geocoder>,
    routing: Arc<dyn RoutingApi>,
}

impl RouteAgent {
    pub fn new(geocoder: Arc<dyn Geocoder>, routing: Arc<dyn RoutingApi>) -> Self {
        Self { geocoder, routing }
    }

    /// A → B driving directions.
    pub async fn point_to_point(
        &self,
        start: &str,
        end: &str,
    ) -> Result<RoutePayload, DomainFailure> {
        let kind = RouteKind::PointToPoint { start: start.to_string(), end: end.to_string() };

        let start_at = self
            .geocoder
            .geocode(start)
            .await
            .map_err(|e| DomainFailure::collaborator(e.to_string()))?;
        let end_at = self
            .geocoder
            .geocode(end)
            .await
            .map_err(|e| DomainFailure::collaborator(e.to_string()))?;

        let (Some(start_at), Some(end_at)) = (start_at, end_at) else {
            info!(start, end, "Route endpoint could not be geocoded");
            return Ok(notes_only(
                kind,
                "One of the endpoints could not be found. Try the form \"City, Country\".",
            ));
        };

        let route = match self.routing.driving_route(start_at, end_at).await {
            Ok(route) => route,
            Err(e) => {
                info!(error = %e, "Routing collaborator refused the route");
                return Ok(notes_only(kind, &format!("No drivable route was found: {e}")));
            }
        };

        debug!(distance_km = route.distance_km, steps = route.steps.len(), "Route ready");
        Ok(RoutePayload {
            kind,
            distance_km: Some(route.distance_km),
            duration_min: Some(route.duration_min),
            steps: route.steps,
            maps_url: maps::directions_url(start_at, end_at, "driving"),
            notes: Vec::new(),
            source: "osrm".to_string(),
        })
    }

    /// Walking tour over the tourism payload's suggested places.
    ///
    /// Geocodes each place (skipping misses with a note), orders the stops
    /// by nearest neighbor, and links a multi-waypoint walking route.
    pub async fn waypoint_tour(
        &self,
        tourism: &TourismPayload,
        destination: &str,
    ) -> Result<RoutePayload, DomainFailure> {
        let names = tourism.waypoint_names(MAX_TOUR_STOPS);
        let kind = RouteKind::Waypoints { points: names.clone() };

        let mut points = Vec::new();
        let mut notes = Vec::new();
        for name in &names {
            let query = tourism.waypoint_query(name, destination);
            match self.geocoder.geocode(&query).await {
                Ok(Some(at)) => points.push(GeoPoint { name: name.clone(), coordinates: at }),
                Ok(None) => notes.push(format!("Could not locate \"{name}\", skipped.")),
                Err(e) => return Err(DomainFailure::collaborator(e.to_string())),
            }
        }

        if points.len() < 2 {
            info!(requested = names.len(), resolved = points.len(), "Too few stops for a tour");
            notes.push(
                "Fewer than two places could be located, so no tour was built.".to_string(),
            );
            return Ok(notes_only_with(kind, notes));
        }

        let ordered = order_nearest(points);
        let ordered_names: Vec<String> = ordered.iter().map(|p| p.name.clone()).collect();
        let maps_url = maps::waypoints_url(&ordered, "walking");

        debug!(stops = ordered_names.len(), "Walking tour ready");
        Ok(RoutePayload {
            kind: RouteKind::Waypoints { points: ordered_names },
            distance_km: None,
            duration_min: None,
            steps: Vec::new(),
            maps_url,
            notes,
            source: "nominatim".to_string(),
        })
    }
}

fn notes_only(kind: RouteKind, note: &str) -> RoutePayload {
    notes_only_with(kind, vec![note.to_string()])
}

fn notes_only_with(kind: RouteKind, notes: Vec<String>) -> RoutePayload {
    RoutePayload {
        kind,
        distance_km: None,
        duration_min: None,
        steps: Vec::new(),
        maps_url: None,
        notes,
        source: String::new(),
    }
}
