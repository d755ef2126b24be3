//! OSRM driving-route collaborator.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use wayfarer_core::error::ServiceError;
use wayfarer_core::payload::RouteStep;

use crate::cache::TtlCache;
use crate::traits::{Coordinates, DrivingRoute, RoutingApi, check_status, transport_error};

const SERVICE: &str = "osrm";
const ROUTE_TTL: Duration = Duration::from_secs(6 * 3600);

/// OSRM caps applied to the mapped route.
const MAX_STEPS: usize = 20;

pub struct OsrmClient {
    base_url: String,
    client: reqwest::Client,
    cache: TtlCache<String, DrivingRoute>,
}

impl OsrmClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(25))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            cache: TtlCache::new(ROUTE_TTL),
        }
    }
}

#[async_trait]
impl RoutingApi for OsrmClient {
    async fn driving_route(
        &self,
        start: Coordinates,
        end: Coordinates,
    ) -> Result<DrivingRoute, ServiceError> {
        let cache_key =
            format!("{},{}->{},{}", start.lon, start.lat, end.lon, end.lat);
        if let Some(cached) = self.cache.get(&cache_key).await {
            return Ok(cached);
        }

        // OSRM takes lon,lat order.
        let url = format!(
            "{}/route/v1/driving/{},{};{},{}",
            self.base_url, start.lon, start.lat, end.lon, end.lat
        );
        let response = self
            .client
            .get(&url)
            .query(&[("overview", "false"), ("steps", "true")])
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        let response = check_status(SERVICE, response)?;

        let body: RouteResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::BadResponse {
                service: SERVICE.to_string(),
                reason: e.to_string(),
            })?;

        let route = body.into_route()?;
        debug!(
            distance_km = route.distance_km,
            duration_min = route.duration_min,
            steps = route.steps.len(),
            "OSRM route"
        );
        self.cache.insert(cache_key, route.clone()).await;
        Ok(route)
    }
}

// --- Wire types ---

#[derive(Debug, Deserialize)]
struct RouteResponse {
    code: String,
    #[serde(default)]
    routes: Vec<ApiRoute>,
}

#[derive(Debug, Deserialize)]
struct ApiRoute {
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    duration: f64,
    #[serde(default)]
    legs: Vec<ApiLeg>,
}

#[derive(Debug, Deserialize)]
struct ApiLeg {
    #[serde(default)]
    steps: Vec<ApiStep>,
}

#[derive(Debug, Deserialize)]
struct ApiStep {
    #[serde(default)]
    name: String,
    #[serde(default)]
    distance: Option<f64>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    maneuver: Option<ApiManeuver>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiManeuver {
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    modifier: String,
}

impl RouteResponse {
    fn into_route(self) -> Result<DrivingRoute, ServiceError> {
        if self.code != "Ok" {
            return Err(ServiceError::BadResponse {
                service: SERVICE.to_string(),
                reason: format!("routing failed with code {}", self.code),
            });
        }
        let route = self.routes.into_iter().next().ok_or_else(|| ServiceError::BadResponse {
            service: SERVICE.to_string(),
            reason: "no routes in answer".to_string(),
        })?;

        let steps = route
            .legs
            .iter()
            .flat_map(|leg| leg.steps.iter())
            .take(MAX_STEPS)
            .map(|s| RouteStep {
                instruction: step_instruction(s),
                distance_m: s.distance.map(|d| d.round() as u32),
                duration_s: s.duration.map(|d| d.round() as u32),
            })
            .collect();

        Ok(DrivingRoute {
            distance_km: route.distance / 1000.0,
            duration_min: route.duration / 60.0,
            steps,
        })
    }
}

/// Build a readable instruction from the maneuver and road name.
fn step_instruction(step: &ApiStep) -> String {
    let maneuver = step.maneuver.as_ref();
    let kind = maneuver.map(|m| m.kind.trim()).unwrap_or("");
    let modifier = maneuver.map(|m| m.modifier.trim()).unwrap_or("");
    let name = step.name.trim();

    let action = [kind, modifier]
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    match (action.is_empty(), name.is_empty()) {
        (false, false) => format!("{action} onto {name}"),
        (false, true) => action,
        (true, false) => name.to_string(),
        (true, true) => "Continue along the route".to_string(),
    }
}
