//! Collaborator traits and their exchange types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use wayfarer_core::error::ServiceError;
use wayfarer_core::payload::RouteStep;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// A geocoded place with its resolved display label.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceMatch {
    pub coordinates: Coordinates,

    /// "Name, Region, Country" as resolved by the geocoder.
    pub label: String,
}

/// One day of the daily forecast.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForecastDay {
    /// ISO date.
    pub date: String,

    /// WMO weather code.
    pub code: Option<i32>,

    pub temp_min_c: Option<f64>,
    pub temp_max_c: Option<f64>,

    /// Max precipitation probability, percent.
    pub precipitation_chance: Option<u8>,

    pub wind_max_kmh: Option<f64>,
}

/// Conditions at request time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrentConditions {
    pub temperature_c: f64,
    pub wind_kmh: f64,
}

/// The forecast collaborator's full answer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Forecast {
    pub days: Vec<ForecastDay>,
    pub current: Option<CurrentConditions>,
}

/// A computed driving route.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrivingRoute {
    pub distance_km: f64,
    pub duration_min: f64,
    pub steps: Vec<RouteStep>,
}

/// Weather forecast collaborator (geocoding included — the forecast
/// service resolves place names itself).
#[async_trait]
pub trait WeatherApi: Send + Sync {
    /// Resolve a free-text place name. `Ok(None)` means the service
    /// answered but knows no such place.
    async fn geocode(&self, name: &str) -> Result<Option<PlaceMatch>, ServiceError>;

    async fn forecast(&self, at: Coordinates) -> Result<Forecast, ServiceError>;
}

/// General-purpose place geocoder for routing queries.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, query: &str) -> Result<Option<Coordinates>, ServiceError>;
}

/// Road routing collaborator.
#[async_trait]
pub trait RoutingApi: Send + Sync {
    async fn driving_route(
        &self,
        start: Coordinates,
        end: Coordinates,
    ) -> Result<DrivingRoute, ServiceError>;
}

/// Map a reqwest failure to the service error taxonomy.
pub(crate) fn transport_error(service: &str, e: reqwest::Error) -> ServiceError {
    if e.is_timeout() {
        ServiceError::Timeout { service: service.to_string() }
    } else {
        ServiceError::Network { service: service.to_string(), reason: e.to_string() }
    }
}

/// Reject non-2xx responses before deserialization.
pub(crate) fn check_status(
    service: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ServiceError::Http { service: service.to_string(), status: status.as_u16() })
    }
}
