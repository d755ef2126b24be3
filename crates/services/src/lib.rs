//! External REST collaborators: weather, geocoding, routing.
//!
//! Each collaborator sits behind a trait so agents can be tested without
//! network access. The reqwest-backed implementations use typed response
//! structs, per-service timeouts, and a small TTL cache in front of the
//! geocoding and forecast calls. Maps-link builders and the geometry
//! helpers are pure functions.

pub mod cache;
pub mod geo;
pub mod maps;
pub mod nominatim;
pub mod open_meteo;
pub mod osrm;
pub mod traits;

pub use cache::TtlCache;
pub use geo::{GeoPoint, haversine_km, order_nearest};
pub use nominatim::NominatimClient;
pub use open_meteo::{OpenMeteoClient, weather_code_description};
pub use osrm::OsrmClient;
pub use traits::{
    Coordinates, CurrentConditions, DrivingRoute, Forecast, ForecastDay, Geocoder, PlaceMatch,
    RoutingApi, WeatherApi,
};
