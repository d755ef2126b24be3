//! Open-Meteo collaborator: place search and daily forecast.
//!
//! No API key required. Geocoding answers are cached for a day and
//! forecasts for thirty minutes.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use wayfarer_core::error::ServiceError;

use crate::cache::TtlCache;
use crate::traits::{
    Coordinates, CurrentConditions, Forecast, ForecastDay, PlaceMatch, WeatherApi, check_status,
    transport_error,
};

const SERVICE: &str = "open-meteo";
const GEOCODE_TTL: Duration = Duration::from_secs(24 * 3600);
const FORECAST_TTL: Duration = Duration::from_secs(1800);
const FORECAST_DAYS: u8 = 3;

pub struct OpenMeteoClient {
    forecast_base: String,
    geocoding_base: String,
    client: reqwest::Client,
    geocode_cache: TtlCache<String, Option<PlaceMatch>>,
    forecast_cache: TtlCache<String, Forecast>,
}

impl OpenMeteoClient {
    pub fn new(forecast_base: impl Into<String>, geocoding_base: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            forecast_base: forecast_base.into().trim_end_matches('/').to_string(),
            geocoding_base: geocoding_base.into().trim_end_matches('/').to_string(),
            client,
            geocode_cache: TtlCache::new(GEOCODE_TTL),
            forecast_cache: TtlCache::new(FORECAST_TTL),
        }
    }
}

#[async_trait]
impl WeatherApi for OpenMeteoClient {
    async fn geocode(&self, name: &str) -> Result<Option<PlaceMatch>, ServiceError> {
        let query = name.trim();
        if query.is_empty() {
            return Ok(None);
        }

        let cache_key = query.to_lowercase();
        if let Some(cached) = self.geocode_cache.get(&cache_key).await {
            return Ok(cached);
        }

        let url = format!("{}/search", self.geocoding_base);
        let response = self
            .client
            .get(&url)
            .query(&[("name", query), ("count", "1"), ("language", "en"), ("format", "json")])
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        let response = check_status(SERVICE, response)?;

        let body: GeocodingResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::BadResponse {
                service: SERVICE.to_string(),
                reason: e.to_string(),
            })?;

        let found = body.results.into_iter().flatten().next().map(|r| {
            let label_parts: Vec<&str> = [r.name.as_str(), r.admin1.as_deref().unwrap_or(""), r.country.as_deref().unwrap_or("")]
                .into_iter()
                .filter(|p| !p.is_empty())
                .collect();
            PlaceMatch {
                coordinates: Coordinates::new(r.latitude, r.longitude),
                label: label_parts.join(", "),
            }
        });

        debug!(query, found = found.is_some(), "Open-Meteo geocode");
        self.geocode_cache.insert(cache_key, found.clone()).await;
        Ok(found)
    }

    async fn forecast(&self, at: Coordinates) -> Result<Forecast, ServiceError> {
        let cache_key = format!("{:.4},{:.4}", at.lat, at.lon);
        if let Some(cached) = self.forecast_cache.get(&cache_key).await {
            return Ok(cached);
        }

        let url = format!("{}/forecast", self.forecast_base);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("latitude", at.lat.to_string()),
                ("longitude", at.lon.to_string()),
                (
                    "daily",
                    "weathercode,temperature_2m_max,temperature_2m_min,\
                     precipitation_probability_max,windspeed_10m_max"
                        .to_string(),
                ),
                ("current_weather", "true".to_string()),
                ("timezone", "auto".to_string()),
                ("forecast_days", FORECAST_DAYS.to_string()),
            ])
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        let response = check_status(SERVICE, response)?;

        let body: ForecastResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::BadResponse {
                service: SERVICE.to_string(),
                reason: e.to_string(),
            })?;

        let forecast = body.into_forecast();
        debug!(lat = at.lat, lon = at.lon, days = forecast.days.len(), "Open-Meteo forecast");
        self.forecast_cache.insert(cache_key, forecast.clone()).await;
        Ok(forecast)
    }
}

/// Human-readable description of a WMO weather code.
pub fn weather_code_description(code: i32) -> String {
    let text = match code {
        0 => "clear sky",
        1 => "mainly clear",
        2 => "partly cloudy",
        3 => "overcast",
        45 => "fog",
        48 => "depositing rime fog",
        51 => "light drizzle",
        53 => "moderate drizzle",
        55 => "dense drizzle",
        56 => "light freezing drizzle",
        57 => "dense freezing drizzle",
        61 => "slight rain",
        63 => "moderate rain",
        65 => "heavy rain",
        66 => "light freezing rain",
        67 => "heavy freezing rain",
        71 => "slight snowfall",
        73 => "moderate snowfall",
        75 => "heavy snowfall",
        77 => "snow grains",
        80 => "slight rain showers",
        81 => "moderate rain showers",
        82 => "violent rain showers",
        85 => "slight snow showers",
        86 => "heavy snow showers",
        95 => "thunderstorm",
        96 => "thunderstorm with slight hail",
        99 => "thunderstorm with heavy hail",
        other => return format!("weather code {other}"),
    };
    text.to_string()
}

// --- Wire types ---

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    results: Option<Vec<GeocodingResult>>,
}

#[derive(Debug, Deserialize)]
struct GeocodingResult {
    latitude: f64,
    longitude: f64,
    name: String,
    #[serde(default)]
    admin1: Option<String>,
    #[serde(default)]
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    daily: Option<DailyBlock>,
    #[serde(default)]
    current_weather: Option<CurrentWeatherBlock>,
}

#[derive(Debug, Default, Deserialize)]
struct DailyBlock {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    weathercode: Vec<Option<i32>>,
    #[serde(default)]
    temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_probability_max: Vec<Option<f64>>,
    #[serde(default)]
    windspeed_10m_max: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct CurrentWeatherBlock {
    temperature: f64,
    windspeed: f64,
}

impl ForecastResponse {
    fn into_forecast(self) -> Forecast {
        let daily = self.daily.unwrap_or_default();

        fn at<T: Copy>(v: &[Option<T>], i: usize) -> Option<T> {
            v.get(i).copied().flatten()
        }

        let days = daily
            .time
            .iter()
            .enumerate()
            .map(|(i, date)| ForecastDay {
                date: date.clone(),
                code: at(&daily.weathercode, i),
                temp_min_c: at(&daily.temperature_2m_min, i),
                temp_max_c: at(&daily.temperature_2m_max, i),
                precipitation_chance: at(&daily.precipitation_probability_max, i)
                    .map(|p| p.clamp(0.0, 100.0).round() as u8),
                wind_max_kmh: at(&daily.windspeed_10m_max, i),
            })
            .collect();

        Forecast {
            days,
            current: self.current_weather.map(|c| CurrentConditions {
                temperature_c: c.temperature,
                wind_kmh: c.windspeed,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forecast_response_maps_by_day_index() {
        let json = r#"{
            "daily": {
                "time": ["2026-08-29", "2026-08-30"],
                "weathercode": [61, 0],
                "temperature_2m_max": [22.4, 27.1],
                "temperature_2m_min": [15.0, 16.2],
                "precipitation_probability_max": [72.0, 5.0],
                "windspeed_10m_max": [18.5, 12.0]
            },
            "current_weather": { "temperature": 19.3, "windspeed": 10.0 }
        }"#;
        let parsed: ForecastResponse = serde_json::from_str(json).unwrap();
        let forecast = parsed.into_forecast();

        assert_eq!(forecast.days.len(), 2);
        assert_eq!(forecast.days[0].date, "2026-08-29");
        assert_eq!(forecast.days[0].code, Some(61));
        assert_eq!(forecast.days[0].precipitation_chance, Some(72));
        assert_eq!(forecast.days[1].temp_max_c, Some(27.1));
        assert_eq!(
            forecast.current,
            Some(CurrentConditions { temperature_c: 19.3, wind_kmh: 10.0 })
        );
    }

    #[test]
    fn forecast_response_tolerates_missing_blocks() {
        let parsed: ForecastResponse = serde_json::from_str("{}").unwrap();
        let forecast = parsed.into_forecast();
        assert!(forecast.days.is_empty());
        assert!(forecast.current.is_none());
    }

    #[test]
    fn geocoding_response_first_result_wins() {
        let json = r#"{"results": [
            {"latitude": 35.69, "longitude": 139.69, "name": "Tokyo", "country": "Japan"},
            {"latitude": 0.0, "longitude": 0.0, "name": "Other"}
        ]}"#;
        let parsed: GeocodingResponse = serde_json::from_str(json).unwrap();
        let first = parsed.results.into_iter().flatten().next().unwrap();
        assert_eq!(first.name, "Tokyo");
        assert_eq!(first.country.as_deref(), Some("Japan"));
    }

    #[test]
    fn weather_codes_map_to_text() {
        assert_eq!(weather_code_description(0), "clear sky");
        assert_eq!(weather_code_description(95), "thunderstorm");
        assert_eq!(weather_code_description(42), "weather code 42");
    }
}
