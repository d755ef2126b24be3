//! Weather agent: forecast lookup and threshold-derived advice.
//!
//! All numbers come from the forecast collaborator; the advice lines are
//! derived from fixed thresholds, never generated.

use std::sync::Arc;
use tracing::debug;
use wayfarer_core::payload::{DomainFailure, WeatherPayload};
use wayfarer_core::query::Classification;
use wayfarer_services::open_meteo::weather_code_description;
use wayfarer_services::traits::{ForecastDay, WeatherApi};

/// Precipitation probability (percent) that warrants an umbrella.
const RAIN_ADVICE_THRESHOLD: u8 = 50;
/// Daily maximum at or below this is "dress warm" weather.
const COLD_ADVICE_THRESHOLD_C: f64 = 5.0;
/// Daily maximum at or above this is "water and a hat" weather.
const HEAT_ADVICE_THRESHOLD_C: f64 = 28.0;

pub struct WeatherAgent {
    api: Arc<dyn WeatherApi>,
}

impl WeatherAgent {
    pub fn new(api: Arc<dyn WeatherApi>) -> Self {
        Self { api }
    }

    pub async fn run(
        &self,
        classification: &Classification,
    ) -> Result<WeatherPayload, DomainFailure> {
        let place = classification.destination_label();
        if place.is_empty() {
            return Err(DomainFailure::collaborator(
                "no location to forecast; ask the user for a city or country",
            ));
        }

        let resolved = self
            .api
            .geocode(&place)
            .await
            .map_err(|e| DomainFailure::collaborator(e.to_string()))?
            .ok_or_else(|| {
                DomainFailure::collaborator(format!("location '{place}' not found"))
            })?;

        let forecast = self
            .api
            .forecast(resolved.coordinates)
            .await
            .map_err(|e| DomainFailure::collaborator(e.to_string()))?;

        let today = forecast.days.first().cloned().unwrap_or_default();
        let payload = WeatherPayload {
            place: resolved.label,
            description: today
                .code
                .map(weather_code_description)
                .unwrap_or_else(|| "no data".to_string()),
            date: today.date.clone(),
            temp_min_c: today.temp_min_c,
            temp_max_c: today.temp_max_c,
            current_temp_c: forecast.current.map(|c| c.temperature_c),
            wind_max_kmh: today.wind_max_kmh,
            precipitation_chance: today.precipitation_chance,
            advice: derive_advice(&today),
            source: "open-meteo".to_string(),
        };

        debug!(place = %payload.place, date = %payload.date, "Weather payload ready");
        Ok(payload)
    }
}

/// Packing advice from fixed thresholds on the day's numbers.
fn derive_advice(day: &ForecastDay) -> Vec<String> {
    let mut advice = Vec::new();
    if day.precipitation_chance.is_some_and(|p| p >= RAIN_ADVICE_THRESHOLD) {
        advice.push("Take an umbrella or a rain jacket.".to_string());
    }
    if day.temp_max_c.is_some_and(|t| t <= COLD_ADVICE_THRESHOLD_C) {
        advice.push("Dress warm; a windproof layer helps.".to_string());
    }
    if day.temp_max_c.is_some_and(|t| t >= HEAT_ADVICE_THRESHOLD_C) {
        advice.push("Carry water and wear a hat.".to_string());
    }
    advice
}
