//! Nominatim geocoder for routing queries.
//!
//! Nominatim's usage policy requires an identifying User-Agent; answers
//! are cached for a week.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use wayfarer_core::error::ServiceError;

use crate::cache::TtlCache;
use crate::traits::{Coordinates, Geocoder, check_status, transport_error};

const SERVICE: &str = "nominatim";
const GEOCODE_TTL: Duration = Duration::from_secs(7 * 24 * 3600);

pub struct NominatimClient {
    base_url: String,
    client: reqwest::Client,
    cache: TtlCache<String, Option<Coordinates>>,
}

impl NominatimClient {
    pub fn new(base_url: impl Into<String>, user_agent: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .user_agent(user_agent)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            cache: TtlCache::new(GEOCODE_TTL),
        }
    }
}

#[async_trait]
impl Geocoder for NominatimClient {
    async fn geocode(&self, query: &str) -> Result<Option<Coordinates>, ServiceError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(None);
        }

        let cache_key = query.to_lowercase();
        if let Some(cached) = self.cache.get(&cache_key).await {
            return Ok(cached);
        }

        let url = format!("{}/search", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("q", query), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        let response = check_status(SERVICE, response)?;

        let results: Vec<SearchResult> = response
            .json()
            .await
            .map_err(|e| ServiceError::BadResponse {
                service: SERVICE.to_string(),
                reason: e.to_string(),
            })?;

        // Nominatim returns lat/lon as strings.
        let found = results.into_iter().next().and_then(|r| {
            let lat = r.lat.parse::<f64>().ok()?;
            let lon = r.lon.parse::<f64>().ok()?;
            Some(Coordinates::new(lat, lon))
        });

        debug!(query, found = found.is_some(), "Nominatim geocode");
        self.cache.insert(cache_key, found).await;
        Ok(found)
    }
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    lat: String,
    lon: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_result_parses_string_coordinates() {
        let json = r#"[{"lat": "35.6812", "lon": "139.7671", "display_name": "Tokyo Station"}]"#;
        let results: Vec<SearchResult> = serde_json::from_str(json).unwrap();
        assert_eq!(results[0].lat.parse::<f64>().unwrap(), 35.6812);
    }

    #[test]
    fn empty_answer_deserializes() {
        let results: Vec<SearchResult> = serde_json::from_str("[]").unwrap();
        assert!(results.is_empty());
    }
}
