//! Tourist agent: structured destination guide via the generator.
//!
//! Tourism output is general travel knowledge and is not corpus-grounded,
//! unlike the legal domain.

use std::sync::Arc;
use tracing::{debug, warn};
use wayfarer_core::error::GeneratorError;
use wayfarer_core::generator::{GenerationRequest, Generator};
use wayfarer_core::payload::{DomainFailure, TourismPayload};
use wayfarer_core::query::Classification;
use wayfarer_services::maps;

use crate::json::generate_typed;

const TOURIST_SYSTEM: &str = "\
You are a travel guide producing a structured answer for a travel \
assistant. Respond with ONLY a JSON object with these fields: \
destination_title (\"City, Country\"), overview (3-6 sentences), \
history (3-6 sentences), highlights (7-10 places, each {name, why, \
time_needed, query} where query is \"Name, City, Country\"), food_spots \
(4-6 entries {name, why, query}: markets, streets, districts, venue \
types, no exact addresses), day_plan (5-7 morning/afternoon/evening \
lines using the highlight names), etiquette (short local-custom notes), \
tips (practical advice). Be concrete, skip filler, never invent exact \
prices or schedules. No JSON Schema, no prose around the object.";

const TOURIST_REPAIR: &str = "\
You fix output format. Return ONLY the JSON object with the tourism \
fields described before (destination_title, overview, history, \
highlights, food_spots, day_plan, etiquette, tips). Data values only.";

pub struct TouristAgent {
    generator: Arc<dyn Generator>,
    temperature: f32,
    max_tokens: u32,
}

impl TouristAgent {
    pub fn new(generator: Arc<dyn Generator>, temperature: f32, max_tokens: u32) -> Self {
        Self { generator, temperature, max_tokens }
    }

    pub async fn run(
        &self,
        classification: &Classification,
        summary: &str,
    ) -> Result<TourismPayload, DomainFailure> {
        let destination = classification.destination_label();
        let user = format!(
            "Destination: {}\nDates: {}\nTrip memory (may be empty): {}\nRequest: {}",
            if destination.is_empty() { "not specified" } else { destination.as_str() },
            classification.dates.as_deref().unwrap_or("not specified"),
            summary,
            classification.user_question,
        );
        let request = GenerationRequest::new(TOURIST_SYSTEM, user)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);

        let mut payload: TourismPayload =
            generate_typed(&self.generator, request, TOURIST_REPAIR)
                .await
                .map_err(map_failure)?;

        if payload.destination_title.trim().is_empty() {
            payload.destination_title =
                if destination.is_empty() { "Your trip".to_string() } else { destination };
        }
        attach_map_links(&mut payload);

        debug!(
            highlights = payload.highlights.len(),
            day_plan = payload.day_plan.len(),
            "Tourism payload ready"
        );
        Ok(payload)
    }
}

/// Give every highlight a map search link, from its geocodable query when
/// the generator supplied one and from "Name, Destination" otherwise.
fn attach_map_links(payload: &mut TourismPayload) {
    let destination = payload.destination_title.clone();
    for place in &mut payload.highlights {
        let query = place
            .query
            .clone()
            .unwrap_or_else(|| format!("{}, {}", place.name, destination));
        place.map_url = maps::search_url(&query);
    }
}

pub(crate) fn map_failure(error: GeneratorError) -> DomainFailure {
    match error {
        GeneratorError::MalformedOutput(reason) => {
            warn!(%reason, "Generator output unusable after retry");
            DomainFailure::malformed(reason)
        }
        GeneratorError::Timeout(reason) => DomainFailure::timeout(reason),
        other => DomainFailure::collaborator(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::SequentialMockGenerator;
    use wayfarer_core::payload::FailureKind;

    fn tokyo_classification() -> Classification {
        Classification {
            country: Some("Japan".into()),
            city: Some("Tokyo".into()),
            dates: Some("5 days".into()),
            user_question: "what should I see?".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn builds_payload_from_generator_json() {
        let generator: Arc<dyn Generator> = Arc::new(SequentialMockGenerator::single_text(
            r#"{"destination_title": "Tokyo, Japan",
                "overview": "A very large city.",
                "highlights": [{"name": "Senso-ji", "why": "oldest temple",
                                "query": "Senso-ji, Tokyo, Japan"}],
                "day_plan": ["Morning: Senso-ji"]}"#,
        ));
        let agent = TouristAgent::new(generator, 0.7, 1800);

        let payload = agent.run(&tokyo_classification(), "").await.unwrap();
        assert_eq!(payload.destination_title, "Tokyo, Japan");
        assert_eq!(payload.highlights.len(), 1);
        assert_eq!(payload.day_plan, vec!["Morning: Senso-ji"]);
    }

    #[tokio::test]
    async fn highlights_get_map_search_links() {
        let generator: Arc<dyn Generator> = Arc::new(SequentialMockGenerator::single_text(
            r#"{"destination_title": "Tokyo, Japan",
                "highlights": [
                    {"name": "Senso-ji", "why": "oldest temple",
                     "query": "Senso-ji Temple, Tokyo, Japan"},
                    {"name": "Meiji Shrine", "why": "forest shrine"}
                ]}"#,
        ));
        let agent = TouristAgent::new(generator, 0.7, 1800);

        let payload = agent.run(&tokyo_classification(), "").await.unwrap();
        let with_query = payload.highlights[0].map_url.as_deref().unwrap();
        assert!(with_query.starts_with("https://www.google.com/maps/search/"));
        assert!(with_query.contains("Senso-ji"));

        // Without a query, the link falls back to "Name, Destination".
        let without_query = payload.highlights[1].map_url.as_deref().unwrap();
        assert!(without_query.contains("Meiji"));
        assert!(without_query.contains("Tokyo"));
    }

    #[tokio::test]
    async fn missing_title_falls_back_to_destination() {
        let generator: Arc<dyn Generator> = Arc::new(SequentialMockGenerator::single_text(
            r#"{"overview": "Nice."}"#,
        ));
        let agent = TouristAgent::new(generator, 0.7, 1800);

        let payload = agent.run(&tokyo_classification(), "").await.unwrap();
        assert_eq!(payload.destination_title, "Tokyo, Japan");
    }

    #[tokio::test]
    async fn double_malformed_output_is_a_domain_failure() {
        let generator: Arc<dyn Generator> = Arc::new(SequentialMockGenerator::new(vec![
            Ok("prose".to_string()),
            Ok("still prose".to_string()),
        ]));
        let agent = TouristAgent::new(generator, 0.7, 1800);

        let failure = agent.run(&tokyo_classification(), "").await.unwrap_err();
        assert_eq!(failure.kind, FailureKind::MalformedOutput);
    }

    #[tokio::test]
    async fn generator_network_error_is_a_collaborator_failure() {
        let generator: Arc<dyn Generator> = Arc::new(SequentialMockGenerator::always_failing(
            GeneratorError::Network("connection refused".into()),
        ));
        let agent = TouristAgent::new(generator, 0.7, 1800);

        let failure = agent.run(&tokyo_classification(), "").await.unwrap_err();
        assert_eq!(failure.kind, FailureKind::Collaborator);
    }
}
