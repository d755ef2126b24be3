//! Intent classification strategies.
//!
//! The orchestrator routes through a pluggable `IntentClassifier`. The
//! generative strategy extracts slots and needed domains as JSON; the rule
//! strategy is a deterministic keyword matcher for offline runs and tests.
//! Neither strategy ever guesses a default domain: an unclassifiable query
//! yields an error, which the orchestrator turns into the clarification
//! path.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;
use wayfarer_core::error::GeneratorError;
use wayfarer_core::generator::{GenerationRequest, Generator};
use wayfarer_core::query::{Classification, Domain, IntentSet, Query};

use crate::json::generate_typed;

#[async_trait]
pub trait IntentClassifier: Send + Sync {
    /// Classify a query into needed domains and extracted slots.
    ///
    /// `memory_hint` carries the session's rolling summary.
    async fn classify(
        &self,
        query: &Query,
        memory_hint: &str,
    ) -> Result<Classification, GeneratorError>;
}

const CLASSIFIER_SYSTEM: &str = "\
You orchestrate a travel assistant. From the user's message, \
(1) extract country, city, dates, and explicit route start/end points, \
(2) decide which domains the message needs. \
Domains may only be: tourism, legal, weather, route. \
Visas, laws, entry rules, fines: legal. Weather or forecast: weather. \
Directions, how to get somewhere, a sightseeing walking route, a day \
plan on the map: route. Sights, culture, food, general advice: tourism. \
A broad message may need several domains. \
Respond with ONLY a JSON object: \
{\"country\": string|null, \"city\": string|null, \"dates\": string|null, \
\"start_location\": string|null, \"end_location\": string|null, \
\"needs\": [string], \"user_question\": string}. \
No JSON Schema, no prose, no code fences.";

const CLASSIFIER_REPAIR: &str = "\
You fix output format. Return ONLY the JSON object described before: \
country, city, dates, start_location, end_location, needs, \
user_question. Data values only, no schema keys, no prose.";

/// Wire shape of the classifier answer. `needs` arrives as free tags so
/// unknown ones can be dropped instead of failing the parse.
#[derive(Debug, Deserialize)]
struct ClassifierAnswer {
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    dates: Option<String>,
    #[serde(default)]
    start_location: Option<String>,
    #[serde(default)]
    end_location: Option<String>,
    #[serde(default)]
    needs: Vec<String>,
    #[serde(default)]
    user_question: String,
}

/// Generator-backed classification with one repair retry.
pub struct GenerativeClassifier {
    generator: Arc<dyn Generator>,
}

impl GenerativeClassifier {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl IntentClassifier for GenerativeClassifier {
    async fn classify(
        &self,
        query: &Query,
        memory_hint: &str,
    ) -> Result<Classification, GeneratorError> {
        let mut user = format!("MEMORY: {memory_hint}\nMESSAGE: {}", query.text);
        if let Some(hint) = &query.location_hint {
            // Shared client location, weaker than anything the message
            // names but enough to resolve "here".
            user.push_str(&format!("\nUSER LOCATION (fallback only): {hint}"));
        }
        let request =
            GenerationRequest::new(CLASSIFIER_SYSTEM, user).with_max_tokens(650);

        let answer: ClassifierAnswer =
            generate_typed(&self.generator, request, CLASSIFIER_REPAIR).await?;

        let mut classification = Classification {
            country: answer.country.filter(|s| !s.trim().is_empty()),
            city: answer.city.filter(|s| !s.trim().is_empty()),
            dates: answer.dates.filter(|s| !s.trim().is_empty()),
            start_location: answer.start_location.filter(|s| !s.trim().is_empty()),
            end_location: answer.end_location.filter(|s| !s.trim().is_empty()),
            needs: IntentSet::from_tags(&answer.needs),
            user_question: answer.user_question,
        };
        if classification.user_question.trim().is_empty() {
            classification.user_question = query.text.clone();
        }

        debug!(needs = %classification.needs, "Generative classification");
        Ok(classification)
    }
}

/// Deterministic keyword classification. No slot extraction beyond the raw
/// question; used offline and in tests.
pub struct RuleClassifier;

const LEGAL_KEYWORDS: &[&str] =
    &["visa", "law", "legal", "rule", "fine", "customs", "виза", "закон", "штраф", "правил"];
const WEATHER_KEYWORDS: &[&str] = &["weather", "forecast", "rain", "temperature", "погод", "прогноз"];
const ROUTE_KEYWORDS: &[&str] =
    &["route", "how to get", "directions", "itinerary", "маршрут", "как добраться", "как доехать"];
const TOURISM_KEYWORDS: &[&str] = &[
    "sight", "attraction", "museum", "culture", "food", "visit", "see", "trip", "travel",
    "достопримечательност", "посмотреть", "поездк", "еда", "культур",
];

#[async_trait]
impl IntentClassifier for RuleClassifier {
    async fn classify(
        &self,
        query: &Query,
        _memory_hint: &str,
    ) -> Result<Classification, GeneratorError> {
        let text = query.text.to_lowercase();
        let mut needs = IntentSet::new();

        let rules: [(&[&str], Domain); 4] = [
            (LEGAL_KEYWORDS, Domain::Legal),
            (WEATHER_KEYWORDS, Domain::Weather),
            (ROUTE_KEYWORDS, Domain::Route),
            (TOURISM_KEYWORDS, Domain::Tourism),
        ];
        for (keywords, domain) in rules {
            if keywords.iter().any(|k| text.contains(k)) {
                needs.insert(domain);
            }
        }

        debug!(needs = %needs, "Rule classification");
        Ok(Classification { needs, user_question: query.text.clone(), ..Default::default() })
    }
}
