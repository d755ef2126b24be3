//! Per-domain structured payloads and the dispatch outcome union.
//!
//! Each dispatched domain produces exactly one `DomainOutcome`: a tagged
//! payload on success or a failure marker. The assembler switches on the tag
//! exhaustively — no inheritance, no downcasting.

use crate::query::Domain;
use serde::{Deserialize, Serialize};

/// A point of interest suggested by the tourist agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,

    /// Why it is worth visiting.
    pub why: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_needed: Option<String>,

    /// Geocodable search string, "Name, City, Country".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    /// Map search link for the place, filled in after generation. Never
    /// requested from the generator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_url: Option<String>,
}

/// A food recommendation (market, street, district, venue type).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodSpot {
    pub name: String,
    pub why: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

/// Structured tourist-domain output. Not corpus-grounded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TourismPayload {
    /// "City, Country".
    #[serde(default)]
    pub destination_title: String,

    #[serde(default)]
    pub overview: String,

    #[serde(default)]
    pub history: String,

    #[serde(default)]
    pub highlights: Vec<Place>,

    #[serde(default)]
    pub food_spots: Vec<FoodSpot>,

    /// Morning/afternoon/evening one-day plan lines.
    #[serde(default)]
    pub day_plan: Vec<String>,

    #[serde(default)]
    pub etiquette: Vec<String>,

    #[serde(default)]
    pub tips: Vec<String>,
}

impl TourismPayload {
    /// Ordered place names for the route-by-waypoints contract.
    ///
    /// Prefers the day plan (stripping any "Morning:" style prefixes), falls
    /// back to the highlight list.
    pub fn waypoint_names(&self, max: usize) -> Vec<String> {
        let from_plan: Vec<String> = self
            .day_plan
            .iter()
            .filter_map(|line| {
                let cand = match line.split_once(':') {
                    Some((_, rest)) => rest.trim(),
                    None => line.trim(),
                };
                (!cand.is_empty()).then(|| cand.to_string())
            })
            .collect();

        let names = if from_plan.is_empty() {
            self.highlights.iter().map(|p| p.name.clone()).collect()
        } else {
            from_plan
        };
        names.into_iter().take(max).collect()
    }

    /// Geocodable query for a waypoint name, using the matching highlight's
    /// query when one exists.
    pub fn waypoint_query(&self, name: &str, destination: &str) -> String {
        if let Some(q) = self
            .highlights
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .and_then(|p| p.query.clone())
        {
            return q;
        }
        if destination.is_empty() {
            name.to_string()
        } else {
            format!("{name}, {destination}")
        }
    }
}

/// The topic bucket a grounded legal statement belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegalTopic {
    Visa,
    EntryAndRegistration,
    ProhibitionsAndFines,
    Recommendation,
}

impl LegalTopic {
    pub fn heading(&self) -> &'static str {
        match self {
            LegalTopic::Visa => "Visa",
            LegalTopic::EntryAndRegistration => "Entry and registration",
            LegalTopic::ProhibitionsAndFines => "Prohibitions and fines",
            LegalTopic::Recommendation => "Recommendations",
        }
    }
}

/// One asserted legal fact with its supporting chunk citations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundedStatement {
    pub topic: LegalTopic,
    pub text: String,

    /// Chunk ids from the producing retrieval. Never empty in a valid
    /// payload: a statement without support is dropped, not asserted.
    pub chunk_ids: Vec<String>,
}

/// Legal-domain output under the hard grounding policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LegalPayload {
    /// Facts textually supported by retrieved corpus chunks.
    Grounded {
        visa_required: Option<bool>,
        statements: Vec<GroundedStatement>,
        /// The retrieval's citable chunk ids, sorted.
        sources: Vec<String>,
    },

    /// The corpus held nothing sufficiently relevant. The agent must emit
    /// this marker instead of falling back to unguarded generative knowledge.
    InsufficientData { reason: String },
}

/// Weather-domain output, mapped from the forecast collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherPayload {
    /// Resolved place label.
    pub place: String,

    /// Human-readable conditions for the forecast day.
    pub description: String,

    /// ISO date the forecast covers.
    #[serde(default)]
    pub date: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_min_c: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_max_c: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_temp_c: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_max_kmh: Option<f64>,

    /// Max precipitation probability in percent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precipitation_chance: Option<u8>,

    /// Packing/clothing advice derived from thresholds, never generated.
    #[serde(default)]
    pub advice: Vec<String>,

    #[serde(default)]
    pub source: String,
}

/// How a route payload was requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RouteKind {
    /// Simple A → B directions.
    PointToPoint { start: String, end: String },

    /// Ordered tour over named places from the tourism payload.
    Waypoints { points: Vec<String> },
}

/// One turn-by-turn instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStep {
    pub instruction: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_m: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_s: Option<u32>,
}

/// Route-domain output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePayload {
    pub kind: RouteKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_min: Option<f64>,

    #[serde(default)]
    pub steps: Vec<RouteStep>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maps_url: Option<String>,

    /// Degradation notes (e.g. some waypoints could not be geocoded).
    #[serde(default)]
    pub notes: Vec<String>,

    #[serde(default)]
    pub source: String,
}

/// The tagged union of all domain payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "domain", rename_all = "lowercase")]
pub enum AgentPayload {
    Tourism(TourismPayload),
    Legal(LegalPayload),
    Weather(WeatherPayload),
    Route(RoutePayload),
}

impl AgentPayload {
    pub fn domain(&self) -> Domain {
        match self {
            AgentPayload::Tourism(_) => Domain::Tourism,
            AgentPayload::Legal(_) => Domain::Legal,
            AgentPayload::Weather(_) => Domain::Weather,
            AgentPayload::Route(_) => Domain::Route,
        }
    }
}

/// Why a domain task produced no payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The task exceeded its per-domain timeout.
    Timeout,

    /// An external collaborator (REST service, retrieval index) failed.
    Collaborator,

    /// The generator produced unusable output twice.
    MalformedOutput,
}

/// A per-domain failure marker. Absorbed at the task boundary, rendered as
/// an explicit "unavailable" note, never propagated as a hard error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainFailure {
    pub kind: FailureKind,
    pub detail: String,
}

impl DomainFailure {
    pub fn timeout(detail: impl Into<String>) -> Self {
        Self { kind: FailureKind::Timeout, detail: detail.into() }
    }

    pub fn collaborator(detail: impl Into<String>) -> Self {
        Self { kind: FailureKind::Collaborator, detail: detail.into() }
    }

    pub fn malformed(detail: impl Into<String>) -> Self {
        Self { kind: FailureKind::MalformedOutput, detail: detail.into() }
    }
}

/// What one dispatched domain ultimately produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DomainOutcome {
    Ready(AgentPayload),
    Failed(DomainFailure),
}

impl DomainOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, DomainOutcome::Failed(_))
    }
}
