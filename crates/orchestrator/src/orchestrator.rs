//! The orchestrator: classify, fan out, join, assemble, remember.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{info, warn};
use wayfarer_agents::{IntentClassifier, LegalAgent, RouteAgent, TouristAgent, WeatherAgent};
use wayfarer_config::TimeoutConfig;
use wayfarer_core::payload::{AgentPayload, DomainFailure};
use wayfarer_core::query::{Classification, Domain, Query};
use wayfarer_core::session::{SessionId, Turn};
use wayfarer_core::DomainOutcome;

use crate::assembler::assemble;
use crate::session::SessionStore;

/// Sent when the query classifies into no domain at all.
pub const CLARIFICATION: &str = "I can help with sights and culture, visas and entry rules, \
weather, and routes. Tell me the destination and what you want to know.";

/// Sent when every dispatched domain failed.
pub const ALL_FAILED: &str = "None of my sources answered just now. Please try again in a moment.";

/// The assembled answer plus the structured outcomes it was built from.
#[derive(Debug, Clone)]
pub struct FinalResponse {
    pub text: String,
    pub outcomes: BTreeMap<Domain, DomainOutcome>,
}

pub struct Orchestrator {
    classifier: Arc<dyn IntentClassifier>,
    tourist: Arc<TouristAgent>,
    legal: Arc<LegalAgent>,
    weather: Arc<WeatherAgent>,
    route: Arc<RouteAgent>,
    sessions: Arc<SessionStore>,
    timeouts: TimeoutConfig,
}

impl Orchestrator {
    pub fn new(
        classifier: Arc<dyn IntentClassifier>,
        tourist: Arc<TouristAgent>,
        legal: Arc<LegalAgent>,
        weather: Arc<WeatherAgent>,
        route: Arc<RouteAgent>,
        sessions: Arc<SessionStore>,
        timeouts: TimeoutConfig,
    ) -> Self {
        Self { classifier, tourist, legal, weather, route, sessions, timeouts }
    }

    /// Handle one user query end to end.
    ///
    /// Never returns a hard error: classification failure and an empty
    /// intent set fall back to a clarification message, and an
    /// all-domains-failed dispatch to a single fallback line.
    pub async fn handle(&self, query: Query, session: &SessionId) -> FinalResponse {
        let snapshot = self.sessions.snapshot(session).await;

        let classification =
            match self.classifier.classify(&query, &snapshot.memory_hint()).await {
                Ok(c) => c,
                Err(e) => {
                    warn!(error = %e, "Classification failed, asking for clarification");
                    return self.finish(session, &query.text, CLARIFICATION, BTreeMap::new()).await;
                }
            };

        let mut classification = classification;
        classification.merge_session_hints(
            snapshot.country.as_deref(),
            snapshot.city.as_deref(),
            snapshot.dates.as_deref(),
        );
        self.sessions.remember_slots(session, &classification).await;

        if classification.needs.is_empty() {
            info!("Query classified into no domain");
            return self.finish(session, &query.text, CLARIFICATION, BTreeMap::new()).await;
        }

        info!(needs = %classification.needs, "Dispatching domains");
        let outcomes = self.dispatch(&classification, &snapshot.summary).await;

        let text = if outcomes.values().all(DomainOutcome::is_failed) {
            warn!("Every dispatched domain failed");
            ALL_FAILED.to_string()
        } else {
            assemble(&response_title(&classification, &outcomes), &outcomes)
        };

        self.finish(session, &query.text, &text, outcomes).await
    }

    /// Fan the needed domains out as tasks and join them into outcomes.
    ///
    /// Every task runs under its per-domain timeout. Route-by-waypoints is
    /// the one deliberate coupling: with no explicit endpoints the route
    /// task consumes the tourism payload's place list, so it waits on the
    /// tourism result; everything else is independent.
    pub async fn dispatch(
        &self,
        classification: &Classification,
        summary: &str,
    ) -> BTreeMap<Domain, DomainOutcome> {
        let needs = &classification.needs;
        let explicit_endpoints = classification.start_location.is_some()
            || classification.end_location.is_some();
        let waypoint_mode = needs.contains(Domain::Route) && !explicit_endpoints;
        let tourism_wanted = needs.contains(Domain::Tourism) || waypoint_mode;

        let tourism_handle = tourism_wanted.then(|| {
            let agent = Arc::clone(&self.tourist);
            let c = classification.clone();
            let summary = summary.to_string();
            let limit = self.timeouts.for_domain(Domain::Tourism);
            tokio::spawn(async move { bounded(limit, agent.run(&c, &summary)).await })
        });

        let legal_handle = needs.contains(Domain::Legal).then(|| {
            let agent = Arc::clone(&self.legal);
            let c = classification.clone();
            let limit = self.timeouts.for_domain(Domain::Legal);
            tokio::spawn(async move { bounded(limit, agent.run(&c)).await })
        });

        let weather_handle = needs.contains(Domain::Weather).then(|| {
            let agent = Arc::clone(&self.weather);
            let c = classification.clone();
            let limit = self.timeouts.for_domain(Domain::Weather);
            tokio::spawn(async move { bounded(limit, agent.run(&c)).await })
        });

        let point_to_point_handle = (needs.contains(Domain::Route) && explicit_endpoints)
            .then(|| {
                let agent = Arc::clone(&self.route);
                let start = classification
                    .start_location
                    .clone()
                    .unwrap_or_else(|| classification.destination_label());
                let end = classification
                    .end_location
                    .clone()
                    .unwrap_or_else(|| "city center".to_string());
                let limit = self.timeouts.for_domain(Domain::Route);
                tokio::spawn(
                    async move { bounded(limit, agent.point_to_point(&start, &end)).await },
                )
            });

        // The tourism result is joined first because the waypoint route
        // feeds on it.
        let tourism_result = match tourism_handle {
            Some(handle) => Some(join(handle).await),
            None => None,
        };

        let mut outcomes = BTreeMap::new();

        if needs.contains(Domain::Tourism) {
            // Present whenever tourism was wanted by the intent set itself.
            if let Some(result) = tourism_result.clone() {
                outcomes.insert(Domain::Tourism, to_outcome(result, AgentPayload::Tourism));
            }
        }

        if let Some(handle) = legal_handle {
            outcomes.insert(Domain::Legal, to_outcome(join(handle).await, AgentPayload::Legal));
        }

        if let Some(handle) = weather_handle {
            outcomes
                .insert(Domain::Weather, to_outcome(join(handle).await, AgentPayload::Weather));
        }

        if waypoint_mode {
            let outcome = match &tourism_result {
                Some(Ok(tourism)) => {
                    let limit = self.timeouts.for_domain(Domain::Route);
                    let destination = classification.destination_label();
                    to_outcome(
                        bounded(limit, self.route.waypoint_tour(tourism, &destination)).await,
                        AgentPayload::Route,
                    )
                }
                _ => DomainOutcome::Failed(DomainFailure::collaborator(
                    "no tourism suggestions to build a tour from",
                )),
            };
            outcomes.insert(Domain::Route, outcome);
        } else if let Some(handle) = point_to_point_handle {
            outcomes.insert(Domain::Route, to_outcome(join(handle).await, AgentPayload::Route));
        }

        outcomes
    }

    async fn finish(
        &self,
        session: &SessionId,
        user_text: &str,
        response_text: &str,
        outcomes: BTreeMap<Domain, DomainOutcome>,
    ) -> FinalResponse {
        self.sessions.append(session, Turn::user(user_text)).await;
        self.sessions.append(session, Turn::assistant(response_text)).await;
        FinalResponse { text: response_text.to_string(), outcomes }
    }
}

/// The response title: the tourism payload's own label when present,
/// otherwise the classified destination, otherwise a neutral fallback.
fn response_title(
    classification: &Classification,
    outcomes: &BTreeMap<Domain, DomainOutcome>,
) -> String {
    if let Some(DomainOutcome::Ready(AgentPayload::Tourism(t))) = outcomes.get(&Domain::Tourism) {
        if !t.destination_title.is_empty() {
            return t.destination_title.clone();
        }
    }
    let label = classification.destination_label();
    if label.is_empty() { "Your trip".to_string() } else { label }
}

async fn bounded<T>(
    limit: Duration,
    task: impl Future<Output = Result<T, DomainFailure>>,
) -> Result<T, DomainFailure> {
    match timeout(limit, task).await {
        Ok(result) => result,
        Err(_) => Err(DomainFailure::timeout(format!("exceeded {}ms", limit.as_millis()))),
    }
}

async fn join<T>(handle: JoinHandle<Result<T, DomainFailure>>) -> Result<T, DomainFailure> {
    match handle.await {
        Ok(result) => result,
        Err(e) => {
            warn!(error = %e, "Domain task aborted");
            Err(DomainFailure::collaborator("domain task aborted"))
        }
    }
}

fn to_outcome<P>(
    result: Result<P, DomainFailure>,
    wrap: impl FnOnce(P) -> AgentPayload,
) -> DomainOutcome {
    match result {
        Ok(payload) => DomainOutcome::Ready(wrap(payload)),
        Err(failure) => DomainOutcome::Failed(failure),
    }
}
