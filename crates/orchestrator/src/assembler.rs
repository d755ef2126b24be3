//! Deterministic response assembly.
//!
//! A pure function over the dispatch outcomes: fixed section order via
//! `Domain::ALL`, fixed wording, no generation. Identical input yields a
//! byte-identical response. A failed domain renders as an explicit
//! unavailability note under its own header.

use std::collections::BTreeMap;
use wayfarer_core::payload::{
    AgentPayload, DomainFailure, FailureKind, LegalPayload, LegalTopic, RoutePayload, RouteKind,
    TourismPayload, WeatherPayload,
};
use wayfarer_core::query::Domain;
use wayfarer_core::DomainOutcome;

const DIVIDER: &str = "────────";
const NO_DATA: &str = "• (no data)";

/// Assemble the final response text from per-domain outcomes.
///
/// Only the domains present in the map are rendered, in `Domain::ALL`
/// order regardless of how the map was built.
pub fn assemble(title: &str, outcomes: &BTreeMap<Domain, DomainOutcome>) -> String {
    let mut parts: Vec<String> = vec![title.to_string(), DIVIDER.to_string()];

    for domain in Domain::ALL {
        let Some(outcome) = outcomes.get(&domain) else { continue };
        match outcome {
            DomainOutcome::Ready(payload) => render_payload(&mut parts, payload),
            DomainOutcome::Failed(failure) => render_failure(&mut parts, domain, failure),
        }
        parts.push(String::new());
    }

    let joined: Vec<&str> = parts.iter().map(String::as_str).collect();
    joined.join("\n").trim_end().to_string()
}

fn render_payload(parts: &mut Vec<String>, payload: &AgentPayload) {
    match payload {
        AgentPayload::Tourism(t) => render_tourism(parts, t),
        AgentPayload::Legal(l) => render_legal(parts, l),
        AgentPayload::Weather(w) => render_weather(parts, w),
        AgentPayload::Route(r) => render_route(parts, r),
    }
}

fn domain_header(domain: Domain) -> &'static str {
    match domain {
        Domain::Tourism => "🧭 About the place",
        Domain::Legal => "⚖️ Visas and laws",
        Domain::Weather => "🌦️ Weather",
        Domain::Route => "🗺️ Route",
    }
}

fn render_failure(parts: &mut Vec<String>, domain: Domain, failure: &DomainFailure) {
    parts.push(domain_header(domain).to_string());
    let note = match failure.kind {
        FailureKind::Timeout => "the service did not answer in time",
        FailureKind::Collaborator => "an external service is unavailable",
        FailureKind::MalformedOutput => "the answer could not be prepared",
    };
    parts.push(format!("• Temporarily unavailable: {note}. Try again in a moment."));
}

fn bullets(parts: &mut Vec<String>, items: &[String]) {
    for item in items {
        if !item.is_empty() {
            parts.push(format!("• {item}"));
        }
    }
}

fn render_tourism(parts: &mut Vec<String>, t: &TourismPayload) {
    parts.push(domain_header(Domain::Tourism).to_string());
    if t.overview.is_empty() && t.history.is_empty() {
        parts.push(NO_DATA.to_string());
    } else {
        if !t.overview.is_empty() {
            parts.push(t.overview.clone());
        }
        if !t.history.is_empty() {
            parts.push("A bit of history".to_string());
            parts.push(t.history.clone());
        }
    }

    parts.push(String::new());
    parts.push("🏛️ What to see".to_string());
    if t.highlights.is_empty() {
        parts.push(NO_DATA.to_string());
    }
    for place in t.highlights.iter().take(10) {
        let mut line = format!("• {} — {}", place.name, place.why);
        if let Some(time) = &place.time_needed {
            line.push_str(&format!(" ({time})"));
        }
        if let Some(url) = &place.map_url {
            line.push_str(&format!("\n  🗺 {url}"));
        }
        parts.push(line);
    }

    if !t.food_spots.is_empty() {
        parts.push(String::new());
        parts.push("🍜 Where to eat".to_string());
        for spot in t.food_spots.iter().take(8) {
            parts.push(format!("• {} — {}", spot.name, spot.why));
        }
    }

    if !t.day_plan.is_empty() {
        parts.push(String::new());
        parts.push("🗓️ One-day plan".to_string());
        bullets(parts, &t.day_plan);
    }

    if !t.etiquette.is_empty() {
        parts.push(String::new());
        parts.push("🤝 Etiquette".to_string());
        bullets(parts, &t.etiquette);
    }

    if !t.tips.is_empty() {
        parts.push(String::new());
        parts.push("💡 Tips".to_string());
        bullets(parts, &t.tips);
    }
}

fn render_legal(parts: &mut Vec<String>, l: &LegalPayload) {
    parts.push(domain_header(Domain::Legal).to_string());
    match l {
        LegalPayload::InsufficientData { reason } => {
            parts.push(format!("⚠️ The local legal corpus cannot answer this: {reason}"));
        }
        LegalPayload::Grounded { visa_required, statements, sources } => {
            let verdict = match visa_required {
                Some(true) => "Visa: required",
                Some(false) => "Visa: not required",
                None => "Visa: no reliable answer in the corpus",
            };
            parts.push(verdict.to_string());

            for topic in [
                LegalTopic::Visa,
                LegalTopic::EntryAndRegistration,
                LegalTopic::ProhibitionsAndFines,
                LegalTopic::Recommendation,
            ] {
                let in_topic: Vec<&str> = statements
                    .iter()
                    .filter(|s| s.topic == topic)
                    .map(|s| s.text.as_str())
                    .collect();
                if in_topic.is_empty() {
                    continue;
                }
                parts.push(String::new());
                parts.push(topic.heading().to_string());
                for text in in_topic {
                    parts.push(format!("• {text}"));
                }
            }

            if !sources.is_empty() {
                parts.push(String::new());
                parts.push("Sources (local corpus)".to_string());
                bullets(parts, sources);
            }
        }
    }
}

fn render_weather(parts: &mut Vec<String>, w: &WeatherPayload) {
    parts.push(domain_header(Domain::Weather).to_string());
    if !w.place.is_empty() {
        parts.push(w.place.clone());
    }
    if w.date.is_empty() {
        parts.push(format!("Forecast: {}.", w.description));
    } else {
        parts.push(format!("Forecast for {}: {}.", w.date, w.description));
    }

    let mut details: Vec<String> = Vec::new();
    if let (Some(min), Some(max)) = (w.temp_min_c, w.temp_max_c) {
        details.push(format!("Temperature: {min:.0}°C to {max:.0}°C"));
    }
    if let Some(now) = w.current_temp_c {
        details.push(format!("Now: {now:.1}°C"));
    }
    if let Some(chance) = w.precipitation_chance {
        details.push(format!("Precipitation chance: {chance}%"));
    }
    if let Some(wind) = w.wind_max_kmh {
        details.push(format!("Max wind: {wind:.0} km/h"));
    }
    if !details.is_empty() {
        parts.push(details.join(" | "));
    }
    bullets(parts, &w.advice);
}

fn render_route(parts: &mut Vec<String>, r: &RoutePayload) {
    parts.push(domain_header(Domain::Route).to_string());
    match &r.kind {
        RouteKind::PointToPoint { start, end } => {
            parts.push(format!("{start} → {end}"));
        }
        RouteKind::Waypoints { points } => {
            parts.push("Tour stops".to_string());
            bullets(parts, points);
        }
    }

    let mut bits: Vec<String> = Vec::new();
    if let Some(km) = r.distance_km {
        bits.push(format!("{km:.1} km"));
    }
    if let Some(min) = r.duration_min {
        bits.push(format!("{min:.0} min"));
    }
    if !bits.is_empty() {
        parts.push(bits.join(" · "));
    }

    if !r.steps.is_empty() {
        parts.push("Steps".to_string());
        for step in r.steps.iter().take(12) {
            parts.push(format!("• {}", step.instruction));
        }
    }

    if let Some(url) = &r.maps_url {
        parts.push(format!("Map: {url}"));
    }
    bullets(parts, &r.notes);
}
