//! Query, Domain, and IntentSet value objects.
//!
//! These are the types that flow from the chat-transport boundary into the
//! orchestrator: the user's raw question, the set of information domains it
//! needs, and the slots the classifier extracted from it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// An information domain a query may require.
///
/// The declaration order here is the fixed assembly precedence: tourism,
/// legal, weather, route. The assembler iterates [`Domain::ALL`] and never a
/// map's iteration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Tourism,
    Legal,
    Weather,
    Route,
}

impl Domain {
    /// All domains in assembly precedence order.
    pub const ALL: [Domain; 4] = [Domain::Tourism, Domain::Legal, Domain::Weather, Domain::Route];

    /// The stable wire tag for this domain.
    pub fn tag(&self) -> &'static str {
        match self {
            Domain::Tourism => "tourism",
            Domain::Legal => "legal",
            Domain::Weather => "weather",
            Domain::Route => "route",
        }
    }

    /// Parse a wire tag. Unknown tags yield `None`, never a default domain.
    pub fn from_tag(tag: &str) -> Option<Domain> {
        match tag.trim().to_lowercase().as_str() {
            "tourism" => Some(Domain::Tourism),
            "legal" => Some(Domain::Legal),
            "weather" => Some(Domain::Weather),
            "route" => Some(Domain::Route),
            _ => None,
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// The subset of domains a query needs.
///
/// An empty set is meaningful: it triggers the clarification path instead of
/// dispatch. The set iterates in precedence order regardless of insertion
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntentSet(BTreeSet<Domain>);

impl IntentSet {
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Build from wire tags, silently ignoring unknown ones. An entirely
    /// unrecognized list yields an empty set (clarification path).
    pub fn from_tags<S: AsRef<str>>(tags: &[S]) -> Self {
        Self(tags.iter().filter_map(|t| Domain::from_tag(t.as_ref())).collect())
    }

    pub fn insert(&mut self, domain: Domain) {
        self.0.insert(domain);
    }

    pub fn contains(&self, domain: Domain) -> bool {
        self.0.contains(&domain)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Domain> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Domain> for IntentSet {
    fn from_iter<I: IntoIterator<Item = Domain>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl std::fmt::Display for IntentSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tags: Vec<&str> = self.0.iter().map(|d| d.tag()).collect();
        write!(f, "{{{}}}", tags.join(","))
    }
}

/// Rough script detection for the raw query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    Latin,
    Cyrillic,
    Unknown,
}

/// A user query as received from the transport boundary.
///
/// Immutable once created: the orchestrator and agents only read it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    /// The raw user text.
    pub text: String,

    /// Detected script of the text.
    pub locale: Locale,

    /// Explicit location hint supplied by the transport (e.g. a shared pin).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_hint: Option<String>,
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let locale = detect_locale(&text);
        Self { text, locale, location_hint: None }
    }

    pub fn with_location_hint(mut self, hint: impl Into<String>) -> Self {
        self.location_hint = Some(hint.into());
        self
    }
}

fn detect_locale(text: &str) -> Locale {
    let mut latin = 0usize;
    let mut cyrillic = 0usize;
    for c in text.chars() {
        if c.is_ascii_alphabetic() {
            latin += 1;
        } else if ('\u{0400}'..='\u{04FF}').contains(&c) {
            cyrillic += 1;
        }
    }
    if latin == 0 && cyrillic == 0 {
        Locale::Unknown
    } else if cyrillic > latin {
        Locale::Cyrillic
    } else {
        Locale::Latin
    }
}

/// The classifier's parsed output: which domains the query needs plus the
/// slots extracted from the text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Classification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dates: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_location: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_location: Option<String>,

    #[serde(default)]
    pub needs: IntentSet,

    /// The question to forward to the agents (defaults to the raw text).
    #[serde(default)]
    pub user_question: String,
}

impl Classification {
    /// Fill unset slots from remembered session values. Fresh extraction
    /// always wins; session hints only fill gaps.
    pub fn merge_session_hints(
        &mut self,
        country: Option<&str>,
        city: Option<&str>,
        dates: Option<&str>,
    ) {
        if self.country.is_none() {
            self.country = country.map(str::to_string);
        }
        if self.city.is_none() {
            self.city = city.map(str::to_string);
        }
        if self.dates.is_none() {
            self.dates = dates.map(str::to_string);
        }
    }

    /// "City, Country" label for prompts and service calls.
    pub fn destination_label(&self) -> String {
        let parts: Vec<&str> = [self.city.as_deref(), self.country.as_deref()]
            .into_iter()
            .flatten()
            .collect();
        parts.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_tags_roundtrip() {
        for d in Domain::ALL {
            assert_eq!(Domain::from_tag(d.tag()), Some(d));
        }
        assert_eq!(Domain::from_tag("finance"), None);
    }

    #[test]
    fn intent_set_ignores_unknown_tags() {
        let set = IntentSet::from_tags(&["tourism", "finance", "weather"]);
        assert_eq!(set.len(), 2);
        assert!(set.contains(Domain::Tourism));
        assert!(set.contains(Domain::Weather));
    }

    #[test]
    fn intent_set_iterates_in_precedence_order() {
        let set = IntentSet::from_tags(&["route", "tourism", "legal"]);
        let order: Vec<Domain> = set.iter().collect();
        assert_eq!(order, vec![Domain::Tourism, Domain::Legal, Domain::Route]);
    }

    #[test]
    fn entirely_unknown_tags_yield_empty_set() {
        let set = IntentSet::from_tags(&["sports", "finance"]);
        assert!(set.is_empty());
    }

    #[test]
    fn locale_detection() {
        assert_eq!(Query::new("visa rules for Japan").locale, Locale::Latin);
        assert_eq!(Query::new("виза в Японию").locale, Locale::Cyrillic);
        assert_eq!(Query::new("42 !?").locale, Locale::Unknown);
    }

    #[test]
    fn session_hints_fill_gaps_only() {
        let mut c = Classification {
            city: Some("Kyoto".into()),
            ..Default::default()
        };
        c.merge_session_hints(Some("Japan"), Some("Tokyo"), Some("May 1-5"));
        assert_eq!(c.country.as_deref(), Some("Japan"));
        assert_eq!(c.city.as_deref(), Some("Kyoto")); // fresh extraction wins
        assert_eq!(c.dates.as_deref(), Some("May 1-5"));
    }

    #[test]
    fn destination_label_joins_present_parts() {
        let c = Classification {
            country: Some("Japan".into()),
            city: Some("Tokyo".into()),
            ..Default::default()
        };
        assert_eq!(c.destination_label(), "Tokyo, Japan");

        let only_country = Classification {
            country: Some("Japan".into()),
            ..Default::default()
        };
        assert_eq!(only_country.destination_label(), "Japan");
    }
}
