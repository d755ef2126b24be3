//! Legal corpus value objects: chunks, filters, and retrieval results.
//!
//! The corpus itself is built and persisted by an external collaborator; the
//! core only consumes it read-only. A chunk is the atomic retrieval unit.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A tagged, indexed unit of the legal corpus.
///
/// Immutable after corpus build. Country and city tags are canonical keys
/// produced by the knowledge base at build time, so filter matching is exact
/// string equality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Stable chunk id, cited by grounded legal statements.
    pub id: String,

    /// The text span.
    pub text: String,

    /// Canonical country key.
    pub country: String,

    /// Canonical city key, when the chunk is city-specific.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    /// Section label (e.g. "visa", "customs", "fines").
    pub section: String,
}

/// A canonical tag constraint attached to a retrieval request.
///
/// A filter narrows the candidate set before ranking; it never re-ranks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub country: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

impl Filter {
    pub fn country(country: impl Into<String>) -> Self {
        Self { country: country.into(), city: None, section: None }
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    /// Exact canonical tag match. Unset fields do not constrain. A city
    /// filter still admits country-wide chunks (city tag unset): visa and
    /// entry rules are written per country and must stay retrievable for
    /// any city in it.
    pub fn matches(&self, chunk: &DocumentChunk) -> bool {
        if chunk.country != self.country {
            return false;
        }
        if let (Some(city), Some(chunk_city)) = (&self.city, chunk.city.as_deref()) {
            if chunk_city != city.as_str() {
                return false;
            }
        }
        if let Some(section) = &self.section {
            if &chunk.section != section {
                return false;
            }
        }
        true
    }
}

/// A chunk paired with its relevance score for one retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: DocumentChunk,
    pub score: f32,
}

/// The ordered outcome of one retrieval call.
///
/// An empty result is valid and meaningful: "nothing sufficiently relevant".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrievedResult {
    pub hits: Vec<ScoredChunk>,
}

impl RetrievedResult {
    pub fn empty() -> Self {
        Self { hits: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScoredChunk> {
        self.hits.iter()
    }

    /// Whether the given chunk id was returned by this retrieval.
    pub fn contains_id(&self, id: &str) -> bool {
        self.hits.iter().any(|h| h.chunk.id == id)
    }

    /// Distinct chunk ids, sorted — the citable source set.
    pub fn source_ids(&self) -> Vec<String> {
        let ids: BTreeSet<String> = self.hits.iter().map(|h| h.chunk.id.clone()).collect();
        ids.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str, country: &str, city: Option<&str>, section: &str) -> DocumentChunk {
        DocumentChunk {
            id: id.into(),
            text: format!("text for {id}"),
            country: country.into(),
            city: city.map(str::to_string),
            section: section.into(),
        }
    }

    #[test]
    fn filter_matches_country_exactly() {
        let f = Filter::country("japan");
        assert!(f.matches(&chunk("a", "japan", None, "visa")));
        assert!(!f.matches(&chunk("b", "france", None, "visa")));
    }

    #[test]
    fn filter_city_constrains_only_when_set() {
        let country_only = Filter::country("japan");
        assert!(country_only.matches(&chunk("a", "japan", Some("tokyo"), "visa")));

        let with_city = Filter::country("japan").with_city("tokyo");
        assert!(with_city.matches(&chunk("a", "japan", Some("tokyo"), "visa")));
        assert!(!with_city.matches(&chunk("b", "japan", Some("osaka"), "visa")));
        // Country-wide chunks apply to every city in the country.
        assert!(with_city.matches(&chunk("c", "japan", None, "visa")));
    }

    #[test]
    fn filter_section_constrains_when_set() {
        let f = Filter::country("japan").with_section("fines");
        assert!(f.matches(&chunk("a", "japan", None, "fines")));
        assert!(!f.matches(&chunk("b", "japan", None, "visa")));
    }

    #[test]
    fn retrieved_result_source_ids_sorted_and_distinct() {
        let result = RetrievedResult {
            hits: vec![
                ScoredChunk { chunk: chunk("jp-02", "japan", None, "visa"), score: 0.9 },
                ScoredChunk { chunk: chunk("jp-01", "japan", None, "fines"), score: 0.8 },
                ScoredChunk { chunk: chunk("jp-02", "japan", None, "visa"), score: 0.7 },
            ],
        };
        assert_eq!(result.source_ids(), vec!["jp-01".to_string(), "jp-02".to_string()]);
        assert!(result.contains_id("jp-01"));
        assert!(!result.contains_id("fr-01"));
    }

    #[test]
    fn empty_result_is_meaningful() {
        let result = RetrievedResult::empty();
        assert!(result.is_empty());
        assert!(result.source_ids().is_empty());
    }
}
