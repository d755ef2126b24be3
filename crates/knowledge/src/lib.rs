//! Alias/canonicalization table for countries and cities.
//!
//! Free-text location mentions ("Nippon", "Tokio") resolve to stable
//! canonical keys via exact alias match first, then a fuzzy edit-distance
//! fallback. Below the fuzzy threshold the lookup returns `None` — never a
//! guessed match. The table is loaded once and shared read-only at request
//! time.

pub mod fuzzy;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;
use wayfarer_core::Filter;
use wayfarer_core::error::KnowledgeError;

use fuzzy::{normalize, similarity};

/// Minimum normalized similarity for a fuzzy alias match.
const FUZZY_THRESHOLD: f32 = 0.72;

/// One country record in the alias table file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountryRecord {
    /// Display name.
    pub name: String,

    #[serde(default)]
    pub aliases: Vec<String>,

    /// Canonical city key → city record.
    #[serde(default)]
    pub cities: HashMap<String, CityRecord>,
}

/// One city record in the alias table file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityRecord {
    pub name: String,

    #[serde(default)]
    pub aliases: Vec<String>,
}

/// The loaded alias table with prebuilt lookup maps.
#[derive(Debug)]
pub struct KnowledgeBase {
    countries: HashMap<String, CountryRecord>,
    /// normalized alias → canonical country key
    country_aliases: HashMap<String, String>,
    /// normalized alias → (canonical country key, canonical city key)
    city_aliases: HashMap<String, (String, String)>,
}

impl KnowledgeBase {
    /// Build the lookup maps from country records.
    pub fn from_records(countries: HashMap<String, CountryRecord>) -> Self {
        let mut country_aliases = HashMap::new();
        let mut city_aliases = HashMap::new();

        for (country_key, record) in &countries {
            country_aliases.insert(normalize(country_key), country_key.clone());
            country_aliases.insert(normalize(&record.name), country_key.clone());
            for alias in &record.aliases {
                country_aliases.insert(normalize(alias), country_key.clone());
            }

            for (city_key, city) in &record.cities {
                let pair = (country_key.clone(), city_key.clone());
                city_aliases.insert(normalize(city_key), pair.clone());
                city_aliases.insert(normalize(&city.name), pair.clone());
                for alias in &city.aliases {
                    city_aliases.insert(normalize(alias), pair.clone());
                }
            }
        }

        debug!(
            countries = countries.len(),
            country_aliases = country_aliases.len(),
            city_aliases = city_aliases.len(),
            "Alias table built"
        );

        Self { countries, country_aliases, city_aliases }
    }

    /// Load the alias table from a JSON file.
    pub fn load(path: &Path) -> Result<Self, KnowledgeError> {
        let content = std::fs::read_to_string(path).map_err(|e| KnowledgeError::TableRead {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let countries: HashMap<String, CountryRecord> =
            serde_json::from_str(&content).map_err(|e| KnowledgeError::TableParse {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self::from_records(countries))
    }

    /// Resolve a free-text country mention to its canonical key.
    ///
    /// Exact alias match first, then fuzzy fallback above the threshold;
    /// otherwise `None`.
    pub fn find_country(&self, text: &str) -> Option<&str> {
        let norm = normalize(text);
        if norm.is_empty() {
            return None;
        }
        if let Some(key) = self.country_aliases.get(&norm) {
            return Some(key.as_str());
        }
        self.fuzzy_best(&norm, self.country_aliases.iter().map(|(a, k)| (a.as_str(), k.as_str())))
    }

    /// Resolve a free-text city mention anywhere in the table.
    ///
    /// Returns `(canonical country key, canonical city key)`.
    pub fn find_city(&self, text: &str) -> Option<(&str, &str)> {
        let norm = normalize(text);
        if norm.is_empty() {
            return None;
        }
        if let Some((country, city)) = self.city_aliases.get(&norm) {
            return Some((country.as_str(), city.as_str()));
        }

        let best = self.fuzzy_best(
            &norm,
            self.city_aliases.iter().map(|(a, _)| (a.as_str(), a.as_str())),
        )?;
        self.city_aliases.get(best).map(|(c, k)| (c.as_str(), k.as_str()))
    }

    /// Resolve a city mention restricted to one country.
    pub fn find_city_in(&self, country_key: &str, text: &str) -> Option<&str> {
        let (found_country, city) = self.find_city(text)?;
        (found_country == country_key).then_some(city)
    }

    /// Canonical display name for a country key.
    pub fn country_name(&self, key: &str) -> Option<&str> {
        self.countries.get(key).map(|r| r.name.as_str())
    }

    pub fn country_count(&self) -> usize {
        self.countries.len()
    }

    /// Derive a retrieval filter from free-text country / city mentions.
    ///
    /// The filter requires at least a resolvable country; a city that
    /// resolves within that country narrows it further. Unresolvable text
    /// yields `None` — retrieval then runs unfiltered rather than silently
    /// filtering on a guess.
    pub fn resolve_filter(&self, country: Option<&str>, city: Option<&str>) -> Option<Filter> {
        // A city mention alone can still pin the country.
        let country_key = match country.and_then(|c| self.find_country(c)) {
            Some(key) => key,
            None => city.and_then(|c| self.find_city(c)).map(|(country, _)| country)?,
        };

        let mut filter = Filter::country(country_key);
        if let Some(city_key) =
            city.and_then(|c| self.find_city_in(&filter.country.clone(), c))
        {
            filter = filter.with_city(city_key);
        }
        Some(filter)
    }

    /// Best fuzzy candidate above the threshold; ties prefer the longer
    /// alias (more specific match).
    fn fuzzy_best<'a>(
        &self,
        norm: &str,
        candidates: impl Iterator<Item = (&'a str, &'a str)>,
    ) -> Option<&'a str> {
        let mut best: Option<(&str, f32, usize)> = None;
        for (alias, value) in candidates {
            let score = similarity(norm, alias);
            if score < FUZZY_THRESHOLD {
                continue;
            }
            let better = match best {
                None => true,
                Some((_, best_score, best_len)) => {
                    score > best_score || (score == best_score && alias.len() > best_len)
                }
            };
            if better {
                best = Some((value, score, alias.len()));
            }
        }
        best.map(|(value, _, _)| value)
    }
}

/// A small built-in table for tests and offline runs.
pub fn builtin_table() -> KnowledgeBase {
    let json = include_str!("builtin_table.json");
    let countries: HashMap<String, CountryRecord> =
        serde_json::from_str(json).expect("builtin alias table is valid JSON");
    KnowledgeBase::from_records(countries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn exact_alias_resolves() {
        let kb = builtin_table();
        assert_eq!(kb.find_country("Japan"), Some("japan"));
        assert_eq!(kb.find_country("nippon"), Some("japan"));
        assert_eq!(kb.find_country("Япония"), Some("japan"));
    }

    #[test]
    fn synonyms_converge_to_one_canonical_key() {
        let kb = builtin_table();
        let a = kb.find_city("Tokyo");
        let b = kb.find_city("Tokio");
        assert_eq!(a, Some(("japan", "tokyo")));
        assert_eq!(a, b);
    }

    #[test]
    fn fuzzy_fallback_catches_typos() {
        let kb = builtin_table();
        assert_eq!(kb.find_country("Japn"), Some("japan"));
        assert_eq!(kb.find_city("Tokyoo"), Some(("japan", "tokyo")));
    }

    #[test]
    fn unresolvable_text_is_not_found() {
        let kb = builtin_table();
        assert_eq!(kb.find_country("Atlantis"), None);
        assert_eq!(kb.find_city("Xyzzyville"), None);
        assert_eq!(kb.find_country(""), None);
    }

    #[test]
    fn city_restricted_to_country() {
        let kb = builtin_table();
        assert_eq!(kb.find_city_in("japan", "Tokyo"), Some("tokyo"));
        assert_eq!(kb.find_city_in("france", "Tokyo"), None);
    }

    #[test]
    fn filter_resolution_country_and_city() {
        let kb = builtin_table();
        let f = kb.resolve_filter(Some("Japan"), Some("Tokio")).unwrap();
        assert_eq!(f.country, "japan");
        assert_eq!(f.city.as_deref(), Some("tokyo"));
    }

    #[test]
    fn filter_from_city_mention_alone() {
        let kb = builtin_table();
        let f = kb.resolve_filter(None, Some("Paris")).unwrap();
        assert_eq!(f.country, "france");
        assert_eq!(f.city.as_deref(), Some("paris"));
    }

    #[test]
    fn filter_unresolvable_yields_none() {
        let kb = builtin_table();
        assert!(kb.resolve_filter(Some("Atlantis"), None).is_none());
        assert!(kb.resolve_filter(None, None).is_none());
    }

    #[test]
    fn loads_table_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"iceland": {{"name": "Iceland", "aliases": ["is"], "cities": {{"reykjavik": {{"name": "Reykjavík", "aliases": []}}}}}}}}"#
        )
        .unwrap();

        let kb = KnowledgeBase::load(file.path()).unwrap();
        assert_eq!(kb.find_country("Iceland"), Some("iceland"));
        assert_eq!(kb.find_city("Reykjavík"), Some(("iceland", "reykjavik")));
    }

    #[test]
    fn load_missing_file_errors() {
        let err = KnowledgeBase::load(Path::new("/nonexistent/table.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/table.json"));
    }
}
