//! Configuration loading, validation, and management for Wayfarer.
//!
//! Loads configuration from `~/.wayfarer/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.wayfarer/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Generative collaborator settings
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// Retrieval engine tunables
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Per-domain dispatch timeouts
    #[serde(default)]
    pub timeouts: TimeoutConfig,

    /// Session memory bounds
    #[serde(default)]
    pub session: SessionConfig,

    /// External REST collaborator endpoints
    #[serde(default)]
    pub services: ServicesConfig,

    /// Collaborator-owned data paths (corpus chunk store, alias table)
    #[serde(default)]
    pub data: DataConfig,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("generator", &self.generator)
            .field("retrieval", &self.retrieval)
            .field("timeouts", &self.timeouts)
            .field("session", &self.session)
            .field("services", &self.services)
            .field("data", &self.data)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// API key for the completion endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// OpenAI-compatible base URL
    #[serde(default = "default_generator_url")]
    pub api_url: String,

    /// Completion model
    #[serde(default = "default_model")]
    pub model: String,

    /// Embedding model (used for retrieval queries)
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Temperature for content drafting (classification always runs at 0.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Max tokens per completion
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_generator_url() -> String {
    "https://openrouter.ai/api/v1".into()
}
fn default_model() -> String {
    "anthropic/claude-sonnet-4".into()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    1800
}

impl std::fmt::Debug for GeneratorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("embedding_model", &self.embedding_model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_generator_url(),
            model: default_model(),
            embedding_model: default_embedding_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Retrieval engine tunables. Callers pass these per retrieval call; they are
/// configuration inputs, never hardcoded in the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of chunks the MMR selection keeps
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Candidate pool size before MMR selection
    #[serde(default = "default_fetch_k")]
    pub fetch_k: usize,

    /// MMR balance: 1.0 = pure relevance, 0.0 = pure diversity
    #[serde(default = "default_diversity_lambda")]
    pub diversity_lambda: f32,

    /// Relevance floor: candidates below this never enter selection
    #[serde(default = "default_min_score")]
    pub min_score: f32,
}

fn default_top_k() -> usize {
    6
}
fn default_fetch_k() -> usize {
    20
}
fn default_diversity_lambda() -> f32 {
    0.7
}
fn default_min_score() -> f32 {
    0.25
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            fetch_k: default_fetch_k(),
            diversity_lambda: default_diversity_lambda(),
            min_score: default_min_score(),
        }
    }
}

/// Per-domain dispatch timeouts in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_tourism_ms")]
    pub tourism_ms: u64,

    #[serde(default = "default_legal_ms")]
    pub legal_ms: u64,

    #[serde(default = "default_weather_ms")]
    pub weather_ms: u64,

    #[serde(default = "default_route_ms")]
    pub route_ms: u64,
}

fn default_tourism_ms() -> u64 {
    20_000
}
fn default_legal_ms() -> u64 {
    20_000
}
fn default_weather_ms() -> u64 {
    10_000
}
fn default_route_ms() -> u64 {
    15_000
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            tourism_ms: default_tourism_ms(),
            legal_ms: default_legal_ms(),
            weather_ms: default_weather_ms(),
            route_ms: default_route_ms(),
        }
    }
}

impl TimeoutConfig {
    pub fn for_domain(&self, domain: wayfarer_core::Domain) -> std::time::Duration {
        use wayfarer_core::Domain;
        let ms = match domain {
            Domain::Tourism => self.tourism_ms,
            Domain::Legal => self.legal_ms,
            Domain::Weather => self.weather_ms,
            Domain::Route => self.route_ms,
        };
        std::time::Duration::from_millis(ms)
    }
}

/// Session memory bounds and eviction policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Turns kept verbatim; older turns fold into the rolling summary
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,

    /// Idle minutes before a session is evicted
    #[serde(default = "default_ttl_minutes")]
    pub ttl_minutes: u64,

    /// Hard cap on concurrently tracked sessions
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

fn default_max_turns() -> usize {
    12
}
fn default_ttl_minutes() -> u64 {
    120
}
fn default_max_sessions() -> usize {
    5000
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            ttl_minutes: default_ttl_minutes(),
            max_sessions: default_max_sessions(),
        }
    }
}

/// Base URLs for the external REST collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicesConfig {
    #[serde(default = "default_open_meteo_url")]
    pub open_meteo_url: String,

    #[serde(default = "default_open_meteo_geocoding_url")]
    pub open_meteo_geocoding_url: String,

    #[serde(default = "default_nominatim_url")]
    pub nominatim_url: String,

    #[serde(default = "default_osrm_url")]
    pub osrm_url: String,

    /// User-Agent sent to Nominatim (required by its usage policy)
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_open_meteo_url() -> String {
    "https://api.open-meteo.com/v1".into()
}
fn default_open_meteo_geocoding_url() -> String {
    "https://geocoding-api.open-meteo.com/v1".into()
}
fn default_nominatim_url() -> String {
    "https://nominatim.openstreetmap.org".into()
}
fn default_osrm_url() -> String {
    "https://router.project-osrm.org".into()
}
fn default_user_agent() -> String {
    "wayfarer/0.1".into()
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            open_meteo_url: default_open_meteo_url(),
            open_meteo_geocoding_url: default_open_meteo_geocoding_url(),
            nominatim_url: default_nominatim_url(),
            osrm_url: default_osrm_url(),
            user_agent: default_user_agent(),
        }
    }
}

/// Paths to collaborator-owned persisted state, consumed read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Legal corpus chunk store (JSON, with precomputed embeddings)
    #[serde(default = "default_corpus_path")]
    pub corpus_path: String,

    /// Country/city alias table (JSON)
    #[serde(default = "default_alias_table_path")]
    pub alias_table_path: String,
}

fn default_corpus_path() -> String {
    "data/legal_corpus.json".into()
}
fn default_alias_table_path() -> String {
    "data/alias_table.json".into()
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            corpus_path: default_corpus_path(),
            alias_table_path: default_alias_table_path(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.wayfarer/config.toml).
    ///
    /// Also checks environment variables for the API key:
    /// - `WAYFARER_API_KEY` (highest priority)
    /// - `OPENROUTER_API_KEY`
    /// - `OPENAI_API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if config.generator.api_key.is_none() {
            config.generator.api_key = std::env::var("WAYFARER_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENROUTER_API_KEY").ok())
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(model) = std::env::var("WAYFARER_MODEL") {
            config.generator.model = model;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".wayfarer")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.retrieval.diversity_lambda) {
            return Err(ConfigError::ValidationError(
                "retrieval.diversity_lambda must be between 0.0 and 1.0".into(),
            ));
        }

        if !(-1.0..=1.0).contains(&self.retrieval.min_score) {
            return Err(ConfigError::ValidationError(
                "retrieval.min_score must be a cosine similarity in [-1.0, 1.0]".into(),
            ));
        }

        if self.retrieval.top_k == 0 {
            return Err(ConfigError::ValidationError("retrieval.top_k must be at least 1".into()));
        }

        if self.retrieval.fetch_k < self.retrieval.top_k {
            return Err(ConfigError::ValidationError(
                "retrieval.fetch_k must be >= retrieval.top_k".into(),
            ));
        }

        if !(0.0..=2.0).contains(&self.generator.temperature) {
            return Err(ConfigError::ValidationError(
                "generator.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.session.max_turns == 0 {
            return Err(ConfigError::ValidationError("session.max_turns must be at least 1".into()));
        }

        Ok(())
    }

    /// Check if a generator API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.generator.api_key.is_some()
    }

    /// Generate a default config TOML string (for onboarding).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            generator: GeneratorConfig::default(),
            retrieval: RetrievalConfig::default(),
            timeouts: TimeoutConfig::default(),
            session: SessionConfig::default(),
            services: ServicesConfig::default(),
            data: DataConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.retrieval.top_k, 6);
        assert!((config.retrieval.diversity_lambda - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.retrieval.fetch_k, config.retrieval.fetch_k);
        assert_eq!(parsed.services.osrm_url, config.services.osrm_url);
    }

    #[test]
    fn invalid_lambda_rejected() {
        let config = AppConfig {
            retrieval: RetrievalConfig { diversity_lambda: 1.5, ..Default::default() },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn fetch_k_below_top_k_rejected() {
        let config = AppConfig {
            retrieval: RetrievalConfig { top_k: 10, fetch_k: 5, ..Default::default() },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.timeouts.weather_ms, 10_000);
    }

    #[test]
    fn partial_config_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[retrieval]\ntop_k = 4\n\n[timeouts]\nweather_ms = 5000\n"
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.retrieval.top_k, 4);
        assert_eq!(config.timeouts.weather_ms, 5000);
        // untouched sections keep defaults
        assert_eq!(config.retrieval.fetch_k, 20);
        assert_eq!(config.session.max_turns, 12);
    }

    #[test]
    fn timeout_lookup_per_domain() {
        use wayfarer_core::Domain;
        let t = TimeoutConfig::default();
        assert_eq!(t.for_domain(Domain::Weather).as_millis(), 10_000);
        assert_eq!(t.for_domain(Domain::Tourism).as_millis(), 20_000);
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = AppConfig {
            generator: GeneratorConfig {
                api_key: Some("sk-secret-key".into()),
                ..Default::default()
            },
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret-key"));
        assert!(debug.contains("[REDACTED]"));
    }
}
