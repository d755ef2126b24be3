//! Generator trait — the abstraction over the generative completion
//! collaborator.
//!
//! The generator is a black box: prompt in, text out. Grounded domains pass
//! retrieved chunk texts inside the prompt; the core never lets the generator
//! act as a free-standing knowledge source for those domains. The same
//! collaborator exposes the embedding endpoint used for retrieval queries.

use crate::error::GeneratorError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// System instructions (role, schema, grounding rules).
    pub system: String,

    /// The user-facing content of the request.
    pub user: String,

    /// Temperature (0.0 = deterministic).
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

fn default_temperature() -> f32 {
    0.0
}

impl GenerationRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            temperature: default_temperature(),
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// A complete response from the generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// The generated text (plain text or a JSON document, per the prompt).
    pub content: String,

    /// Which model actually responded.
    pub model: String,
}

/// The generative completion collaborator.
///
/// Implementations: an OpenAI-compatible HTTP client in production, a
/// scripted mock in tests. Callers treat malformed output as a recoverable
/// error, never a crash.
#[async_trait]
pub trait Generator: Send + Sync {
    /// A human-readable name for this generator backend.
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> std::result::Result<GenerationResponse, GeneratorError>;

    /// Embed the given texts for retrieval.
    ///
    /// Default implementation reports the capability as unconfigured; the
    /// retrieval path maps that to an insufficient-data outcome rather than
    /// a hard failure.
    async fn embed(
        &self,
        _inputs: &[String],
    ) -> std::result::Result<Vec<Vec<f32>>, GeneratorError> {
        Err(GeneratorError::NotConfigured(format!(
            "Generator '{}' does not support embeddings",
            self.name()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TextOnly;

    #[async_trait]
    impl Generator for TextOnly {
        fn name(&self) -> &str {
            "text_only"
        }

        async fn generate(
            &self,
            request: GenerationRequest,
        ) -> std::result::Result<GenerationResponse, GeneratorError> {
            Ok(GenerationResponse {
                content: format!("echo: {}", request.user),
                model: "mock".into(),
            })
        }
    }

    #[tokio::test]
    async fn default_embed_is_not_configured() {
        let g = TextOnly;
        let err = g.embed(&["hello".into()]).await.unwrap_err();
        assert!(matches!(err, GeneratorError::NotConfigured(_)));
    }

    #[test]
    fn request_builder_defaults() {
        let req = GenerationRequest::new("system", "user");
        assert_eq!(req.temperature, 0.0);
        assert!(req.max_tokens.is_none());

        let req = req.with_temperature(0.7).with_max_tokens(1024);
        assert!((req.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(req.max_tokens, Some(1024));
    }
}
