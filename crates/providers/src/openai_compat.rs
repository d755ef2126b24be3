//! OpenAI-compatible generator implementation.
//!
//! Works with: OpenAI, OpenRouter, Ollama, vLLM, Together AI, Fireworks AI,
//! and any endpoint exposing `/chat/completions` and `/embeddings`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use wayfarer_config::GeneratorConfig;
use wayfarer_core::error::GeneratorError;
use wayfarer_core::generator::{GenerationRequest, GenerationResponse, Generator};

/// An OpenAI-compatible generator.
///
/// This covers the vast majority of hosted and local model servers since
/// most expose an OpenAI-compatible `/v1/chat/completions` endpoint.
pub struct OpenAiCompatGenerator {
    name: String,
    base_url: String,
    api_key: String,
    model: String,
    embedding_model: String,
    client: reqwest::Client,
}

impl OpenAiCompatGenerator {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        embedding_model: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            embedding_model: embedding_model.into(),
            client,
        }
    }

    /// Build a generator from configuration. Fails when no API key is set.
    pub fn from_config(config: &GeneratorConfig) -> Result<Self, GeneratorError> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            GeneratorError::NotConfigured(
                "no API key set; export WAYFARER_API_KEY or add it to the config file".into(),
            )
        })?;
        Ok(Self::new(
            "openai_compat",
            config.api_url.as_str(),
            api_key,
            config.model.as_str(),
            config.embedding_model.as_str(),
        ))
    }

    /// Create an Ollama generator (convenience constructor). Ollama does not
    /// need a real key.
    pub fn ollama(base_url: Option<&str>, model: impl Into<String>) -> Self {
        Self::new(
            "ollama",
            base_url.unwrap_or("http://localhost:11434/v1"),
            "ollama",
            model,
            "nomic-embed-text",
        )
    }

    fn map_transport(e: reqwest::Error) -> GeneratorError {
        if e.is_timeout() {
            GeneratorError::Timeout(e.to_string())
        } else {
            GeneratorError::Network(e.to_string())
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, GeneratorError> {
        let status = response.status().as_u16();

        if status == 429 {
            let retry_after_secs = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(5);
            return Err(GeneratorError::RateLimited { retry_after_secs });
        }

        if status == 401 || status == 403 {
            return Err(GeneratorError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Generator endpoint returned error");
            return Err(GeneratorError::ApiError { status_code: status, message: error_body });
        }

        Ok(response)
    }
}

#[async_trait]
impl Generator for OpenAiCompatGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, GeneratorError> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.user },
            ],
            "temperature": request.temperature,
            "stream": false,
        });

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        debug!(generator = %self.name, model = %self.model, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(Self::map_transport)?;

        let response = Self::check_status(response).await?;

        let api_response: ChatResponse =
            response.json().await.map_err(|e| GeneratorError::ApiError {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            })?;

        let choice = api_response.choices.into_iter().next().ok_or_else(|| {
            GeneratorError::ApiError {
                status_code: 200,
                message: "No choices in response".into(),
            }
        })?;

        Ok(GenerationResponse {
            content: choice.message.content.unwrap_or_default(),
            model: api_response.model,
        })
    }

    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, GeneratorError> {
        let url = format!("{}/embeddings", self.base_url);

        let body = serde_json::json!({
            "model": self.embedding_model,
            "input": inputs,
        });

        debug!(generator = %self.name, model = %self.embedding_model, count = inputs.len(),
            "Sending embedding request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(Self::map_transport)?;

        let response = Self::check_status(response).await?;

        let api_response: EmbeddingsResponse =
            response.json().await.map_err(|e| GeneratorError::ApiError {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            })?;

        // The API may reorder entries; the index field restores input order.
        let mut data = api_response.data;
        data.sort_by_key(|d| d.index);
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

// --- Wire types ---

#[derive(Debug, Deserialize)]
struct ChatResponse {
    model: String,
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingEntry>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingEntry {
    index: usize,
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_stripped() {
        let g = OpenAiCompatGenerator::new(
            "test",
            "https://api.example.com/v1/",
            "key",
            "model-a",
            "embed-a",
        );
        assert_eq!(g.base_url, "https://api.example.com/v1");
    }

    #[test]
    fn from_config_requires_api_key() {
        let config = GeneratorConfig::default();
        let err = OpenAiCompatGenerator::from_config(&config).err();
        assert!(matches!(err, Some(GeneratorError::NotConfigured(_))));
    }

    #[test]
    fn chat_response_parses_with_null_content() {
        let raw = r#"{"model": "model-a", "choices": [{"message": {"content": null}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).expect("parse");
        assert_eq!(parsed.choices[0].message.content, None);
    }

    #[test]
    fn embedding_entries_restore_input_order() {
        let raw = r#"{"data": [
            {"index": 1, "embedding": [1.0]},
            {"index": 0, "embedding": [0.0]}
        ]}"#;
        let parsed: EmbeddingsResponse = serde_json::from_str(raw).expect("parse");
        let mut data = parsed.data;
        data.sort_by_key(|d| d.index);
        assert_eq!(data[0].embedding, vec![0.0]);
        assert_eq!(data[1].embedding, vec![1.0]);
    }
}
