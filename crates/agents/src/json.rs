//! Tolerant JSON extraction from generator output.
//!
//! Generators wrap JSON in code fences or prose often enough that a strict
//! `from_str` on the raw content loses usable answers. The extractor takes
//! the span from the first `{` to the last `}` and parses that.

use serde::de::DeserializeOwned;
use std::sync::Arc;
use wayfarer_core::error::GeneratorError;
use wayfarer_core::generator::{GenerationRequest, Generator};

/// The JSON object span inside possibly-decorated generator output.
pub fn extract_json(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    (end > start).then(|| &content[start..=end])
}

/// Parse a typed value out of generator output.
pub fn parse_response<T: DeserializeOwned>(content: &str) -> Result<T, GeneratorError> {
    let span = extract_json(content)
        .ok_or_else(|| GeneratorError::MalformedOutput("no JSON object in output".to_string()))?;
    serde_json::from_str(span).map_err(|e| GeneratorError::MalformedOutput(e.to_string()))
}

/// Request a typed JSON value from the generator, with one stricter retry
/// on malformed output.
///
/// A transport-level generator error is returned as-is; only parse
/// failures trigger the retry.
pub async fn generate_typed<T: DeserializeOwned>(
    generator: &Arc<dyn Generator>,
    request: GenerationRequest,
    repair_system: &str,
) -> Result<T, GeneratorError> {
    let first = generator.generate(request.clone()).await?;
    match parse_response::<T>(&first.content) {
        Ok(value) => Ok(value),
        Err(GeneratorError::MalformedOutput(reason)) => {
            tracing::debug!(%reason, "Malformed generator JSON, retrying with repair prompt");
            let retry = GenerationRequest {
                system: repair_system.to_string(),
                user: request.user,
                temperature: 0.0,
                max_tokens: request.max_tokens,
            };
            let second = generator.generate(retry).await?;
            parse_response::<T>(&second.content)
        }
        Err(other) => Err(other),
    }
}
