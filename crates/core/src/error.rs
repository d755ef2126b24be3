//! Error types for the Wayfarer domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all Wayfarer operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Generative collaborator errors ---
    #[error("Generator error: {0}")]
    Generator(#[from] GeneratorError),

    // --- Retrieval errors ---
    #[error("Retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    // --- External REST service errors ---
    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    // --- Knowledge base errors ---
    #[error("Knowledge error: {0}")]
    Knowledge(#[from] KnowledgeError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Errors from the generative completion collaborator.
#[derive(Debug, Clone, Error)]
pub enum GeneratorError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by generator, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Output did not match the expected schema: {0}")]
    MalformedOutput(String),

    #[error("Generator not configured: {0}")]
    NotConfigured(String),
}

/// Errors from the retrieval engine and its corpus index.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("Failed to load corpus from {path}: {reason}")]
    CorpusLoad { path: String, reason: String },
}

/// Errors from the external REST collaborators (weather, geocoding, routing).
#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    #[error("{service} returned HTTP {status}")]
    Http { service: String, status: u16 },

    #[error("{service} network error: {reason}")]
    Network { service: String, reason: String },

    #[error("{service} request timed out")]
    Timeout { service: String },

    #[error("{service} response could not be interpreted: {reason}")]
    BadResponse { service: String, reason: String },
}

/// Errors from the alias/canonicalization table.
#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("Failed to read alias table at {path}: {reason}")]
    TableRead { path: String, reason: String },

    #[error("Failed to parse alias table at {path}: {reason}")]
    TableParse { path: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generator_error_displays_correctly() {
        let err = Error::Generator(GeneratorError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn service_error_displays_correctly() {
        let err = Error::Service(ServiceError::Http {
            service: "osrm".into(),
            status: 502,
        });
        assert!(err.to_string().contains("osrm"));
        assert!(err.to_string().contains("502"));
    }

    #[test]
    fn retrieval_error_carries_path() {
        let err = Error::Retrieval(RetrievalError::CorpusLoad {
            path: "/data/corpus.json".into(),
            reason: "no such file".into(),
        });
        assert!(err.to_string().contains("/data/corpus.json"));
    }
}
