//! Generator backends for Wayfarer.
//!
//! The production backend is an OpenAI-compatible HTTP client; it works
//! with OpenAI, OpenRouter, Ollama, vLLM, and any endpoint exposing
//! `/chat/completions` and `/embeddings`.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatGenerator;
