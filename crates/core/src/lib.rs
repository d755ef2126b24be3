//! # Wayfarer Core
//!
//! Domain types, traits, and error definitions for the Wayfarer travel
//! assistant. This crate has **zero framework dependencies** — it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (the generative completion service, the REST
//! services, the knowledge base) is reachable only through a trait defined
//! here or in its owning crate. This enables:
//! - Swapping implementations via configuration
//! - Deterministic testing with scripted mock collaborators
//! - Clean dependency graph (all crates depend inward on core)

pub mod corpus;
pub mod error;
pub mod generator;
pub mod payload;
pub mod query;
pub mod session;

// Re-export key types at crate root for ergonomics
pub use corpus::{DocumentChunk, Filter, RetrievedResult, ScoredChunk};
pub use error::{Error, Result};
pub use generator::{GenerationRequest, GenerationResponse, Generator};
pub use payload::{AgentPayload, DomainFailure, DomainOutcome, FailureKind};
pub use query::{Classification, Domain, IntentSet, Locale, Query};
pub use session::{SessionId, Turn, TurnRole};
