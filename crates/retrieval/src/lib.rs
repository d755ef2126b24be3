//! Embedding-based retrieval over the legal corpus.
//!
//! The index is loaded once from a JSON file of chunks with precomputed
//! embeddings and served read-only. A retrieval narrows candidates by
//! canonical tag filter, drops everything below the relevance threshold,
//! then ranks with Maximal Marginal Relevance so near-duplicate chunks
//! don't crowd out distinct ones.

pub mod engine;
pub mod similarity;

pub use engine::{CorpusIndex, IndexedChunk, RetrievalParams};
pub use similarity::cosine_similarity;
