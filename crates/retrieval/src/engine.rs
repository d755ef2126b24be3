//! The corpus index and MMR-ranked retrieval.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;
use wayfarer_core::error::RetrievalError;
use wayfarer_core::{DocumentChunk, Filter, RetrievedResult, ScoredChunk};

use crate::similarity::cosine_similarity;

/// A corpus chunk paired with its precomputed embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedChunk {
    #[serde(flatten)]
    pub chunk: DocumentChunk,
    pub embedding: Vec<f32>,
}

/// Tuning knobs for one retrieval call.
#[derive(Debug, Clone, Copy)]
pub struct RetrievalParams {
    /// Final result size.
    pub top_k: usize,

    /// Candidate pool size fed into MMR ranking.
    pub fetch_k: usize,

    /// MMR trade-off: 1.0 = pure relevance, 0.0 = pure diversity.
    pub diversity_lambda: f32,

    /// Candidates scoring below this cosine similarity are dropped before
    /// ranking. An all-below-threshold retrieval returns empty, not the
    /// least-bad chunks.
    pub min_score: f32,
}

impl Default for RetrievalParams {
    fn default() -> Self {
        Self { top_k: 6, fetch_k: 20, diversity_lambda: 0.7, min_score: 0.25 }
    }
}

/// The in-memory legal corpus index, loaded once and served read-only.
#[derive(Debug)]
pub struct CorpusIndex {
    entries: Vec<IndexedChunk>,
}

impl CorpusIndex {
    pub fn from_entries(entries: Vec<IndexedChunk>) -> Self {
        Self { entries }
    }

    /// Load the index from a JSON array of chunks with embeddings.
    pub fn load(path: &Path) -> Result<Self, RetrievalError> {
        let content = std::fs::read_to_string(path).map_err(|e| RetrievalError::CorpusLoad {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let entries: Vec<IndexedChunk> =
            serde_json::from_str(&content).map_err(|e| RetrievalError::CorpusLoad {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        debug!(path = %path.display(), chunks = entries.len(), "Corpus index loaded");
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Retrieve the chunks most relevant to a query embedding.
    ///
    /// Pipeline: filter narrows the candidate set, the relevance threshold
    /// drops weak candidates, the survivors are cut to `fetch_k` by
    /// relevance, and MMR picks the final `top_k`. Scores on the returned
    /// hits are cosine relevance to the query, not the MMR objective.
    pub fn retrieve(
        &self,
        query_embedding: &[f32],
        filter: Option<&Filter>,
        params: &RetrievalParams,
    ) -> RetrievedResult {
        let mut candidates: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| filter.is_none_or(|f| f.matches(&e.chunk)))
            .map(|(i, e)| (i, cosine_similarity(&e.embedding, query_embedding)))
            .filter(|(_, score)| *score >= params.min_score)
            .collect();

        candidates
            .sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        candidates.truncate(params.fetch_k);

        let selected = self.mmr_select(&candidates, params.top_k, params.diversity_lambda);

        debug!(
            candidates = candidates.len(),
            selected = selected.len(),
            filtered = filter.is_some(),
            "Retrieval complete"
        );

        RetrievedResult {
            hits: selected
                .into_iter()
                .map(|(i, score)| ScoredChunk { chunk: self.entries[i].chunk.clone(), score })
                .collect(),
        }
    }

    /// Greedy Maximal Marginal Relevance over a relevance-sorted pool.
    ///
    /// Each round picks the candidate maximizing
    /// `lambda * relevance - (1 - lambda) * max_similarity_to_selected`.
    fn mmr_select(
        &self,
        candidates: &[(usize, f32)],
        top_k: usize,
        lambda: f32,
    ) -> Vec<(usize, f32)> {
        let mut remaining: Vec<(usize, f32)> = candidates.to_vec();
        let mut selected: Vec<(usize, f32)> = Vec::with_capacity(top_k.min(remaining.len()));

        while selected.len() < top_k && !remaining.is_empty() {
            let mut best_pos = 0;
            let mut best_objective = f32::NEG_INFINITY;

            for (pos, &(idx, relevance)) in remaining.iter().enumerate() {
                let redundancy = selected
                    .iter()
                    .map(|&(sel_idx, _)| {
                        cosine_similarity(
                            &self.entries[idx].embedding,
                            &self.entries[sel_idx].embedding,
                        )
                    })
                    .fold(f32::NEG_INFINITY, f32::max);
                let redundancy = if selected.is_empty() { 0.0 } else { redundancy };

                let objective = lambda * relevance - (1.0 - lambda) * redundancy;
                if objective > best_objective {
                    best_objective = objective;
                    best_pos = pos;
                }
            }

            selected.push(remaining.remove(best_pos));
        }

        selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indexed(id: &str, country: &str, section: &str, embedding: Vec<f32>) -> IndexedChunk {
        IndexedChunk {
            chunk: DocumentChunk {
                id: id.into(),
                text: format!("text for {id}"),
                country: country.into(),
                city: None,
                section: section.into(),
            },
            embedding,
        }
    }

    fn sample_index() -> CorpusIndex {
        CorpusIndex::from_entries(vec![
            // Two near-duplicates pointing the same way as the query, one
            // distinct-but-relevant chunk, one off-topic chunk.
            indexed("jp-visa-1", "japan", "visa", vec![1.0, 0.0, 0.0]),
            indexed("jp-visa-2", "japan", "visa", vec![0.98, 0.05, 0.0]),
            indexed("jp-fines-1", "japan", "fines", vec![0.6, 0.8, 0.0]),
            indexed("jp-offtopic", "japan", "customs", vec![0.0, 0.0, 1.0]),
            indexed("fr-visa-1", "france", "visa", vec![0.9, 0.1, 0.0]),
        ])
    }

    #[test]
    fn relevance_orders_results() {
        let index = sample_index();
        let params = RetrievalParams { top_k: 2, diversity_lambda: 1.0, ..Default::default() };
        let result = index.retrieve(&[1.0, 0.0, 0.0], None, &params);

        assert_eq!(result.len(), 2);
        assert_eq!(result.hits[0].chunk.id, "jp-visa-1");
        assert!(result.hits[0].score >= result.hits[1].score);
    }

    #[test]
    fn mmr_prefers_distinct_chunk_over_near_duplicate() {
        let index = CorpusIndex::from_entries(vec![
            indexed("jp-visa-1", "japan", "visa", vec![1.0, 0.8, 0.0]),
            indexed("jp-visa-2", "japan", "visa", vec![1.0, 0.78, 0.0]),
            indexed("jp-fines-1", "japan", "fines", vec![0.2, 1.0, 0.0]),
        ]);
        let query = [0.7, 0.7, 0.0];

        let relevance_only =
            RetrievalParams { top_k: 2, diversity_lambda: 1.0, ..Default::default() };
        let result = index.retrieve(&query, None, &relevance_only);
        assert_eq!(result.hits[1].chunk.id, "jp-visa-2");

        // With diversity in play the near-duplicate loses the second slot
        // to the fines chunk.
        let diverse = RetrievalParams { top_k: 2, diversity_lambda: 0.5, ..Default::default() };
        let result = index.retrieve(&query, None, &diverse);
        assert_eq!(result.hits[0].chunk.id, "jp-visa-1");
        assert_eq!(result.hits[1].chunk.id, "jp-fines-1");
    }

    #[test]
    fn threshold_yields_empty_result() {
        let index = sample_index();
        let params = RetrievalParams { min_score: 0.99, ..Default::default() };
        let result = index.retrieve(&[0.0, 1.0, 0.0], None, &params);
        assert!(result.is_empty());
    }

    #[test]
    fn filter_narrows_before_ranking() {
        let index = sample_index();
        let filter = Filter::country("france");
        let result = index.retrieve(&[1.0, 0.0, 0.0], Some(&filter), &RetrievalParams::default());

        assert_eq!(result.len(), 1);
        assert_eq!(result.hits[0].chunk.id, "fr-visa-1");
    }

    #[test]
    fn fetch_k_caps_the_candidate_pool() {
        let index = sample_index();
        let params = RetrievalParams { top_k: 10, fetch_k: 2, min_score: 0.0, ..Default::default() };
        let result = index.retrieve(&[1.0, 0.0, 0.0], None, &params);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn empty_index_is_fine() {
        let index = CorpusIndex::from_entries(vec![]);
        let result = index.retrieve(&[1.0, 0.0], None, &RetrievalParams::default());
        assert!(result.is_empty());
        assert!(index.is_empty());
    }

    #[test]
    fn load_missing_file_errors() {
        let err = CorpusIndex::load(Path::new("/nonexistent/corpus.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/corpus.json"));
    }

    #[test]
    fn index_json_round_trips_flattened_chunk() {
        let json = r#"[{
            "id": "jp-visa-1",
            "text": "Visa-free entry up to 90 days.",
            "country": "japan",
            "section": "visa",
            "embedding": [1.0, 0.0]
        }]"#;
        let entries: Vec<IndexedChunk> = serde_json::from_str(json).unwrap();
        assert_eq!(entries[0].chunk.id, "jp-visa-1");
        assert_eq!(entries[0].embedding, vec![1.0, 0.0]);
    }
}
