//! Legal agent: retrieval-grounded answers under a hard citation policy.
//!
//! The flow: resolve a canonical filter, embed a densified query, retrieve,
//! then draft structured statements with the generator using only the
//! retrieved chunk texts as context. Grounding is enforced after the draft:
//! a statement citing any chunk id outside the retrieval is dropped, and
//! the sources block always lists the retrieval's own chunk ids. When the
//! corpus holds nothing relevant the agent reports insufficient data
//! instead of letting the generator answer from its own knowledge.

use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};
use wayfarer_core::RetrievedResult;
use wayfarer_core::generator::{GenerationRequest, Generator};
use wayfarer_core::payload::{DomainFailure, GroundedStatement, LegalPayload, LegalTopic};
use wayfarer_core::query::Classification;
use wayfarer_knowledge::KnowledgeBase;
use wayfarer_retrieval::{CorpusIndex, RetrievalParams};

use crate::json::generate_typed;
use crate::tourist::map_failure;

const LEGAL_SYSTEM: &str = "\
You are a legal assistant for travelers. CRITICAL: answer ONLY from the \
CONTEXT below (a local corpus); never add facts that are not in it. \
Respond with ONLY a JSON object: {\"visa_required\": true|false|null, \
\"statements\": [{\"topic\": \"visa\"|\"entry_and_registration\"|\
\"prohibitions_and_fines\"|\"recommendation\", \"text\": string, \
\"chunk_ids\": [string]}]}. Every statement must cite the ids of the \
context chunks that support it, exactly as bracketed in the context. \
Keep wording close to the context. If the context does not answer the \
visa question, visa_required must be null. If the context does contain \
relevant information, do not leave statements empty. No JSON Schema, no \
prose around the object.";

const LEGAL_REPAIR: &str = "\
You fix output format. Return ONLY the JSON object with visa_required \
and statements as described before, citing only the bracketed chunk ids \
from the context. Data values only, no schema keys.";

/// Legal keywords appended to the retrieval query so a short question
/// still lands near the right corpus sections.
const DENSIFIER: &str = "visa laws entry rules registration fines";

/// Wire shape of the drafted answer. Statements with unknown topics fail
/// the parse (the taxonomy is closed).
#[derive(Debug, Deserialize)]
struct LegalDraft {
    #[serde(default)]
    visa_required: Option<bool>,
    #[serde(default)]
    statements: Vec<DraftStatement>,
}

#[derive(Debug, Deserialize)]
struct DraftStatement {
    topic: LegalTopic,
    text: String,
    #[serde(default)]
    chunk_ids: Vec<String>,
}

pub struct LegalAgent {
    generator: Arc<dyn Generator>,
    index: Arc<CorpusIndex>,
    knowledge: Arc<KnowledgeBase>,
    params: RetrievalParams,
    max_tokens: u32,
}

impl LegalAgent {
    pub fn new(
        generator: Arc<dyn Generator>,
        index: Arc<CorpusIndex>,
        knowledge: Arc<KnowledgeBase>,
        params: RetrievalParams,
    ) -> Self {
        Self { generator, index, knowledge, params, max_tokens: 1400 }
    }

    pub async fn run(
        &self,
        classification: &Classification,
    ) -> Result<LegalPayload, DomainFailure> {
        let filter = self
            .knowledge
            .resolve_filter(classification.country.as_deref(), classification.city.as_deref())
            .map(|f| match section_scope(&classification.user_question) {
                Some(section) => f.with_section(section),
                None => f,
            });

        let destination = classification.destination_label();
        let retrieval_query = format!(
            "{destination} {DENSIFIER} {}",
            classification.user_question
        )
        .trim()
        .to_string();

        let embedding = match self.generator.embed(&[retrieval_query.clone()]).await {
            Ok(mut vectors) if !vectors.is_empty() => vectors.remove(0),
            Ok(_) => {
                return Ok(LegalPayload::InsufficientData {
                    reason: "embedding service returned no vectors".to_string(),
                });
            }
            Err(e) => {
                warn!(error = %e, "Query embedding unavailable");
                return Ok(LegalPayload::InsufficientData {
                    reason: format!("query embedding unavailable: {e}"),
                });
            }
        };

        let retrieved = self.index.retrieve(&embedding, filter.as_ref(), &self.params);
        if retrieved.is_empty() {
            info!(%retrieval_query, filtered = filter.is_some(), "Corpus held nothing relevant");
            return Ok(LegalPayload::InsufficientData {
                reason: "the local legal corpus holds nothing relevant to this destination and question".to_string(),
            });
        }

        let context: String = retrieved
            .iter()
            .map(|h| format!("[{}]\n{}", h.chunk.id, h.chunk.text))
            .collect::<Vec<_>>()
            .join("\n\n");
        let user = format!(
            "Country/city: {}\nQuestion: {}\n\nCONTEXT:\n{context}",
            if destination.is_empty() { "not specified" } else { destination.as_str() },
            classification.user_question,
        );
        let request =
            GenerationRequest::new(LEGAL_SYSTEM, user).with_max_tokens(self.max_tokens);

        let draft: LegalDraft = generate_typed(&self.generator, request, LEGAL_REPAIR)
            .await
            .map_err(map_failure)?;

        Ok(enforce_grounding(draft, &retrieved))
    }
}

/// Corpus section scope for questions that clearly target a single
/// section. General questions stay unscoped so retrieval sees every
/// section of the destination's corpus.
fn section_scope(question: &str) -> Option<&'static str> {
    let q = question.to_lowercase();
    ["fine", "penalt", "prohibit", "forbidden", "illegal"]
        .iter()
        .any(|k| q.contains(k))
        .then_some("fines")
}

/// Drop statements whose citations are not backed by this retrieval, and
/// pin the sources block to the retrieval's chunk ids.
fn enforce_grounding(draft: LegalDraft, retrieved: &RetrievedResult) -> LegalPayload {
    let total = draft.statements.len();
    let statements: Vec<GroundedStatement> = draft
        .statements
        .into_iter()
        .filter(|s| {
            !s.chunk_ids.is_empty()
                && !s.text.trim().is_empty()
                && s.chunk_ids.iter().all(|id| retrieved.contains_id(id))
        })
        .map(|s| GroundedStatement { topic: s.topic, text: s.text, chunk_ids: s.chunk_ids })
        .collect();

    if statements.len() < total {
        warn!(dropped = total - statements.len(), total, "Dropped ungrounded legal statements");
    }

    if statements.is_empty() {
        // The draft asserted nothing the corpus supports; the visa verdict
        // would be just as unsupported, so the whole answer degrades.
        return LegalPayload::InsufficientData {
            reason: "no drafted statement was supported by the retrieved corpus chunks".to_string(),
        };
    }

    debug!(statements = statements.len(), "Grounded legal payload ready");
    LegalPayload::Grounded {
        visa_required: draft.visa_required,
        statements,
        sources: retrieved.source_ids(),
    }
}
