//! Rolling trip-memory summarizer.

use std::sync::Arc;
use tracing::{debug, warn};
use wayfarer_core::generator::{GenerationRequest, Generator};

const SUMMARY_SYSTEM: &str = "\
You are the memory module of a travel assistant. Update the short trip \
summary in 1-3 sentences. Keep the facts: destination, dates, \
interests, budget, style, constraints. If the recent messages add \
nothing, return the old summary unchanged. Return only the summary \
text.";

const SUMMARY_MAX_TOKENS: u32 = 220;

pub struct Summarizer {
    generator: Arc<dyn Generator>,
}

impl Summarizer {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }

    /// Fold recent transcript lines into the rolling summary.
    ///
    /// A generator failure keeps the old summary; memory degrades to
    /// staleness, never to loss.
    pub async fn update(&self, old_summary: &str, recent: &str) -> String {
        let user = format!("OLD SUMMARY:\n{old_summary}\n\nRECENT MESSAGES:\n{recent}\n\nNew summary:");
        let request =
            GenerationRequest::new(SUMMARY_SYSTEM, user).with_max_tokens(SUMMARY_MAX_TOKENS);

        match self.generator.generate(request).await {
            Ok(response) => {
                let updated = response.content.trim().to_string();
                debug!(chars = updated.len(), "Trip summary updated");
                updated
            }
            Err(e) => {
                warn!(error = %e, "Summary update failed, keeping the old summary");
                old_summary.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::SequentialMockGenerator;
    use wayfarer_core::error::GeneratorError;

    #[tokio::test]
    async fn folds_recent_lines_into_summary() {
        let generator: Arc<dyn Generator> = Arc::new(SequentialMockGenerator::single_text(
            "Planning 5 days in Tokyo in May; interested in temples and food.",
        ));
        let summarizer = Summarizer::new(generator);

        let updated = summarizer.update("", "user: 5 days in Tokyo in May").await;
        assert!(updated.contains("Tokyo"));
    }

    #[tokio::test]
    async fn failure_keeps_old_summary() {
        let generator: Arc<dyn Generator> = Arc::new(SequentialMockGenerator::always_failing(
            GeneratorError::Network("down".into()),
        ));
        let summarizer = Summarizer::new(generator);

        let updated = summarizer.update("Tokyo in May.", "user: and what about Kyoto?").await;
        assert_eq!(updated, "Tokyo in May.");
    }
}
