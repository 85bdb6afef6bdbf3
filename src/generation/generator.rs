use unicode_segmentation::UnicodeSegmentation;

use crate::generation::templates;
use crate::llm::{prompts, LlmProvider};
use crate::models::{GeneratedResponse, RetrievalResult, SourceRef};

const MAX_CONTEXT_DOCS: usize = 3;
const CONTEXT_SNIPPET_CHARS: usize = 400;
const SOURCE_SNIPPET_CHARS: usize = 100;

/// Synthesizes the three-part structured answer from retrieved context.
///
/// The language model is the primary path; its output is verified against
/// the marker sets and patched with canned sections when incomplete. A
/// failed model call degrades to the fully templated builder, so a
/// complete three-part response is always produced.
pub struct ResponseGenerator {
    llm: LlmProvider,
}

fn truncate_graphemes(text: &str, max: usize) -> String {
    let mut graphemes = text.graphemes(true);
    let head: String = graphemes.by_ref().take(max).collect();
    if graphemes.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

impl ResponseGenerator {
    pub fn new(llm: LlmProvider) -> Self {
        Self { llm }
    }

    pub async fn generate(
        &self,
        query: &str,
        retrieved: &[RetrievalResult],
        emotion: &str,
        status: &str,
        message_count: u32,
    ) -> GeneratedResponse {
        let sources = Self::extract_sources(retrieved);
        let context = Self::build_context(retrieved);

        let response = match self
            .structured_llm_response(query, &context, emotion, status, message_count)
            .await
        {
            Ok(text) => {
                if Self::verify_structure(&text) {
                    text
                } else {
                    tracing::debug!("LLM response missing sections, patching structure");
                    Self::enhance_with_structure(&text, query, emotion, status)
                }
            }
            Err(e) => {
                tracing::warn!("LLM generation failed, using templated response: {e}");
                templates::build_structured_response(query, emotion, status)
            }
        };

        let confidence = Self::calculate_confidence(&sources);

        GeneratedResponse {
            response,
            sources,
            confidence,
        }
    }

    /// Context block from at most the top 3 retrieved chunks.
    fn build_context(retrieved: &[RetrievalResult]) -> String {
        let parts: Vec<String> = retrieved
            .iter()
            .take(MAX_CONTEXT_DOCS)
            .enumerate()
            .filter(|(_, doc)| !doc.content.is_empty())
            .map(|(i, doc)| {
                format!(
                    "[Document {}]\n{}",
                    i + 1,
                    truncate_graphemes(&doc.content, CONTEXT_SNIPPET_CHARS)
                )
            })
            .collect();

        if parts.is_empty() {
            "No specific context available.".to_string()
        } else {
            parts.join("\n\n")
        }
    }

    async fn structured_llm_response(
        &self,
        query: &str,
        context: &str,
        emotion: &str,
        status: &str,
        message_count: u32,
    ) -> crate::error::Result<String> {
        let prompt =
            prompts::structured_support_prompt(query, context, emotion, status, message_count);
        self.llm.complete(&prompt, None).await
    }

    /// All three marker sets must be present, case-insensitively.
    pub fn verify_structure(response: &str) -> bool {
        let lower = response.to_lowercase();
        templates::has_marker(&lower, templates::EMPATHY_MARKERS)
            && templates::has_marker(&lower, templates::SOLUTION_MARKERS)
            && templates::has_marker(&lower, templates::RECOMMENDATION_MARKERS)
    }

    /// Concatenate canned sections around the surviving model output.
    /// Existing content is never discarded.
    fn enhance_with_structure(partial: &str, query: &str, emotion: &str, status: &str) -> String {
        templates::ensure_structure(partial, query, emotion, status)
    }

    fn extract_sources(retrieved: &[RetrievalResult]) -> Vec<SourceRef> {
        retrieved
            .iter()
            .take(MAX_CONTEXT_DOCS)
            .enumerate()
            .filter(|(_, doc)| !doc.content.is_empty())
            .map(|(i, doc)| SourceRef {
                source: if doc.metadata.source.is_empty() {
                    format!("Document {}", i + 1)
                } else {
                    doc.metadata.source.clone()
                },
                score: doc.score,
                snippet: truncate_graphemes(&doc.content, SOURCE_SNIPPET_CHARS),
            })
            .collect()
    }

    /// Average of the top-3 source scores. Three strong sources earn a
    /// 1.2x boost capped at 1.0; no sources floor at 0.4.
    pub fn calculate_confidence(sources: &[SourceRef]) -> f32 {
        if sources.is_empty() {
            return 0.4;
        }

        let scores: Vec<f32> = sources.iter().take(3).map(|s| s.score).collect();
        let avg = scores.iter().sum::<f32>() / scores.len() as f32;

        if sources.len() >= 3 && avg > 0.5 {
            (avg * 1.2).min(1.0)
        } else {
            avg.max(0.4)
        }
    }
}
