use regex::Regex;

use crate::config::{ChunkingStrategy, RetrievalConfig};
use crate::error::{Result, SolaceError};
use crate::models::{Chunk, Granularity};

/// Document type labels assigned by pattern-match count.
const DOCUMENT_TYPE_PATTERNS: &[(&str, &str)] = &[
    (
        "mental_health_tip",
        r"(?i)(stress|anxiety|depression|coping|therapy|mindfulness|prevention|tip|advice|support)",
    ),
    (
        "clinical_note",
        r"(?i)(chief complaint|history of present illness|past medical history|medications|assessment|plan|review of systems|physical examination|lab results|imaging|impression|followup)",
    ),
    (
        "patient_record",
        r"(?i)(patient information|demographics|vital signs|allergies|immunizations|family history|social history|surgical history|problem list)",
    ),
    (
        "treatment_guidelines",
        r"(?i)(recommendations|guidelines|protocols|indications|contraindications|dosage|administration|monitoring|special populations)",
    ),
    (
        "pharmacology",
        r"(?i)(mechanism of action|pharmacokinetics|pharmacodynamics|dosing|adverse effects|warnings|interactions|storage|pregnancy considerations)",
    ),
    (
        "general_medical",
        r"(?i)(medical|health|wellness|nutrition|exercise|lifestyle|prevention|diagnosis|treatment|symptom|condition)",
    ),
];

/// Section headers recognized at the start of a line.
const SECTION_HEADER_PATTERN: &str = r"(?im)^(stress|anxiety|depression|coping|therapy|mindfulness|tip|advice|support|chief complaint|history of present illness|past medical history|medications|assessment|plan|recommendations|guidelines|protocols|dosage|monitoring|prevention|diagnosis|treatment|symptom|condition)\b";

/// Splits documents into retrievable chunks.
///
/// The semantic pass accumulates blank-line paragraphs up to the chunk
/// budget; the fixed pass slides a character window with overlap, snapping
/// window ends to whitespace. Hybrid runs semantic first and breaks down
/// any chunk still larger than twice the budget with the fixed pass.
pub struct DocumentChunker {
    chunk_size: usize,
    chunk_overlap: usize,
    strategy: ChunkingStrategy,
    type_patterns: Vec<(&'static str, Regex)>,
    section_pattern: Regex,
}

impl DocumentChunker {
    pub fn new(config: &RetrievalConfig) -> Result<Self> {
        config.validate()?;

        let type_patterns = DOCUMENT_TYPE_PATTERNS
            .iter()
            .map(|(name, pattern)| {
                Regex::new(pattern)
                    .map(|re| (*name, re))
                    .map_err(|e| SolaceError::Validation(format!("Bad type pattern: {e}")))
            })
            .collect::<Result<Vec<_>>>()?;

        let section_pattern = Regex::new(SECTION_HEADER_PATTERN)
            .map_err(|e| SolaceError::Validation(format!("Bad section pattern: {e}")))?;

        Ok(Self {
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
            strategy: config.chunking_strategy,
            type_patterns,
            section_pattern,
        })
    }

    pub fn chunk(&self, content: &str) -> Vec<Chunk> {
        let content = content.trim();
        if content.is_empty() {
            return Vec::new();
        }

        // A document that fits the budget is a single document-level chunk.
        if content.len() <= self.chunk_size {
            return vec![Chunk::new(
                content.to_string(),
                self.section_label(content),
                Granularity::Document,
            )];
        }

        match self.strategy {
            ChunkingStrategy::Semantic => self.semantic_chunks(content),
            ChunkingStrategy::Fixed => self.fixed_chunks(content),
            ChunkingStrategy::Hybrid => self.hybrid_chunks(content),
        }
    }

    /// Detect the document type with the highest pattern-match count.
    pub fn detect_document_type(&self, text: &str) -> &'static str {
        let mut best = ("general_medical", 0usize);
        for (name, pattern) in &self.type_patterns {
            let count = pattern.find_iter(text).count();
            if count > best.1 {
                best = (*name, count);
            }
        }
        best.0
    }

    fn section_label(&self, text: &str) -> String {
        self.section_pattern
            .find(text)
            .map(|m| m.as_str().trim().to_lowercase())
            .unwrap_or_else(|| "general".to_string())
    }

    fn semantic_chunks(&self, content: &str) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut buffer = String::new();

        for para in content.split("\n\n") {
            let para = para.trim();
            if para.is_empty() {
                continue;
            }

            if !buffer.is_empty() && buffer.len() + 2 + para.len() > self.chunk_size {
                chunks.push(self.paragraph_chunk(&buffer));
                buffer.clear();
            }

            if !buffer.is_empty() {
                buffer.push_str("\n\n");
            }
            buffer.push_str(para);
        }

        if !buffer.is_empty() {
            chunks.push(self.paragraph_chunk(&buffer));
        }

        chunks
    }

    fn paragraph_chunk(&self, text: &str) -> Chunk {
        Chunk::new(
            text.to_string(),
            self.section_label(text),
            Granularity::Paragraph,
        )
    }

    fn fixed_chunks(&self, content: &str) -> Vec<Chunk> {
        let bytes_len = content.len();
        let mut chunks = Vec::new();
        let mut start = 0usize;

        while start < bytes_len {
            let mut end = (start + self.chunk_size).min(bytes_len);
            end = floor_char_boundary(content, end);

            // Snap the window end back to whitespace so no word is split.
            if end < bytes_len && !content[end..].starts_with(char::is_whitespace) {
                if let Some(last_ws) = content[start..end].rfind(char::is_whitespace) {
                    if last_ws > 0 {
                        end = start + last_ws;
                    }
                }
            }

            let window = content[start..end].trim();
            if !window.is_empty() {
                chunks.push(Chunk::new(
                    window.to_string(),
                    self.section_label(window),
                    Granularity::Sliding,
                ));
            }

            if end >= bytes_len {
                break;
            }

            // Back-step by the overlap, but always make forward progress.
            let mut next_start = if end > start + self.chunk_overlap {
                end - self.chunk_overlap
            } else {
                end
            };
            next_start = floor_char_boundary(content, next_start);

            // The back-step may land inside a word; move to the start of it.
            if next_start > start && next_start < bytes_len {
                if let Some(ws) = content[start..next_start].rfind(char::is_whitespace) {
                    let ws_abs = start + ws;
                    let ws_len = content[ws_abs..]
                        .chars()
                        .next()
                        .map(char::len_utf8)
                        .unwrap_or(1);
                    let candidate = ws_abs + ws_len;
                    if candidate > start {
                        next_start = candidate;
                    }
                }
            }

            start = if next_start > start { next_start } else { end };
        }

        chunks
    }

    fn hybrid_chunks(&self, content: &str) -> Vec<Chunk> {
        let mut out = Vec::new();
        for chunk in self.semantic_chunks(content) {
            if chunk.content.len() > self.chunk_size * 2 {
                out.extend(self.fixed_chunks(&chunk.content));
            } else {
                out.push(chunk);
            }
        }
        out
    }
}

fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    while index > 0 && index < text.len() && !text.is_char_boundary(index) {
        index -= 1;
    }
    index.min(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DistanceMetric;

    fn chunker(strategy: ChunkingStrategy, chunk_size: usize, overlap: usize) -> DocumentChunker {
        DocumentChunker::new(&RetrievalConfig {
            collection_name: "test".to_string(),
            chunk_size,
            chunk_overlap: overlap,
            chunking_strategy: strategy,
            top_k: 5,
            reranker_top_k: 5,
            min_retrieval_confidence: 0.7,
            distance_metric: DistanceMetric::Cosine,
        })
        .unwrap()
    }

    fn repeat_sentence(n: usize) -> String {
        std::iter::repeat("Managing stress takes steady daily practice.")
            .take(n)
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_empty_document_produces_no_chunks() {
        let chunker = chunker(ChunkingStrategy::Hybrid, 256, 50);
        assert!(chunker.chunk("").is_empty());
        assert!(chunker.chunk("   \n\n  ").is_empty());
    }

    #[test]
    fn test_short_document_is_single_chunk() {
        let chunker = chunker(ChunkingStrategy::Hybrid, 256, 50);
        let chunks = chunker.chunk("Anxiety is a common reaction to stress.");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].granularity, Granularity::Document);
    }

    #[test]
    fn test_semantic_pass_respects_paragraph_boundaries() {
        let chunker = chunker(ChunkingStrategy::Semantic, 120, 20);
        let text = format!(
            "{}\n\n{}\n\n{}",
            "First paragraph about coping with stress at work.",
            "Second paragraph about sleep hygiene and routines.",
            "Third paragraph about mindfulness exercises daily."
        );

        let chunks = chunker.chunk(&text);
        assert!(chunks.len() >= 2, "Budget should force a flush");
        for chunk in &chunks {
            assert!(!chunk.content.is_empty());
        }
    }

    #[test]
    fn test_semantic_pass_drops_empty_paragraphs() {
        let chunker = chunker(ChunkingStrategy::Semantic, 500, 50);
        let text = "Paragraph one.\n\n\n\n   \n\nParagraph two.";
        let chunks = chunker.chunk(&text.repeat(40));
        for chunk in &chunks {
            assert!(!chunk.content.trim().is_empty());
        }
    }

    #[test]
    fn test_fixed_windows_never_split_words() {
        let chunker = chunker(ChunkingStrategy::Fixed, 80, 16);
        let text = repeat_sentence(20);
        let chunks = chunker.chunk(&text);

        let source_words: std::collections::HashSet<&str> = text.split_whitespace().collect();

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            // Every chunk boundary must land on whole words from the source.
            for word in chunk.content.split_whitespace() {
                assert!(
                    source_words.contains(word),
                    "Chunk word '{word}' was split mid-word"
                );
            }
        }
    }

    #[test]
    fn test_chunk_word_count_bound() {
        for strategy in [ChunkingStrategy::Fixed, ChunkingStrategy::Hybrid] {
            let chunk_size = 120;
            let overlap = 24;
            let chunker = chunker(strategy, chunk_size, overlap);
            let chunks = chunker.chunk(&repeat_sentence(60));

            for (i, chunk) in chunks.iter().enumerate() {
                if i + 1 == chunks.len() {
                    continue; // final chunk may be shorter
                }
                assert!(
                    chunk.word_count() <= chunk_size + overlap,
                    "Chunk {i} exceeds the word budget: {}",
                    chunk.word_count()
                );
            }
        }
    }

    #[test]
    fn test_hybrid_breaks_down_oversized_paragraphs() {
        let chunker = chunker(ChunkingStrategy::Hybrid, 100, 20);
        // One giant paragraph, no blank lines: semantic pass keeps it whole,
        // the fixed pass must break it down.
        let text = repeat_sentence(30);
        let chunks = chunker.chunk(&text);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.content.len() <= 200 + 1);
        }
    }

    #[test]
    fn test_overlap_equal_to_chunk_size_rejected() {
        let result = DocumentChunker::new(&RetrievalConfig {
            collection_name: "test".to_string(),
            chunk_size: 64,
            chunk_overlap: 64,
            chunking_strategy: ChunkingStrategy::Hybrid,
            top_k: 5,
            reranker_top_k: 5,
            min_retrieval_confidence: 0.7,
            distance_metric: DistanceMetric::Cosine,
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_document_type_detection() {
        let chunker = chunker(ChunkingStrategy::Hybrid, 256, 50);
        assert_eq!(
            chunker.detect_document_type(
                "Tips for coping with stress: mindfulness, therapy and daily support."
            ),
            "mental_health_tip"
        );
        assert_eq!(chunker.detect_document_type("Nothing relevant here."), "general_medical");
    }

    #[test]
    fn test_fixed_windows_overlap() {
        let chunker = chunker(ChunkingStrategy::Fixed, 100, 30);
        let text = repeat_sentence(20);
        let chunks = chunker.chunk(&text);

        // Each window starts inside the previous one: its first word was
        // already emitted as part of the preceding chunk.
        for pair in chunks.windows(2) {
            let first_word = pair[1].content.split_whitespace().next().unwrap();
            assert!(
                pair[0].content.contains(first_word),
                "Expected window start '{first_word}' to overlap the previous chunk"
            );
        }
    }
}
