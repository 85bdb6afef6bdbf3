//! Property-style checks over the pipeline's core guarantees.

use solace::cache::{similarity_ratio, ResponseCache};
use solace::config::{CacheConfig, ChunkingStrategy, DistanceMetric, RetrievalConfig};
use solace::generation::ResponseGenerator;
use solace::index::{ChunkPoint, VectorIndex};
use solace::llm::LlmProvider;
use solace::models::{ChunkMetadata, QueryAnswer, UserContext};
use solace::processing::DocumentChunker;
use solace::router::personal_query_boost;

fn retrieval_config(strategy: ChunkingStrategy, chunk_size: usize, overlap: usize) -> RetrievalConfig {
    RetrievalConfig {
        collection_name: "props".to_string(),
        chunk_size,
        chunk_overlap: overlap,
        chunking_strategy: strategy,
        top_k: 5,
        reranker_top_k: 5,
        min_retrieval_confidence: 0.7,
        distance_metric: DistanceMetric::Cosine,
    }
}

fn sample_documents() -> Vec<String> {
    let paragraph = "Coping with stress takes practice and patience. Small daily routines compound into resilience over weeks.";
    vec![
        "Tiny note.".to_string(),
        format!("{paragraph}\n\n{paragraph}\n\n{paragraph}"),
        paragraph.repeat(12),
        format!("{}\n\n{}", paragraph.repeat(6), "One more short paragraph."),
    ]
}

#[test]
fn chunk_word_count_stays_within_budget() {
    for strategy in [ChunkingStrategy::Fixed, ChunkingStrategy::Hybrid] {
        let chunk_size = 160;
        let overlap = 32;
        let chunker = DocumentChunker::new(&retrieval_config(strategy, chunk_size, overlap)).unwrap();

        for document in sample_documents() {
            let chunks = chunker.chunk(&document);
            for (i, chunk) in chunks.iter().enumerate() {
                if i + 1 == chunks.len() {
                    continue; // the final chunk may be shorter
                }
                assert!(
                    chunk.word_count() <= chunk_size + overlap,
                    "{strategy:?}: chunk {i} has {} words",
                    chunk.word_count()
                );
            }
        }
    }
}

#[test]
fn fixed_chunking_never_splits_words() {
    let chunker =
        DocumentChunker::new(&retrieval_config(ChunkingStrategy::Fixed, 90, 18)).unwrap();

    for document in sample_documents() {
        let source_words: std::collections::HashSet<&str> =
            document.split_whitespace().collect();
        for chunk in chunker.chunk(&document) {
            for word in chunk.content.split_whitespace() {
                assert!(
                    source_words.contains(word),
                    "word '{word}' does not appear whole in the source"
                );
            }
        }
    }
}

#[test]
fn retrieval_scores_are_non_increasing() {
    let index = VectorIndex::new("props", DistanceMetric::Cosine);

    let points: Vec<ChunkPoint> = (0..32)
        .map(|i| {
            let angle = i as f32 * 0.17;
            ChunkPoint {
                id: format!("p{i}"),
                vector: vec![angle.cos(), angle.sin()],
                content: format!("point {i}"),
                metadata: ChunkMetadata::default(),
            }
        })
        .collect();
    index.upsert(points).unwrap();

    for query in [[1.0f32, 0.0], [0.6, 0.8], [-0.7, 0.7]] {
        let results = index.retrieve(&query, 10, None);
        assert_eq!(results.len(), 10);
        for pair in results.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }
}

#[test]
fn cache_gates_on_similarity_and_context() {
    let cache = ResponseCache::new(&CacheConfig::default());
    let answer = QueryAnswer {
        response: "cached".to_string(),
        confidence: 0.8,
        sources: Vec::new(),
        method: "retrieval".to_string(),
    };
    let ctx = UserContext {
        emotion: "anxious".to_string(),
        mental_health_status: "Mild".to_string(),
        ..UserContext::default()
    };

    // 40 chars cached; 5 edits = ratio 0.875, 6 edits = ratio 0.85, 7 = 0.825.
    let cached_query = "a".repeat(40);
    cache.store(&cached_query, &ctx, answer);

    let near = format!("{}bbbbb", "a".repeat(35));
    assert!(similarity_ratio(&cached_query, &near) >= 0.85);
    assert!(cache.lookup(&near, &ctx).is_some());

    let far = format!("{}bbbbbbb", "a".repeat(33));
    assert!(similarity_ratio(&cached_query, &far) < 0.85);
    assert!(cache.lookup(&far, &ctx).is_none());

    // Matching similarity but mismatched status must miss.
    let severe_ctx = UserContext {
        emotion: "anxious".to_string(),
        mental_health_status: "Severe".to_string(),
        ..UserContext::default()
    };
    assert!(cache.lookup(&near, &severe_ctx).is_none());
}

#[test]
fn cache_bound_holds_after_overflow() {
    let cache = ResponseCache::new(&CacheConfig::default());
    let ctx = UserContext::default();
    let answer = QueryAnswer {
        response: "r".to_string(),
        confidence: 0.8,
        sources: Vec::new(),
        method: "retrieval".to_string(),
    };

    for i in 0..101 {
        cache.store(&format!("long unique query number {i}"), &ctx, answer.clone());
    }

    assert_eq!(cache.len(), 100);
    assert!(cache
        .lookup("long unique query number 0", &ctx)
        .is_none());
}

#[test]
fn confidence_boost_caps_at_one() {
    assert_eq!(personal_query_boost(0.95, "I feel low", "sad"), 1.0);
    assert!((personal_query_boost(0.5, "I feel low", "sad") - 0.6).abs() < 1e-6);
}

#[tokio::test]
async fn generated_responses_always_carry_three_sections() {
    let generator = ResponseGenerator::new(LlmProvider::unavailable("props"));

    for (query, emotion, status) in [
        ("I cannot stop worrying", "anxious", "Mild"),
        ("work stress is crushing me", "stressed", "Moderate"),
        ("I feel sad and depressed all day", "sad", "Severe"),
        ("random unrelated text", "neutral", "Unknown"),
    ] {
        let out = generator.generate(query, &[], emotion, status, 1).await;
        assert!(
            ResponseGenerator::verify_structure(&out.response),
            "missing section for '{query}'"
        );
    }
}
