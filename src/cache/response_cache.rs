use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::config::CacheConfig;
use crate::models::{QueryAnswer, UserContext};

#[derive(Debug, Clone)]
struct CacheEntry {
    query: String,
    emotion: String,
    status: String,
    answer: QueryAnswer,
}

/// Short-circuits repeated or near-identical queries.
///
/// A lookup hits only when the query similarity reaches the threshold AND
/// both emotion and mental-health status match the cached turn exactly.
/// The store is bounded with strict FIFO eviction: once full, the single
/// oldest-inserted entry is dropped, regardless of how often it was read.
#[derive(Clone)]
pub struct ResponseCache {
    entries: Arc<Mutex<VecDeque<CacheEntry>>>,
    max_entries: usize,
    similarity_threshold: f32,
}

impl ResponseCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: Arc::new(Mutex::new(VecDeque::new())),
            max_entries: config.max_entries,
            similarity_threshold: config.similarity_threshold,
        }
    }

    pub fn lookup(&self, query: &str, user_context: &UserContext) -> Option<QueryAnswer> {
        let entries = self.entries.lock().unwrap();
        let query_lower = query.to_lowercase();

        for entry in entries.iter() {
            let similarity = similarity_ratio(&query_lower, &entry.query.to_lowercase());
            if similarity >= self.similarity_threshold
                && entry.emotion == user_context.emotion
                && entry.status == user_context.mental_health_status
            {
                tracing::debug!(similarity, "Cache hit");
                return Some(entry.answer.clone());
            }
        }

        None
    }

    pub fn store(&self, query: &str, user_context: &UserContext, answer: QueryAnswer) {
        let mut entries = self.entries.lock().unwrap();

        // An identical query for the same context replaces in place,
        // keeping its original eviction position.
        if let Some(existing) = entries
            .iter_mut()
            .find(|entry| entry.query == query && entry.emotion == user_context.emotion)
        {
            existing.status = user_context.mental_health_status.clone();
            existing.answer = answer;
            return;
        }

        while entries.len() >= self.max_entries {
            entries.pop_front();
        }

        entries.push_back(CacheEntry {
            query: query.to_string(),
            emotion: user_context.emotion.clone(),
            status: user_context.mental_health_status.clone(),
            answer,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Normalized similarity between two strings in [0, 1]: 1 minus the
/// Levenshtein distance over the longer length.
pub fn similarity_ratio(a: &str, b: &str) -> f32 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }

    let distance = levenshtein_distance(a, b);
    (1.0 - distance as f32 / max_len as f32).max(0.0)
}

fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let a_len = a_chars.len();
    let b_len = b_chars.len();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    let mut previous: Vec<usize> = (0..=b_len).collect();
    let mut current = vec![0usize; b_len + 1];

    for i in 1..=a_len {
        current[0] = i;
        for j in 1..=b_len {
            let cost = if a_chars[i - 1] == b_chars[j - 1] { 0 } else { 1 };
            current[j] = (previous[j] + 1)
                .min(current[j - 1] + 1)
                .min(previous[j - 1] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b_len]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(text: &str) -> QueryAnswer {
        QueryAnswer {
            response: text.to_string(),
            confidence: 0.8,
            sources: Vec::new(),
            method: "retrieval".to_string(),
        }
    }

    fn context(emotion: &str, status: &str) -> UserContext {
        UserContext {
            emotion: emotion.to_string(),
            mental_health_status: status.to_string(),
            ..UserContext::default()
        }
    }

    fn cache(max_entries: usize) -> ResponseCache {
        ResponseCache::new(&CacheConfig {
            max_entries,
            similarity_threshold: 0.85,
        })
    }

    #[test]
    fn test_exact_query_hits() {
        let cache = cache(100);
        let ctx = context("anxious", "Mild");
        cache.store("how do I handle anxiety", &ctx, answer("reply"));

        let hit = cache.lookup("how do I handle anxiety", &ctx);
        assert_eq!(hit.unwrap().response, "reply");
    }

    #[test]
    fn test_similar_query_hits_above_threshold() {
        let cache = cache(100);
        let ctx = context("anxious", "Mild");
        cache.store("how do I handle anxiety today", &ctx, answer("reply"));

        // One character of drift: similarity stays above 0.85.
        let hit = cache.lookup("how do I handle anxiety toda", &ctx);
        assert!(hit.is_some());
    }

    #[test]
    fn test_dissimilar_query_misses() {
        let cache = cache(100);
        let ctx = context("anxious", "Mild");
        cache.store("how do I handle anxiety", &ctx, answer("reply"));

        assert!(cache.lookup("what helps with insomnia", &ctx).is_none());
    }

    #[test]
    fn test_context_mismatch_misses() {
        let cache = cache(100);
        cache.store(
            "how do I handle anxiety",
            &context("anxious", "Mild"),
            answer("reply"),
        );

        assert!(cache
            .lookup("how do I handle anxiety", &context("sad", "Mild"))
            .is_none());
        assert!(cache
            .lookup("how do I handle anxiety", &context("anxious", "Severe"))
            .is_none());
    }

    #[test]
    fn test_similarity_just_below_threshold_misses() {
        let cache = cache(100);
        let ctx = context("anxious", "Mild");

        // 20 chars cached; a 4-char edit gives ratio 0.80 < 0.85.
        let cached_query = "aaaaaaaaaaaaaaaaaaaa";
        let probe = "aaaaaaaaaaaaaaaabbbb";
        assert!(similarity_ratio(cached_query, probe) < 0.85);
        assert!(similarity_ratio(cached_query, probe) >= 0.75);

        cache.store(cached_query, &ctx, answer("reply"));
        assert!(cache.lookup(probe, &ctx).is_none());
    }

    #[test]
    fn test_fifo_bound_evicts_oldest() {
        let cache = cache(100);
        let ctx = context("neutral", "Unknown");

        for i in 0..101 {
            cache.store(&format!("distinct query number {i}"), &ctx, answer("r"));
        }

        assert_eq!(cache.len(), 100);
        assert!(cache.lookup("distinct query number 0", &ctx).is_none());
        assert!(cache.lookup("distinct query number 100", &ctx).is_some());
    }

    #[test]
    fn test_store_same_query_replaces() {
        let cache = cache(100);
        let ctx = context("neutral", "Unknown");

        cache.store("hello there", &ctx, answer("first"));
        cache.store("hello there", &ctx, answer("second"));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.lookup("hello there", &ctx).unwrap().response, "second");
    }

    #[test]
    fn test_similarity_ratio_bounds() {
        assert_eq!(similarity_ratio("", ""), 1.0);
        assert_eq!(similarity_ratio("abc", "abc"), 1.0);
        assert_eq!(similarity_ratio("abc", "xyz"), 0.0);
        let ratio = similarity_ratio("kitten", "sitting");
        assert!(ratio > 0.0 && ratio < 1.0);
    }

    #[test]
    fn test_concurrent_store_and_lookup() {
        let cache = cache(100);
        let mut handles = vec![];

        for i in 0..10 {
            let cache = cache.clone();
            handles.push(std::thread::spawn(move || {
                let ctx = context("neutral", "Unknown");
                let query = format!("thread query {i}");
                cache.store(&query, &ctx, answer("r"));
                assert!(cache.lookup(&query, &ctx).is_some());
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }
    }
}
