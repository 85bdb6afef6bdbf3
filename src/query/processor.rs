use std::collections::BTreeMap;

use regex::{Regex, RegexBuilder};

use crate::error::{Result, SolaceError};
use crate::models::{QueryContext, QueryIntent};
use crate::query::lexicon;

/// Extracts intent, entities and specialty from a raw query and expands it
/// with synonym clusters before retrieval.
///
/// Processing never aborts a turn: if anything goes wrong the raw query
/// passes through with a default context.
pub struct QueryProcessor {
    entity_patterns: Vec<(String, Regex)>,
    typo_patterns: Vec<(Regex, &'static str)>,
    expansion_patterns: Vec<(Regex, &'static str)>,
    intent_patterns: Vec<(QueryIntent, Regex)>,
    specialty_patterns: Vec<(String, Vec<Regex>)>,
}

fn word_pattern(keyword: &str) -> String {
    format!(r"\b{}\b", regex::escape(keyword))
}

impl QueryProcessor {
    pub fn new() -> Result<Self> {
        let entity_patterns = lexicon::ENTITY_CATEGORIES
            .iter()
            .map(|(category, pattern)| {
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map(|re| (category.to_string(), re))
                    .map_err(|e| SolaceError::Validation(format!("Bad entity pattern: {e}")))
            })
            .collect::<Result<Vec<_>>>()?;

        let typo_patterns = lexicon::TYPO_CORRECTIONS
            .iter()
            .map(|(pattern, replacement)| {
                Regex::new(pattern)
                    .map(|re| (re, *replacement))
                    .map_err(|e| SolaceError::Validation(format!("Bad typo pattern: {e}")))
            })
            .collect::<Result<Vec<_>>>()?;

        let expansion_patterns = lexicon::EXPANSIONS
            .iter()
            .map(|(topic, cluster)| {
                Regex::new(&word_pattern(topic))
                    .map(|re| (re, *cluster))
                    .map_err(|e| SolaceError::Validation(format!("Bad expansion pattern: {e}")))
            })
            .collect::<Result<Vec<_>>>()?;

        let intent_patterns = [
            (QueryIntent::Definition, lexicon::INTENT_DEFINITION),
            (QueryIntent::Treatment, lexicon::INTENT_TREATMENT),
            (QueryIntent::Diagnosis, lexicon::INTENT_DIAGNOSIS),
            (QueryIntent::Prevention, lexicon::INTENT_PREVENTION),
        ]
        .into_iter()
        .map(|(intent, pattern)| {
            Regex::new(pattern)
                .map(|re| (intent, re))
                .map_err(|e| SolaceError::Validation(format!("Bad intent pattern: {e}")))
        })
        .collect::<Result<Vec<_>>>()?;

        let specialty_patterns = lexicon::SPECIALTY_KEYWORDS
            .iter()
            .map(|(specialty, keywords)| {
                keywords
                    .iter()
                    .map(|keyword| {
                        Regex::new(&word_pattern(keyword)).map_err(|e| {
                            SolaceError::Validation(format!("Bad specialty pattern: {e}"))
                        })
                    })
                    .collect::<Result<Vec<_>>>()
                    .map(|res| (specialty.to_string(), res))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            entity_patterns,
            typo_patterns,
            expansion_patterns,
            intent_patterns,
            specialty_patterns,
        })
    }

    pub fn process(&self, raw_query: &str) -> QueryContext {
        let normalized_text = self.normalize(raw_query);
        let extracted_entities = self.extract_entities(raw_query);
        let intent = self.classify_intent(&normalized_text);
        let specialty = self.detect_specialty(&normalized_text);
        let expanded_text = self.expand(raw_query, &normalized_text);

        tracing::debug!(
            intent = intent.as_str(),
            specialty = specialty.as_deref().unwrap_or("none"),
            entities = extracted_entities.len(),
            "Processed query"
        );

        QueryContext {
            raw_text: raw_query.to_string(),
            normalized_text,
            expanded_text,
            extracted_entities,
            intent,
            specialty,
        }
    }

    fn normalize(&self, query: &str) -> String {
        let mut normalized = query.to_lowercase();
        for (pattern, replacement) in &self.typo_patterns {
            normalized = pattern.replace_all(&normalized, *replacement).into_owned();
        }
        normalized
    }

    /// Collect all case-insensitive matches per category, deduplicated.
    pub fn extract_entities(&self, text: &str) -> BTreeMap<String, Vec<String>> {
        let mut entities = BTreeMap::new();

        for (category, pattern) in &self.entity_patterns {
            let mut matches: Vec<String> = pattern
                .find_iter(text)
                .map(|m| m.as_str().to_lowercase())
                .collect();
            matches.sort();
            matches.dedup();

            if !matches.is_empty() {
                entities.insert(category.clone(), matches);
            }
        }

        entities
    }

    /// Priority order: definition beats treatment beats diagnosis beats
    /// prevention; everything else is general.
    fn classify_intent(&self, text: &str) -> QueryIntent {
        for (intent, pattern) in &self.intent_patterns {
            if pattern.is_match(text) {
                return *intent;
            }
        }
        QueryIntent::General
    }

    fn detect_specialty(&self, text: &str) -> Option<String> {
        for (specialty, keywords) in &self.specialty_patterns {
            if keywords.iter().any(|keyword| keyword.is_match(text)) {
                return Some(specialty.clone());
            }
        }
        None
    }

    fn expand(&self, raw_query: &str, normalized: &str) -> String {
        let mut expanded = raw_query.to_string();
        for (pattern, cluster) in &self.expansion_patterns {
            if pattern.is_match(normalized) {
                expanded.push(' ');
                expanded.push_str(cluster);
            }
        }
        expanded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn processor() -> QueryProcessor {
        QueryProcessor::new().unwrap()
    }

    #[test]
    fn test_normalization_fixes_typos() {
        let ctx = processor().process("Im so depressed about ur advice");
        assert!(ctx.normalized_text.contains("i'm"));
        assert!(ctx.normalized_text.contains("depression"));
        assert!(ctx.normalized_text.contains("your"));
    }

    #[test]
    fn test_intent_priority_definition_wins() {
        let ctx = processor().process("What is the best therapy for anxiety?");
        // "what is" and "therapy" both match; definition has priority.
        assert_eq!(ctx.intent, QueryIntent::Definition);
    }

    #[test]
    fn test_intent_treatment() {
        let ctx = processor().process("how do I manage panic attacks with medication");
        assert_eq!(ctx.intent, QueryIntent::Treatment);
    }

    #[test]
    fn test_intent_default_general() {
        let ctx = processor().process("my week was rough");
        assert_eq!(ctx.intent, QueryIntent::General);
    }

    #[test]
    fn test_entity_extraction_deduplicates() {
        let ctx = processor().process("Anxiety, anxiety and more ANXIETY plus insomnia");
        let mental = ctx.extracted_entities.get("mental_health").unwrap();
        assert_eq!(
            mental.iter().filter(|e| e.as_str() == "anxiety").count(),
            1
        );
        assert!(ctx
            .extracted_entities
            .get("symptom")
            .unwrap()
            .contains(&"insomnia".to_string()));
    }

    #[test]
    fn test_specialty_detection() {
        let ctx = processor().process("I think I need counseling for my mental health");
        assert_eq!(ctx.specialty.as_deref(), Some("psychiatry"));

        let ctx = processor().process("my knee hurts when I run");
        assert!(ctx.specialty.is_none());
    }

    #[test]
    fn test_expansion_appends_synonym_clusters() {
        let ctx = processor().process("I am struggling with stress");
        assert!(ctx.expanded_text.starts_with("I am struggling with stress"));
        assert!(ctx.expanded_text.contains("pressure tension burnout"));
    }

    #[test]
    fn test_expansion_leaves_unrelated_query_untouched() {
        let ctx = processor().process("hello there");
        assert_eq!(ctx.expanded_text, "hello there");
    }

    #[test]
    fn test_expansion_matches_through_normalization() {
        // "depressed" normalizes to "depression", which then expands.
        let ctx = processor().process("I feel depressed");
        assert!(ctx.expanded_text.contains("mood sadness hopelessness"));
    }

    #[test]
    fn test_passthrough_context_defaults() {
        let ctx = QueryContext::passthrough("anything at all");
        assert_eq!(ctx.expanded_text, "anything at all");
        assert_eq!(ctx.intent, QueryIntent::General);
        assert!(ctx.extracted_entities.is_empty());
    }
}
