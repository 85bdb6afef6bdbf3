use serde::Deserialize;
use std::env;
use std::str::FromStr;

use crate::error::{Result, SolaceError};

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub embeddings: EmbeddingsConfig,
    pub retrieval: RetrievalConfig,
    pub cache: CacheConfig,
    pub llm: Option<LlmConfig>,
    pub reranker: Option<RerankerConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingsConfig {
    pub model: String,
    pub dimensions: usize,
    pub batch_size: usize,
}

/// How documents are cut into retrievable chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkingStrategy {
    Fixed,
    Semantic,
    Hybrid,
}

impl FromStr for ChunkingStrategy {
    type Err = SolaceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "fixed" => Ok(ChunkingStrategy::Fixed),
            "semantic" => Ok(ChunkingStrategy::Semantic),
            "hybrid" => Ok(ChunkingStrategy::Hybrid),
            other => Err(SolaceError::Validation(format!(
                "Unknown chunking strategy: {other}. Expected fixed, semantic or hybrid."
            ))),
        }
    }
}

/// Distance metric used by the vector index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    Cosine,
    Dot,
    Euclidean,
}

impl FromStr for DistanceMetric {
    type Err = SolaceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "cosine" => Ok(DistanceMetric::Cosine),
            "dot" => Ok(DistanceMetric::Dot),
            "euclidean" => Ok(DistanceMetric::Euclidean),
            other => Err(SolaceError::Validation(format!(
                "Unknown distance metric: {other}. Expected cosine, dot or euclidean."
            ))),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetrievalConfig {
    pub collection_name: String,
    /// Chunk budget in characters.
    pub chunk_size: usize,
    /// Back-step between adjacent fixed-window chunks, in characters.
    pub chunk_overlap: usize,
    pub chunking_strategy: ChunkingStrategy,
    pub top_k: usize,
    pub reranker_top_k: usize,
    pub min_retrieval_confidence: f32,
    pub distance_metric: DistanceMetric,
}

impl RetrievalConfig {
    /// An overlap that reaches the chunk size would make the fixed window
    /// never advance.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(SolaceError::Validation(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(SolaceError::Validation(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub max_entries: usize,
    pub similarity_threshold: f32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 100,
            similarity_threshold: 0.85,
        }
    }
}

/// LLM configuration for the generation and escalation tiers.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

/// Reranker configuration for improving retrieval result ordering.
#[derive(Debug, Clone, Deserialize)]
pub struct RerankerConfig {
    pub enabled: bool,
    pub model: String,
    pub cache_dir: String,
    pub batch_size: usize,
}

impl Default for RerankerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            model: "bge-reranker-base".to_string(),
            cache_dir: ".fastembed_cache".to_string(),
            batch_size: 64,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            embeddings: EmbeddingsConfig {
                model: env::var("EMBEDDING_MODEL")
                    .unwrap_or_else(|_| "all-MiniLM-L6-v2".to_string()),
                dimensions: parse_env_or("EMBEDDING_DIMENSIONS", 384),
                batch_size: parse_env_or("EMBEDDING_BATCH_SIZE", 256),
            },
            retrieval: RetrievalConfig {
                collection_name: env::var("COLLECTION_NAME")
                    .unwrap_or_else(|_| "support_articles".to_string()),
                chunk_size: parse_env_or("CHUNK_SIZE", 256),
                chunk_overlap: parse_env_or("CHUNK_OVERLAP", 50),
                chunking_strategy: env::var("CHUNKING_STRATEGY")
                    .ok()
                    .and_then(|raw| match raw.parse() {
                        Ok(strategy) => Some(strategy),
                        Err(e) => {
                            tracing::warn!("{e}. Using hybrid.");
                            None
                        }
                    })
                    .unwrap_or(ChunkingStrategy::Hybrid),
                top_k: parse_env_or("TOP_K", 5),
                reranker_top_k: parse_env_or("RERANK_TOP_K", 5),
                min_retrieval_confidence: parse_env_or("MIN_RETRIEVAL_CONFIDENCE", 0.7),
                distance_metric: env::var("DISTANCE_METRIC")
                    .ok()
                    .and_then(|raw| match raw.parse() {
                        Ok(metric) => Some(metric),
                        Err(e) => {
                            tracing::warn!("{e}. Using cosine.");
                            None
                        }
                    })
                    .unwrap_or(DistanceMetric::Cosine),
            },
            cache: CacheConfig {
                max_entries: parse_env_or("CACHE_MAX_ENTRIES", 100),
                similarity_threshold: parse_env_or("CACHE_SIMILARITY_THRESHOLD", 0.85),
            },
            llm: env::var("LLM_MODEL").ok().map(|model| LlmConfig {
                model,
                api_key: env::var("LLM_API_KEY").ok(),
                base_url: env::var("LLM_BASE_URL").ok(),
                timeout_secs: parse_env_or("LLM_TIMEOUT", 30),
                max_retries: parse_env_or("LLM_MAX_RETRIES", 3),
            }),
            reranker: {
                let enabled = parse_env_or("RERANK_ENABLED", false);

                if enabled {
                    Some(RerankerConfig {
                        enabled,
                        model: env::var("RERANK_MODEL")
                            .unwrap_or_else(|_| "bge-reranker-base".to_string()),
                        cache_dir: env::var("RERANK_CACHE_DIR")
                            .unwrap_or_else(|_| ".fastembed_cache".to_string()),
                        batch_size: parse_env_or("RERANK_BATCH_SIZE", 64),
                    })
                } else {
                    None
                }
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}

/// Known LLM providers that use OpenAI-compatible APIs
pub const KNOWN_LLM_PROVIDERS: &[&str] = &["openai", "openrouter", "ollama", "lmstudio"];

/// Parse an LLM model name into (provider, model) tuple.
pub fn parse_llm_provider_model(model: &str) -> (&str, &str) {
    if let Some((prefix, rest)) = model.split_once('/') {
        let prefix_lower = prefix.to_lowercase();
        if KNOWN_LLM_PROVIDERS.contains(&prefix_lower.as_str()) {
            return (prefix, rest);
        }
    }
    // Default to treating the whole string as a local model
    ("local", model)
}
