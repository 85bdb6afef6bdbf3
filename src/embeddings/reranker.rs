use fastembed::{
    RerankInitOptions, RerankResult as FastEmbedRerankResult, RerankerModel, TextRerank,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::RerankerConfig;
use crate::error::{Result, SolaceError};

/// Result from a reranking pass.
#[derive(Debug, Clone)]
pub struct RerankResult {
    pub document: String,
    pub score: f32,
    pub index: usize,
}

#[derive(Clone)]
enum RerankerBackend {
    Local(Arc<Mutex<TextRerank>>),
    Mock(Arc<Vec<RerankResult>>),
}

/// Cross-encoder reranker wrapping fastembed's TextRerank.
///
/// Reranking is strictly an optimization: callers fall back to the
/// original retrieval order when this provider is disabled or errors.
#[derive(Clone)]
pub struct RerankerProvider {
    backend: Option<RerankerBackend>,
    batch_size: usize,
}

impl From<FastEmbedRerankResult> for RerankResult {
    fn from(result: FastEmbedRerankResult) -> Self {
        Self {
            document: result.document.unwrap_or_default(),
            score: result.score,
            index: result.index,
        }
    }
}

impl RerankerProvider {
    pub async fn new_async(config: &RerankerConfig) -> Result<Self> {
        if !config.enabled {
            return Ok(Self {
                backend: None,
                batch_size: config.batch_size,
            });
        }

        let reranker_model = Self::parse_model(&config.model)?;

        let model = TextRerank::try_new(
            RerankInitOptions::new(reranker_model)
                .with_cache_dir(PathBuf::from(&config.cache_dir))
                .with_show_download_progress(true),
        )
        .map_err(|e| SolaceError::Rerank(format!("Failed to initialize reranker: {e}")))?;

        Ok(Self {
            backend: Some(RerankerBackend::Local(Arc::new(Mutex::new(model)))),
            batch_size: config.batch_size,
        })
    }

    fn parse_model(model_name: &str) -> Result<RerankerModel> {
        match model_name {
            "bge-reranker-base" | "BAAI/bge-reranker-base" => Ok(RerankerModel::BGERerankerBase),
            "bge-reranker-v2-m3" | "rozgo/bge-reranker-v2-m3" => {
                Ok(RerankerModel::BGERerankerV2M3)
            }
            "jina-reranker-v1-turbo-en" | "jinaai/jina-reranker-v1-turbo-en" => {
                Ok(RerankerModel::JINARerankerV1TurboEn)
            }
            _ => Err(SolaceError::Rerank(format!(
                "Unsupported reranker model: {model_name}. Supported models: bge-reranker-base, bge-reranker-v2-m3, jina-reranker-v1-turbo-en"
            ))),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    /// Score (query, document) pairs with the cross-encoder and return the
    /// top_k documents by descending relevance.
    pub async fn rerank(
        &self,
        query: &str,
        documents: Vec<String>,
        top_k: usize,
    ) -> Result<Vec<RerankResult>> {
        let backend = self
            .backend
            .as_ref()
            .ok_or_else(|| SolaceError::Rerank("Reranker is not enabled".to_string()))?;

        if documents.is_empty() {
            return Ok(Vec::new());
        }

        match backend {
            RerankerBackend::Local(model) => {
                let mut model = model.lock().await;
                let doc_refs: Vec<&str> = documents.iter().map(|s| s.as_str()).collect();
                let results = model
                    .rerank(query, &doc_refs, true, Some(self.batch_size))
                    .map_err(|e| SolaceError::Rerank(format!("Reranking failed: {e}")))?;

                Ok(results
                    .into_iter()
                    .take(top_k)
                    .map(RerankResult::from)
                    .collect())
            }
            RerankerBackend::Mock(results) => Ok(results.iter().take(top_k).cloned().collect()),
        }
    }

    pub fn new_mock(results: Vec<RerankResult>) -> Self {
        Self {
            backend: Some(RerankerBackend::Mock(Arc::new(results))),
            batch_size: 64,
        }
    }
}
