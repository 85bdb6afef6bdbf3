use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};

use crate::config::EmbeddingsConfig;
use crate::error::{Result, SolaceError};

#[derive(Clone)]
enum EmbeddingBackend {
    Local {
        model: Arc<Mutex<TextEmbedding>>,
        batch_size: usize,
    },
    /// Deterministic text-hash vectors, for tests.
    Mock,
}

/// Thread-safe embedding provider wrapping a local fastembed model.
///
/// Model inference is blocking, so calls are dispatched to the blocking
/// pool; the model itself is created once and shared behind a mutex.
#[derive(Clone)]
pub struct EmbeddingProvider {
    backend: EmbeddingBackend,
    dimensions: usize,
}

fn resolve_embedding_model(model_name: &str) -> Result<EmbeddingModel> {
    match model_name {
        "all-MiniLM-L6-v2" | "sentence-transformers/all-MiniLM-L6-v2" => {
            Ok(EmbeddingModel::AllMiniLML6V2)
        }
        "bge-small-en-v1.5" | "BAAI/bge-small-en-v1.5" => Ok(EmbeddingModel::BGESmallENV15),
        "bge-base-en-v1.5" | "BAAI/bge-base-en-v1.5" => Ok(EmbeddingModel::BGEBaseENV15),
        _ => Err(SolaceError::Embedding(format!(
            "Unsupported embedding model: {model_name}. Supported models: all-MiniLM-L6-v2, bge-small-en-v1.5, bge-base-en-v1.5"
        ))),
    }
}

impl EmbeddingProvider {
    pub fn new(config: &EmbeddingsConfig) -> Result<Self> {
        let embedding_model = resolve_embedding_model(&config.model)?;

        let model = TextEmbedding::try_new(
            InitOptions::new(embedding_model).with_show_download_progress(true),
        )
        .map_err(|e| SolaceError::Embedding(format!("Failed to initialize embedding model: {e}")))?;

        Ok(Self {
            backend: EmbeddingBackend::Local {
                model: Arc::new(Mutex::new(model)),
                batch_size: config.batch_size,
            },
            dimensions: config.dimensions,
        })
    }

    /// Deterministic mock provider. Identical texts always embed to the
    /// same vector, so similarity assertions are reproducible.
    pub fn new_mock(dimensions: usize) -> Self {
        Self {
            backend: EmbeddingBackend::Mock,
            dimensions,
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        match &self.backend {
            EmbeddingBackend::Local { model, batch_size } => {
                let model = Arc::clone(model);
                let batch_size = *batch_size;
                tokio::task::spawn_blocking(move || {
                    let mut model = model.lock().map_err(|e| {
                        SolaceError::Embedding(format!("Embedding model lock poisoned: {e}"))
                    })?;
                    model
                        .embed(texts, Some(batch_size))
                        .map_err(|e| SolaceError::Embedding(e.to_string()))
                })
                .await
                .map_err(|e| SolaceError::Embedding(format!("Embedding worker failed: {e}")))?
            }
            EmbeddingBackend::Mock => Ok(texts
                .iter()
                .map(|text| mock_vector(text, self.dimensions))
                .collect()),
        }
    }

    pub async fn embed_single(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self.embed(vec![text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| SolaceError::Embedding("No embedding generated".to_string()))
    }

    pub async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        match &self.backend {
            EmbeddingBackend::Local { .. } => {
                // Local models use query: prefix
                let prefixed = format!("query: {query}");
                self.embed_single(&prefixed).await
            }
            EmbeddingBackend::Mock => self.embed_single(query).await,
        }
    }

    pub async fn embed_passages(&self, passages: Vec<String>) -> Result<Vec<Vec<f32>>> {
        match &self.backend {
            EmbeddingBackend::Local { .. } => {
                let prefixed: Vec<String> = passages
                    .iter()
                    .map(|p| format!("passage: {p}"))
                    .collect();
                self.embed(prefixed).await
            }
            EmbeddingBackend::Mock => self.embed(passages).await,
        }
    }
}

/// Stable pseudo-embedding derived from the text hash.
pub fn mock_vector(text: &str, dimensions: usize) -> Vec<f32> {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    let mut state = hasher.finish();

    (0..dimensions)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((state >> 33) as f32 / (u32::MAX >> 1) as f32) - 1.0
        })
        .collect()
}
