use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Granularity at which a chunk was cut from its document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Document,
    Section,
    Paragraph,
    Sentence,
    Sliding,
}

/// Payload persisted alongside each chunk vector.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub source: String,
    pub specialty: String,
    pub section: String,
    pub chunk_number: usize,
    pub total_chunks: usize,
    /// Categorized domain entities found in the chunk text.
    pub medical_entities: BTreeMap<String, Vec<String>>,
}

/// A retrievable sub-unit of a document. Never mutated after indexing;
/// re-ingestion deletes and replaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub content: String,
    pub section: String,
    pub granularity: Granularity,
    pub metadata: ChunkMetadata,
}

impl Chunk {
    pub fn new(content: String, section: String, granularity: Granularity) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            content,
            section,
            granularity,
            metadata: ChunkMetadata::default(),
        }
    }

    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }
}

/// Ephemeral per-query retrieval hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub id: String,
    pub content: String,
    pub score: f32,
    pub metadata: ChunkMetadata,
}
