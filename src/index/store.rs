use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::config::DistanceMetric;
use crate::error::{Result, SolaceError};
use crate::models::{ChunkMetadata, RetrievalResult};

/// A chunk vector plus its persisted payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkPoint {
    pub id: String,
    pub vector: Vec<f32>,
    pub content: String,
    pub metadata: ChunkMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    pub collection_name: String,
    pub points_count: usize,
    pub dimension: Option<usize>,
}

struct StoredPoint {
    point: ChunkPoint,
    /// Insertion sequence, used as the stable tie-breaker.
    seq: u64,
}

struct IndexInner {
    points: Vec<StoredPoint>,
    next_seq: u64,
    dimension: Option<usize>,
}

/// In-memory vector store shared by concurrent turns.
///
/// Retrieval returns results by descending similarity under the configured
/// metric; ties resolve in insertion order. An empty index retrieves an
/// empty list, never an error.
pub struct VectorIndex {
    collection_name: String,
    metric: DistanceMetric,
    inner: RwLock<IndexInner>,
}

impl VectorIndex {
    pub fn new(collection_name: &str, metric: DistanceMetric) -> Self {
        Self {
            collection_name: collection_name.to_string(),
            metric,
            inner: RwLock::new(IndexInner {
                points: Vec::new(),
                next_seq: 0,
                dimension: None,
            }),
        }
    }

    /// Idempotent bootstrap: pins the expected vector dimension. Safe to
    /// call on every startup.
    pub fn ensure_collection(&self, dimension: usize) -> Result<()> {
        let mut inner = self.inner.write().expect("index lock poisoned");
        match inner.dimension {
            None => {
                inner.dimension = Some(dimension);
                tracing::info!(
                    collection = %self.collection_name,
                    dimension,
                    "Created collection"
                );
                Ok(())
            }
            Some(existing) if existing == dimension => Ok(()),
            Some(existing) => Err(SolaceError::Retrieval(format!(
                "Collection {} already exists with dimension {existing}, requested {dimension}",
                self.collection_name
            ))),
        }
    }

    /// Insert or replace points. A point whose id already exists is
    /// replaced, keeping the new insertion order.
    pub fn upsert(&self, points: Vec<ChunkPoint>) -> Result<usize> {
        let mut inner = self.inner.write().expect("index lock poisoned");

        let mut stored = 0;
        for point in points {
            if let Some(expected) = inner.dimension {
                if point.vector.len() != expected {
                    return Err(SolaceError::Retrieval(format!(
                        "Vector dimension {} does not match collection dimension {expected}",
                        point.vector.len()
                    )));
                }
            }

            inner.points.retain(|existing| existing.point.id != point.id);
            let seq = inner.next_seq;
            inner.next_seq += 1;
            inner.points.push(StoredPoint { point, seq });
            stored += 1;
        }

        tracing::debug!(collection = %self.collection_name, stored, "Upserted points");
        Ok(stored)
    }

    pub fn retrieve(
        &self,
        query_vector: &[f32],
        top_k: usize,
        metadata_filter: Option<&HashMap<String, String>>,
    ) -> Vec<RetrievalResult> {
        let inner = self.inner.read().expect("index lock poisoned");

        if inner.points.is_empty() || top_k == 0 {
            return Vec::new();
        }

        let mut scored: Vec<(f32, u64, &StoredPoint)> = inner
            .points
            .iter()
            .filter(|stored| matches_filter(&stored.point.metadata, metadata_filter))
            .filter(|stored| stored.point.vector.len() == query_vector.len())
            .map(|stored| {
                let score = similarity(self.metric, query_vector, &stored.point.vector);
                (score, stored.seq, stored)
            })
            .collect();

        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.1.cmp(&b.1))
        });

        scored
            .into_iter()
            .take(top_k)
            .map(|(score, _, stored)| RetrievalResult {
                id: stored.point.id.clone(),
                content: stored.point.content.clone(),
                score,
                metadata: stored.point.metadata.clone(),
            })
            .collect()
    }

    pub fn delete(&self, ids: &[String]) -> usize {
        let mut inner = self.inner.write().expect("index lock poisoned");
        let before = inner.points.len();
        inner
            .points
            .retain(|stored| !ids.contains(&stored.point.id));
        before - inner.points.len()
    }

    pub fn stats(&self) -> IndexStats {
        let inner = self.inner.read().expect("index lock poisoned");
        IndexStats {
            collection_name: self.collection_name.clone(),
            points_count: inner.points.len(),
            dimension: inner.dimension,
        }
    }

    /// Drop all points and reset the collection for a fresh start.
    pub fn wipe(&self) {
        let mut inner = self.inner.write().expect("index lock poisoned");
        inner.points.clear();
        inner.dimension = None;
        tracing::info!(collection = %self.collection_name, "Collection wiped");
    }
}

fn matches_filter(
    metadata: &ChunkMetadata,
    filter: Option<&HashMap<String, String>>,
) -> bool {
    let Some(filter) = filter else {
        return true;
    };

    filter.iter().all(|(key, value)| match key.as_str() {
        "source" => metadata.source == *value,
        "specialty" => metadata.specialty == *value,
        "section" => metadata.section == *value,
        _ => true,
    })
}

fn similarity(metric: DistanceMetric, a: &[f32], b: &[f32]) -> f32 {
    match metric {
        DistanceMetric::Cosine => {
            let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
            let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
            let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm_a == 0.0 || norm_b == 0.0 {
                0.0
            } else {
                dot / (norm_a * norm_b)
            }
        }
        DistanceMetric::Dot => a.iter().zip(b).map(|(x, y)| x * y).sum(),
        DistanceMetric::Euclidean => {
            let dist: f32 = a
                .iter()
                .zip(b)
                .map(|(x, y)| (x - y) * (x - y))
                .sum::<f32>()
                .sqrt();
            1.0 / (1.0 + dist)
        }
    }
}
