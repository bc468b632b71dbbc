// Vector storage and nearest-neighbour search

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::embeddings::document_processor::DocumentMetadata;
use crate::types::{AppError, AppResult};

/// A chunk ready to be written to a vector store
#[derive(Debug, Clone)]
pub struct EmbeddedChunk {
    pub id: String,
    pub text: String,
    pub metadata: DocumentMetadata,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub text: String,
    pub metadata: Option<DocumentMetadata>,
    /// Cosine similarity, higher is closer
    pub score: f64,
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert chunks, replacing any existing chunk with the same id in the collection
    async fn upsert(&self, collection: &str, chunks: &[EmbeddedChunk]) -> AppResult<()>;

    /// Remove every chunk in the collection whose id starts with `id_prefix`,
    /// returning how many were removed
    async fn delete_by_id_prefix(&self, collection: &str, id_prefix: &str) -> AppResult<u64>;

    async fn similarity_search(
        &self,
        collection: &str,
        embedding: &[f32],
        k: usize,
    ) -> AppResult<Vec<SearchResult>>;

    async fn health_check(&self) -> AppResult<()>;

    fn name(&self) -> &'static str;
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// In-process vector store; contents are lost on restart
#[derive(Default)]
pub struct MemoryVectorStore {
    collections: RwLock<HashMap<String, Vec<EmbeddedChunk>>>,
}

impl MemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert(&self, collection: &str, chunks: &[EmbeddedChunk]) -> AppResult<()> {
        let mut collections = self.collections.write().await;
        let entries = collections.entry(collection.to_string()).or_default();
        for chunk in chunks {
            match entries.iter_mut().find(|existing| existing.id == chunk.id) {
                Some(existing) => *existing = chunk.clone(),
                None => entries.push(chunk.clone()),
            }
        }
        Ok(())
    }

    async fn delete_by_id_prefix(&self, collection: &str, id_prefix: &str) -> AppResult<u64> {
        let mut collections = self.collections.write().await;
        let Some(entries) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let before = entries.len();
        entries.retain(|chunk| !chunk.id.starts_with(id_prefix));
        Ok((before - entries.len()) as u64)
    }

    async fn similarity_search(
        &self,
        collection: &str,
        embedding: &[f32],
        k: usize,
    ) -> AppResult<Vec<SearchResult>> {
        let collections = self.collections.read().await;
        let Some(entries) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        if let Some(first) = entries.first() {
            if first.embedding.len() != embedding.len() {
                return Err(AppError::VectorStore(format!(
                    "Query embedding has {} dimensions, collection '{}' stores {}",
                    embedding.len(),
                    collection,
                    first.embedding.len()
                )));
            }
        }

        let mut scored: Vec<SearchResult> = entries
            .iter()
            .map(|chunk| SearchResult {
                id: chunk.id.clone(),
                text: chunk.text.clone(),
                metadata: Some(chunk.metadata.clone()),
                score: cosine_similarity(&chunk.embedding, embedding),
            })
            .collect();
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);
        Ok(scored)
    }

    async fn health_check(&self) -> AppResult<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
