//! Graph store
//!
//! Chunks are stored as `Chunk` nodes keyed by id. Retrieval is a
//! case-insensitive substring match of a single anchor keyword against the
//! node text; there is no traversal.

pub mod keyword;
pub mod neo4j;

pub use keyword::*;
pub use neo4j::Neo4jGraphStore;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::types::AppResult;

#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Create the chunk node if missing and set its text
    async fn merge_chunk(&self, id: &str, text: &str) -> AppResult<()>;

    /// Detach and delete chunk nodes whose id starts with `id_prefix`
    async fn delete_by_id_prefix(&self, id_prefix: &str) -> AppResult<u64>;

    /// Texts of up to `limit` chunks whose lowercased text contains `keyword`
    async fn find_chunks_containing(&self, keyword: &str, limit: usize) -> AppResult<Vec<String>>;

    async fn health_check(&self) -> AppResult<()>;

    fn name(&self) -> &'static str;
}

/// In-process graph store, kept in insertion order
#[derive(Default)]
pub struct MemoryGraphStore {
    chunks: RwLock<Vec<(String, String)>>,
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.chunks.read().await.len()
    }
}

#[async_trait]
impl GraphStore for MemoryGraphStore {
    async fn merge_chunk(&self, id: &str, text: &str) -> AppResult<()> {
        let mut chunks = self.chunks.write().await;
        match chunks.iter_mut().find(|(existing, _)| existing == id) {
            Some((_, existing_text)) => *existing_text = text.to_string(),
            None => chunks.push((id.to_string(), text.to_string())),
        }
        Ok(())
    }

    async fn delete_by_id_prefix(&self, id_prefix: &str) -> AppResult<u64> {
        let mut chunks = self.chunks.write().await;
        let before = chunks.len();
        chunks.retain(|(id, _)| !id.starts_with(id_prefix));
        Ok((before - chunks.len()) as u64)
    }

    async fn find_chunks_containing(&self, keyword: &str, limit: usize) -> AppResult<Vec<String>> {
        let chunks = self.chunks.read().await;
        Ok(chunks
            .iter()
            .filter(|(_, text)| text.to_lowercase().contains(keyword))
            .take(limit)
            .map(|(_, text)| text.clone())
            .collect())
    }

    async fn health_check(&self) -> AppResult<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
