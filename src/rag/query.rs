//! Question answering over the ingested document
//!
//! ```text
//! query ──┬─> embed ─> vector similarity search (k) ─┐
//!         └─> anchor keyword ─> graph substring match ┴─> prompt ─> chat model
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::RetrievalConfig;
use crate::embeddings::{Embedder, VectorStore};
use crate::graph::{extract_keyword, GraphStore};
use crate::llm::LLM;
use crate::rag::prompt::HybridContext;
use crate::types::{AppError, AppResult, LLMMessage, LLMRequest};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceStats {
    pub vector_chunks: usize,
    pub graph_nodes: usize,
    pub keyword_used: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    pub sources: SourceStats,
}

/// Chat model settings applied to every question
#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

pub struct RagPipeline {
    embedder: Arc<dyn Embedder>,
    vector_store: Arc<dyn VectorStore>,
    graph_store: Arc<dyn GraphStore>,
    llm: Arc<LLM>,
    collection: String,
    retrieval: RetrievalConfig,
    chat: ChatSettings,
}

impl RagPipeline {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        vector_store: Arc<dyn VectorStore>,
        graph_store: Arc<dyn GraphStore>,
        llm: Arc<LLM>,
        collection: impl Into<String>,
        retrieval: RetrievalConfig,
        chat: ChatSettings,
    ) -> Self {
        Self {
            embedder,
            vector_store,
            graph_store,
            llm,
            collection: collection.into(),
            retrieval,
            chat,
        }
    }

    pub fn vector_store(&self) -> &Arc<dyn VectorStore> {
        &self.vector_store
    }

    pub fn graph_store(&self) -> &Arc<dyn GraphStore> {
        &self.graph_store
    }

    /// Top-k chunk texts by embedding similarity
    pub async fn vector_context(&self, query: &str) -> AppResult<Vec<String>> {
        let embedding = self.embedder.embed_query(query).await?;
        let results = self
            .vector_store
            .similarity_search(&self.collection, &embedding, self.retrieval.vector_k)
            .await?;
        Ok(results.into_iter().map(|r| r.text).collect())
    }

    /// Chunk texts containing the query's anchor keyword, with the keyword used
    pub async fn graph_context(&self, query: &str) -> (String, Vec<String>) {
        let keyword = extract_keyword(query, &self.retrieval.fallback_keyword);
        info!(keyword = %keyword, "Graph searching for keyword");

        match self
            .graph_store
            .find_chunks_containing(&keyword, self.retrieval.graph_limit)
            .await
        {
            Ok(chunks) => (keyword, chunks),
            Err(e) => {
                warn!(error = %e, keyword = %keyword, "Graph lookup failed, continuing without graph context");
                (keyword, Vec::new())
            }
        }
    }

    pub async fn retrieve(&self, query: &str) -> AppResult<HybridContext> {
        let (vector_chunks, (keyword, graph_chunks)) =
            tokio::join!(self.vector_context(query), self.graph_context(query));

        Ok(HybridContext {
            vector_chunks: vector_chunks?,
            graph_chunks,
            keyword,
        })
    }

    pub async fn ask(&self, query: &str) -> AppResult<Answer> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::InvalidRequest("query must not be empty".to_string()));
        }
        info!(query_len = query.len(), "Answering question");

        let context = self.retrieve(query).await?;
        let prompt = context.build_prompt(query);

        let request = LLMRequest {
            model: self.chat.model.clone(),
            messages: vec![LLMMessage::user(prompt)],
            max_tokens: self.chat.max_tokens,
            temperature: self.chat.temperature,
        };

        let response = self.llm.create_chat_completion(&request).await?;
        info!(
            provider = self.llm.provider_name(),
            vector_chunks = context.vector_chunks.len(),
            graph_nodes = context.graph_chunks.len(),
            total_tokens = response.usage.total_tokens,
            "Answer generated"
        );

        Ok(Answer {
            answer: response.content,
            sources: SourceStats {
                vector_chunks: context.vector_chunks.len(),
                graph_nodes: context.graph_chunks.len(),
                keyword_used: context.keyword,
            },
        })
    }
}
