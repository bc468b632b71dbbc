use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::info;

use crate::config::{Config, GraphBackend, VectorBackend};
use crate::db::PgVectorStore;
use crate::embeddings::{Embedder, MemoryVectorStore, OllamaEmbedder, RecursiveTextSplitter, VectorStore};
use crate::graph::{GraphStore, MemoryGraphStore, Neo4jGraphStore};
use crate::llm::{LLMProviderConfig, LLM};
use crate::rag::{ChatSettings, Ingestor, RagPipeline};
use crate::utils::with_retry;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub pipeline: Arc<RagPipeline>,
    pub ingestor: Arc<Ingestor>,
}

/// Backends shared by the query and ingestion pipelines
pub struct Stores {
    pub embedder: Arc<dyn Embedder>,
    pub vector_store: Arc<dyn VectorStore>,
    pub graph_store: Arc<dyn GraphStore>,
}

impl Stores {
    /// Connect to the configured backends, retrying while they come up
    pub async fn connect(config: &Config) -> Result<Self> {
        let retries = config.server.startup_retries;
        let backoff = Duration::from_secs(1);

        let vector_store: Arc<dyn VectorStore> = match config.vector_store.backend {
            VectorBackend::Postgres => {
                info!("Connecting to Postgres (pgvector)...");
                let pool = with_retry(|| crate::db::create_pool(&config.vector_store), retries, backoff).await?;
                info!("Running database migrations...");
                crate::db::run_migrations(&pool).await?;
                info!("Database migrations completed");
                Arc::new(PgVectorStore::new(pool))
            }
            VectorBackend::Memory => {
                info!("Using in-memory vector store");
                Arc::new(MemoryVectorStore::new())
            }
        };

        let graph_store: Arc<dyn GraphStore> = match config.graph_store.backend {
            GraphBackend::Neo4j => {
                info!(uri = %config.graph_store.uri, "Connecting to Neo4j...");
                let store = Neo4jGraphStore::new(&config.graph_store);
                with_retry(|| store.ensure_schema(), retries, backoff).await?;
                Arc::new(store)
            }
            GraphBackend::Memory => {
                info!("Using in-memory graph store");
                Arc::new(MemoryGraphStore::new())
            }
        };

        info!(url = %config.ollama.base_url, model = %config.ollama.embedding_model, "Using Ollama embeddings");
        let embedder: Arc<dyn Embedder> = Arc::new(OllamaEmbedder::new(
            &config.ollama.base_url,
            &config.ollama.embedding_model,
        ));

        Ok(Self {
            embedder,
            vector_store,
            graph_store,
        })
    }
}

impl AppState {
    pub fn new(config: Config, stores: Stores, llm: LLM) -> Result<Self> {
        let pipeline = RagPipeline::new(
            stores.embedder.clone(),
            stores.vector_store.clone(),
            stores.graph_store.clone(),
            Arc::new(llm),
            config.vector_store.collection.clone(),
            config.retrieval.clone(),
            ChatSettings {
                model: config.llm.model.clone(),
                temperature: config.llm.temperature,
                max_tokens: config.llm.max_tokens,
            },
        );

        let ingestor = Ingestor::new(
            stores.embedder,
            stores.vector_store,
            stores.graph_store,
            RecursiveTextSplitter::new(config.ingest.chunk_size, config.ingest.chunk_overlap)?,
            config.vector_store.collection.clone(),
            config.ingest.embed_batch_size,
        );

        Ok(Self {
            config,
            pipeline: Arc::new(pipeline),
            ingestor: Arc::new(ingestor),
        })
    }

    pub async fn from_config(config: Config) -> Result<Self> {
        let stores = Stores::connect(&config).await?;
        let llm = LLM::new(LLMProviderConfig::from(&config.llm));
        info!(provider = llm.provider_name(), model = %config.llm.model, "Chat model configured");
        Self::new(config, stores, llm)
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AskRequest {
    pub query: String,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub vector_store: String,
    pub graph_store: String,
}
