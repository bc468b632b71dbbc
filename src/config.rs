use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::env;
use std::str::FromStr;

use crate::graph::DEFAULT_FALLBACK_KEYWORD;
use crate::types::LLMProvider;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub ollama: OllamaConfig,
    pub llm: LLMConfig,
    pub vector_store: VectorStoreConfig,
    pub graph_store: GraphStoreConfig,
    pub retrieval: RetrievalConfig,
    pub ingest: IngestConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
    pub startup_retries: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OllamaConfig {
    pub base_url: String,
    pub embedding_model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LLMConfig {
    pub provider: LLMProvider,
    pub model: String,
    pub base_url: String,
    pub api_key: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorBackend {
    Postgres,
    Memory,
}

impl FromStr for VectorBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "pgvector" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(anyhow!("Unsupported vector store backend: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphBackend {
    Neo4j,
    Memory,
}

impl FromStr for GraphBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "neo4j" => Ok(Self::Neo4j),
            "memory" => Ok(Self::Memory),
            other => Err(anyhow!("Unsupported graph store backend: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VectorStoreConfig {
    pub backend: VectorBackend,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub collection: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphStoreConfig {
    pub backend: GraphBackend,
    pub uri: String,
    pub user: String,
    pub password: String,
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetrievalConfig {
    pub vector_k: usize,
    pub graph_limit: usize,
    pub fallback_keyword: String,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            vector_k: 3,
            graph_limit: 2,
            fallback_keyword: DEFAULT_FALLBACK_KEYWORD.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub embed_batch_size: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            embed_batch_size: 32,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub log_dir: Option<String>,
}

/// Read a variable, falling back to `default`, and parse it.
fn parse_var<T>(vars: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = vars(key).unwrap_or_else(|| default.to_string());
    raw.parse::<T>()
        .map_err(|e| anyhow!("Invalid value for {}: {} ({})", key, raw, e))
}

fn optional_var<T>(vars: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match vars(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow!("Invalid value for {}: {} ({})", key, raw, e)),
        _ => Ok(None),
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build the configuration from a variable lookup
    pub fn from_vars(vars: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| vars(key).unwrap_or_else(|| default.to_string());

        let ollama_url = var("OLLAMA_URL", "http://localhost:11434");

        let vector_backend: VectorBackend = parse_var(&vars, "VECTOR_STORE", "postgres")?;
        let database_url = vars("DATABASE_URL").filter(|s| !s.trim().is_empty());
        if vector_backend == VectorBackend::Postgres && database_url.is_none() {
            return Err(anyhow!("DATABASE_URL must be set when VECTOR_STORE=postgres"));
        }

        let fallback_keyword = var("FALLBACK_KEYWORD", DEFAULT_FALLBACK_KEYWORD)
            .trim()
            .to_lowercase();
        if fallback_keyword.is_empty() {
            return Err(anyhow!("FALLBACK_KEYWORD must not be empty"));
        }

        let config = Self {
            server: ServerConfig {
                port: parse_var(&vars, "PORT", "8080")?,
                host: var("HOST", "0.0.0.0"),
                cors_allowed_origins: split_origins(&var("ALLOWED_ORIGINS", "*")),
                startup_retries: parse_var(&vars, "STARTUP_RETRIES", "5")?,
            },
            ollama: OllamaConfig {
                base_url: ollama_url.clone(),
                embedding_model: var("EMBEDDING_MODEL", "nomic-embed-text"),
            },
            llm: LLMConfig {
                provider: var("LLM_PROVIDER", "ollama")
                    .parse()
                    .context("LLM_PROVIDER")?,
                model: var("CHAT_MODEL", "gemma3"),
                base_url: vars("LLM_BASE_URL").unwrap_or(ollama_url),
                api_key: vars("LLM_API_KEY").unwrap_or_default(),
                temperature: optional_var(&vars, "LLM_TEMPERATURE")?,
                max_tokens: optional_var(&vars, "LLM_MAX_TOKENS")?,
            },
            vector_store: VectorStoreConfig {
                backend: vector_backend,
                database_url,
                max_connections: parse_var(&vars, "DB_MAX_CONNECTIONS", "5")?,
                collection: var("VECTOR_COLLECTION", "veritas_knowledge"),
            },
            graph_store: GraphStoreConfig {
                backend: parse_var(&vars, "GRAPH_STORE", "neo4j")?,
                uri: var("NEO4J_URI", "http://localhost:7474"),
                user: var("NEO4J_USER", "neo4j"),
                password: var("NEO4J_PASSWORD", "veritas_password"),
                database: var("NEO4J_DATABASE", "neo4j"),
            },
            retrieval: RetrievalConfig {
                vector_k: parse_var(&vars, "VECTOR_K", "3")?,
                graph_limit: parse_var(&vars, "GRAPH_LIMIT", "2")?,
                fallback_keyword,
            },
            ingest: IngestConfig {
                chunk_size: parse_var(&vars, "CHUNK_SIZE", "1000")?,
                chunk_overlap: parse_var(&vars, "CHUNK_OVERLAP", "200")?,
                embed_batch_size: parse_var(&vars, "EMBED_BATCH_SIZE", "32")?,
            },
            logging: LoggingConfig {
                log_dir: vars("LOG_DIR").filter(|s| !s.trim().is_empty()),
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.ingest.chunk_size == 0 {
            return Err(anyhow!("CHUNK_SIZE must be greater than zero"));
        }
        if self.ingest.chunk_overlap >= self.ingest.chunk_size {
            return Err(anyhow!(
                "CHUNK_OVERLAP ({}) must be smaller than CHUNK_SIZE ({})",
                self.ingest.chunk_overlap,
                self.ingest.chunk_size
            ));
        }
        if self.ingest.embed_batch_size == 0 {
            return Err(anyhow!("EMBED_BATCH_SIZE must be greater than zero"));
        }
        if self.retrieval.vector_k == 0 {
            return Err(anyhow!("VECTOR_K must be greater than zero"));
        }
        Ok(())
    }

    /// Configuration wired to in-process stores, used by tests and local demos.
    pub fn in_memory() -> Self {
        Self {
            server: ServerConfig {
                port: 8080,
                host: "127.0.0.1".to_string(),
                cors_allowed_origins: vec!["*".to_string()],
                startup_retries: 1,
            },
            ollama: OllamaConfig {
                base_url: "http://localhost:11434".to_string(),
                embedding_model: "nomic-embed-text".to_string(),
            },
            llm: LLMConfig {
                provider: LLMProvider::Ollama,
                model: "gemma3".to_string(),
                base_url: "http://localhost:11434".to_string(),
                api_key: String::new(),
                temperature: None,
                max_tokens: None,
            },
            vector_store: VectorStoreConfig {
                backend: VectorBackend::Memory,
                database_url: None,
                max_connections: 1,
                collection: "veritas_knowledge".to_string(),
            },
            graph_store: GraphStoreConfig {
                backend: GraphBackend::Memory,
                uri: "http://localhost:7474".to_string(),
                user: "neo4j".to_string(),
                password: String::new(),
                database: "neo4j".to_string(),
            },
            retrieval: RetrievalConfig::default(),
            ingest: IngestConfig::default(),
            logging: LoggingConfig { log_dir: None },
        }
    }
}
