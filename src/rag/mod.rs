//! Retrieval-augmented generation
//!
//! - **ingest**: PDF → pages → chunks → (embeddings → vector store) + (nodes → graph store)
//! - **query**: question → vector context + keyword graph context → prompt → answer
//! - **prompt**: hybrid context assembly

pub mod ingest;
pub mod prompt;
pub mod query;

pub use ingest::{IngestReport, Ingestor};
pub use prompt::{build_prompt, join_context, HybridContext};
pub use query::{Answer, ChatSettings, RagPipeline, SourceStats};
