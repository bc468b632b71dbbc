// Document loading, chunking, embeddings and vector search

pub mod document_processor;
pub mod embedder;
pub mod text_chunker;
pub mod vector_search;

pub use document_processor::*;
pub use embedder::*;
pub use text_chunker::*;
pub use vector_search::*;
