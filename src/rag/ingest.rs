// PDF ingestion into the vector store and the graph store

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::embeddings::{
    DocumentProcessor, EmbeddedChunk, Embedder, PageDocument, RecursiveTextSplitter, VectorStore,
};
use crate::graph::GraphStore;
use crate::types::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IngestReport {
    pub document: String,
    pub pages: usize,
    pub chunks: usize,
}

pub struct Ingestor {
    embedder: Arc<dyn Embedder>,
    vector_store: Arc<dyn VectorStore>,
    graph_store: Arc<dyn GraphStore>,
    splitter: RecursiveTextSplitter,
    collection: String,
    batch_size: usize,
}

/// Document name used as the chunk id prefix: the file stem of `source`
pub fn document_name(source: &str) -> String {
    let stem = Path::new(source)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(source)
        .trim();
    if stem.is_empty() {
        "document".to_string()
    } else {
        stem.to_string()
    }
}

/// Id prefix shared by every chunk of `document`
pub fn document_prefix(document: &str) -> String {
    format!("{}/", document)
}

pub fn chunk_id(document: &str, index: usize) -> String {
    format!("{}chunk_{}", document_prefix(document), index)
}

impl Ingestor {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        vector_store: Arc<dyn VectorStore>,
        graph_store: Arc<dyn GraphStore>,
        splitter: RecursiveTextSplitter,
        collection: impl Into<String>,
        batch_size: usize,
    ) -> Self {
        Self {
            embedder,
            vector_store,
            graph_store,
            splitter,
            collection: collection.into(),
            batch_size: batch_size.max(1),
        }
    }

    pub async fn ingest_pdf(&self, path: impl AsRef<Path>) -> AppResult<IngestReport> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading PDF for ingestion");
        let pages = DocumentProcessor::load_pdf(path).await?;
        self.ingest_pages(&path.display().to_string(), pages).await
    }

    pub async fn ingest_bytes(&self, content: Bytes, source: &str) -> AppResult<IngestReport> {
        let pages = DocumentProcessor::load_pdf_bytes(content, source).await?;
        self.ingest_pages(source, pages).await
    }

    pub async fn ingest_pages(&self, source: &str, pages: Vec<PageDocument>) -> AppResult<IngestReport> {
        let document = document_name(source);
        let splits = self.splitter.split_documents(&pages);
        info!(document = %document, pages = pages.len(), chunks = splits.len(), "Split document into chunks");

        if splits.is_empty() {
            return Err(AppError::DocumentProcessing(format!(
                "{} produced no chunks",
                source
            )));
        }

        // Embed the whole document first; the stores are untouched if this fails
        let mut chunks: Vec<EmbeddedChunk> = Vec::with_capacity(splits.len());
        for (batch_index, batch) in splits.chunks(self.batch_size).enumerate() {
            let texts: Vec<String> = batch.iter().map(|d| d.text.clone()).collect();
            let embeddings = self.embedder.embed_documents(&texts).await?;

            let offset = batch_index * self.batch_size;
            chunks.extend(batch.iter().zip(embeddings).enumerate().map(|(i, (doc, embedding))| {
                EmbeddedChunk {
                    id: chunk_id(&document, offset + i),
                    text: doc.text.clone(),
                    metadata: doc.metadata.clone(),
                    embedding,
                }
            }));
            debug!(batch = batch_index, size = batch.len(), "Embedded batch");
        }

        // Drop chunks from a previous version of this document
        let prefix = document_prefix(&document);
        let stale_vectors = self.vector_store.delete_by_id_prefix(&self.collection, &prefix).await?;
        let stale_nodes = self.graph_store.delete_by_id_prefix(&prefix).await?;
        if stale_vectors > 0 || stale_nodes > 0 {
            info!(document = %document, stale_vectors, stale_nodes, "Replaced previous version of document");
        }

        // Vector store
        info!(collection = %self.collection, "Ingesting into vector store");
        for batch in chunks.chunks(self.batch_size) {
            self.vector_store.upsert(&self.collection, batch).await?;
        }
        info!(store = self.vector_store.name(), "Vector data saved");

        // Graph store
        info!(store = self.graph_store.name(), "Ingesting into graph store");
        for chunk in &chunks {
            self.graph_store.merge_chunk(&chunk.id, &chunk.text).await?;
        }

        info!(document = %document, chunks = splits.len(), "Ingestion complete");
        Ok(IngestReport {
            document,
            pages: pages.len(),
            chunks: splits.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::document_processor::tests::sample_pdf;
    use crate::embeddings::{DocumentMetadata, MemoryVectorStore};
    use crate::graph::MemoryGraphStore;
    use crate::rag::query::tests::LetterEmbedder;

    fn ingestor(
        vectors: Arc<MemoryVectorStore>,
        graph: Arc<MemoryGraphStore>,
        batch_size: usize,
    ) -> Ingestor {
        Ingestor::new(
            Arc::new(LetterEmbedder),
            vectors,
            graph,
            RecursiveTextSplitter::new(40, 10).unwrap(),
            "veritas_knowledge",
            batch_size,
        )
    }

    fn page(text: &str, page: u32) -> PageDocument {
        PageDocument {
            text: text.to_string(),
            metadata: DocumentMetadata {
                source: "docs/manual.pdf".to_string(),
                page,
            },
        }
    }

    #[test]
    fn test_document_name_and_chunk_ids() {
        assert_eq!(document_name("docs/manual.pdf"), "manual");
        assert_eq!(document_name("manual"), "manual");
        assert_eq!(document_name(""), "document");
        assert_eq!(chunk_id("manual", 7), "manual/chunk_7");
        assert!(chunk_id("manual", 0).starts_with(&document_prefix("manual")));
    }

    #[tokio::test]
    async fn test_ingest_writes_same_chunks_to_both_stores() {
        let vectors = Arc::new(MemoryVectorStore::new());
        let graph = Arc::new(MemoryGraphStore::new());
        let ingestor = ingestor(vectors.clone(), graph.clone(), 2);

        let pages = vec![
            page("The encoder maps tokens to vectors. The decoder produces text.", 0),
            page("Attention weights are computed per head.", 1),
        ];
        let report = ingestor.ingest_pages("docs/manual.pdf", pages).await.unwrap();

        assert_eq!(report.document, "manual");
        assert_eq!(report.pages, 2);
        assert!(report.chunks >= 3);
        assert_eq!(vectors.len("veritas_knowledge").await, report.chunks);
        assert_eq!(graph.len().await, report.chunks);

        let hits = graph.find_chunks_containing("attention", 5).await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn test_reingest_is_idempotent() {
        let vectors = Arc::new(MemoryVectorStore::new());
        let graph = Arc::new(MemoryGraphStore::new());
        let ingestor = ingestor(vectors.clone(), graph.clone(), 32);

        let first = ingestor
            .ingest_pages("manual.pdf", vec![page("alpha beta gamma delta epsilon zeta eta theta", 0)])
            .await
            .unwrap();
        ingestor
            .ingest_pages("manual.pdf", vec![page("alpha beta gamma delta epsilon zeta eta theta", 0)])
            .await
            .unwrap();

        assert_eq!(vectors.len("veritas_knowledge").await, first.chunks);
        assert_eq!(graph.len().await, first.chunks);
    }

    #[tokio::test]
    async fn test_reingesting_shorter_version_drops_stale_chunks() {
        let vectors = Arc::new(MemoryVectorStore::new());
        let graph = Arc::new(MemoryGraphStore::new());
        let ingestor = Ingestor::new(
            Arc::new(LetterEmbedder),
            vectors.clone(),
            graph.clone(),
            RecursiveTextSplitter::new(20, 5).unwrap(),
            "veritas_knowledge",
            32,
        );
        let other = ingestor
            .ingest_pages("other.pdf", vec![page("unrelated appendix", 0)])
            .await
            .unwrap();

        let long = ingestor
            .ingest_pages(
                "manual.pdf",
                vec![page("alpha beta gamma delta epsilon zeta eta theta iota kappa zebra", 0)],
            )
            .await
            .unwrap();
        assert!(long.chunks > 1);

        let short = ingestor
            .ingest_pages("manual.pdf", vec![page("new text", 0)])
            .await
            .unwrap();
        assert_eq!(short.chunks, 1);

        assert_eq!(vectors.len("veritas_knowledge").await, other.chunks + short.chunks);
        assert_eq!(graph.len().await, other.chunks + short.chunks);
        assert!(graph.find_chunks_containing("zebra", 5).await.unwrap().is_empty());
        assert_eq!(graph.find_chunks_containing("appendix", 5).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_document_is_rejected() {
        let ingestor = ingestor(Arc::new(MemoryVectorStore::new()), Arc::new(MemoryGraphStore::new()), 4);
        let err = ingestor
            .ingest_pages("blank.pdf", vec![page("   ", 0)])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DocumentProcessing(_)));
    }

    #[tokio::test]
    async fn test_ingest_pdf_bytes() {
        let vectors = Arc::new(MemoryVectorStore::new());
        let graph = Arc::new(MemoryGraphStore::new());
        let ingestor = ingestor(vectors.clone(), graph.clone(), 4);

        let pdf = sample_pdf(&["Transformers rely on attention", "Residual connections"]);
        let report = ingestor.ingest_bytes(Bytes::from(pdf), "paper.pdf").await.unwrap();

        assert_eq!(report.document, "paper");
        assert_eq!(report.pages, 2);
        assert_eq!(graph.len().await, report.chunks);
    }
}
