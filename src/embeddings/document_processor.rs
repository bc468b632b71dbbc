//! PDF loading
//!
//! Produces one [`PageDocument`] per PDF page so chunk metadata can point
//! back at the page it came from.

use std::path::Path;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::types::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub source: String,
    /// Zero-based page index
    pub page: u32,
}

#[derive(Debug, Clone)]
pub struct PageDocument {
    pub text: String,
    pub metadata: DocumentMetadata,
}

pub struct DocumentProcessor;

impl DocumentProcessor {
    pub async fn load_pdf(path: impl AsRef<Path>) -> AppResult<Vec<PageDocument>> {
        let path = path.as_ref();
        let content = tokio::fs::read(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::NotFound(format!("PDF not found: {}", path.display()))
            } else {
                AppError::DocumentProcessing(format!("Failed to read {}: {}", path.display(), e))
            }
        })?;

        Self::load_pdf_bytes(Bytes::from(content), &path.display().to_string()).await
    }

    pub async fn load_pdf_bytes(content: Bytes, source: &str) -> AppResult<Vec<PageDocument>> {
        let source = source.to_string();
        info!(source = %source, size = content.len(), "Loading PDF");

        tokio::task::spawn_blocking(move || Self::extract_pages(&content, &source))
            .await
            .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))?
    }

    fn extract_pages(content: &[u8], source: &str) -> AppResult<Vec<PageDocument>> {
        let doc = lopdf::Document::load_mem(content)
            .map_err(|e| AppError::DocumentProcessing(format!("Failed to parse PDF: {}", e)))?;

        if doc.is_encrypted() {
            return Err(AppError::DocumentProcessing(format!(
                "{} is encrypted; decrypt it before ingesting",
                source
            )));
        }

        let mut pages = Vec::new();
        for (index, page_number) in doc.get_pages().keys().enumerate() {
            match doc.extract_text(&[*page_number]) {
                Ok(text) if !text.trim().is_empty() => pages.push(PageDocument {
                    text,
                    metadata: DocumentMetadata {
                        source: source.to_string(),
                        page: index as u32,
                    },
                }),
                Ok(_) => debug!(page = page_number, "Skipping page without extractable text"),
                Err(e) => warn!(page = page_number, error = %e, "Failed to extract page text"),
            }
        }

        if pages.is_empty() {
            return Err(AppError::DocumentProcessing(format!(
                "{} contains no extractable text (image-based or empty PDF)",
                source
            )));
        }

        info!(source = %source, pages = pages.len(), "PDF loaded");
        Ok(pages)
    }
}
