//! Recursive character text splitter
//!
//! Splits on the coarsest separator present (paragraphs, then lines, then
//! words, then characters), recursing into pieces that are still too long,
//! and then greedily merges neighbouring pieces back into windows of at most
//! `chunk_size` characters. Consecutive windows share up to `chunk_overlap`
//! characters of trailing pieces.

use std::collections::VecDeque;

use crate::embeddings::document_processor::PageDocument;
use crate::types::{AppError, AppResult};

pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

#[derive(Debug, Clone)]
pub struct RecursiveTextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl Default for RecursiveTextSplitter {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

impl RecursiveTextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> AppResult<Self> {
        if chunk_size == 0 {
            return Err(AppError::Config("chunk_size must be greater than zero".to_string()));
        }
        if chunk_overlap >= chunk_size {
            return Err(AppError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
            ..Self::default()
        })
    }

    /// Split every page, carrying the page metadata onto each chunk
    pub fn split_documents(&self, documents: &[PageDocument]) -> Vec<PageDocument> {
        documents
            .iter()
            .flat_map(|doc| {
                self.split_text(&doc.text)
                    .into_iter()
                    .map(move |text| PageDocument {
                        text,
                        metadata: doc.metadata.clone(),
                    })
            })
            .collect()
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut separator = separators.last().map(String::as_str).unwrap_or("");
        let mut remaining: &[String] = &[];
        for (i, candidate) in separators.iter().enumerate() {
            if candidate.is_empty() {
                separator = "";
                break;
            }
            if text.contains(candidate.as_str()) {
                separator = candidate.as_str();
                remaining = &separators[i + 1..];
                break;
            }
        }

        let pieces: Vec<String> = if separator.is_empty() {
            text.chars().map(String::from).collect()
        } else {
            text.split(separator)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        };

        let mut chunks = Vec::new();
        let mut short_pieces: Vec<String> = Vec::new();
        for piece in pieces {
            if char_len(&piece) < self.chunk_size {
                short_pieces.push(piece);
                continue;
            }
            if !short_pieces.is_empty() {
                chunks.extend(self.merge_pieces(&short_pieces, separator));
                short_pieces.clear();
            }
            if remaining.is_empty() {
                let trimmed = piece.trim();
                if !trimmed.is_empty() {
                    chunks.push(trimmed.to_string());
                }
            } else {
                chunks.extend(self.split_recursive(&piece, remaining));
            }
        }
        if !short_pieces.is_empty() {
            chunks.extend(self.merge_pieces(&short_pieces, separator));
        }
        chunks
    }

    fn merge_pieces(&self, pieces: &[String], separator: &str) -> Vec<String> {
        let separator_len = char_len(separator);
        let mut chunks = Vec::new();
        let mut window: VecDeque<(&str, usize)> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(piece);
            let joiner = if window.is_empty() { 0 } else { separator_len };

            if total + len + joiner > self.chunk_size && !window.is_empty() {
                push_joined(&mut chunks, &window, separator);

                // Drop leading pieces until the carried-over tail fits the overlap
                // budget and leaves room for the incoming piece.
                while total > self.chunk_overlap
                    || (total > 0
                        && total + len + if window.is_empty() { 0 } else { separator_len }
                            > self.chunk_size)
                {
                    let Some((_, front_len)) = window.pop_front() else {
                        break;
                    };
                    total -= front_len + if window.is_empty() { 0 } else { separator_len };
                }
                if window.is_empty() {
                    total = 0;
                }
            }

            let joiner = if window.is_empty() { 0 } else { separator_len };
            window.push_back((piece.as_str(), len));
            total += len + joiner;
        }

        push_joined(&mut chunks, &window, separator);
        chunks
    }
}

fn push_joined(chunks: &mut Vec<String>, window: &VecDeque<(&str, usize)>, separator: &str) {
    let joined = window
        .iter()
        .map(|(piece, _)| *piece)
        .collect::<Vec<_>>()
        .join(separator);
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::document_processor::DocumentMetadata;

    #[test]
    fn test_rejects_overlap_not_smaller_than_chunk() {
        assert!(RecursiveTextSplitter::new(100, 100).is_err());
        assert!(RecursiveTextSplitter::new(0, 0).is_err());
        assert!(RecursiveTextSplitter::new(100, 20).is_ok());
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let splitter = RecursiveTextSplitter::default();
        assert_eq!(splitter.split_text("  a short page  "), vec!["a short page".to_string()]);
        assert!(splitter.split_text("   \n\n  ").is_empty());
    }

    #[test]
    fn test_chunks_respect_size_and_overlap() {
        let splitter = RecursiveTextSplitter::new(50, 15).unwrap();
        let text = (0..40).map(|i| format!("word{}", i)).collect::<Vec<_>>().join(" ");
        let chunks = splitter.split_text(&text);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 50, "chunk too long: {}", chunk);
        }
        // Neighbouring windows share their boundary words
        for pair in chunks.windows(2) {
            let last_word = pair[0].split(' ').last().unwrap();
            assert!(pair[1].contains(last_word), "{:?} not carried into {:?}", last_word, pair[1]);
        }
        // Nothing is lost
        for i in 0..40 {
            let word = format!("word{}", i);
            assert!(chunks.iter().any(|c| c.split(' ').any(|w| w == word)));
        }
    }

    #[test]
    fn test_prefers_paragraph_boundaries() {
        let splitter = RecursiveTextSplitter::new(30, 0).unwrap();
        let text = "First paragraph here.\n\nSecond paragraph here.";
        let chunks = splitter.split_text(text);
        assert_eq!(
            chunks,
            vec!["First paragraph here.".to_string(), "Second paragraph here.".to_string()]
        );
    }

    #[test]
    fn test_unbroken_text_falls_back_to_characters() {
        let splitter = RecursiveTextSplitter::new(10, 2).unwrap();
        let text = "x".repeat(25);
        let chunks = splitter.split_text(&text);
        assert!(chunks.len() >= 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
    }

    #[test]
    fn test_multibyte_text_is_measured_in_characters() {
        let splitter = RecursiveTextSplitter::new(12, 0).unwrap();
        let text = "ñandú ñandú ñandú ñandú";
        let chunks = splitter.split_text(text);
        assert!(chunks.iter().all(|c| c.chars().count() <= 12));
        assert_eq!(chunks.concat().matches("ñandú").count(), 4);
    }

    #[test]
    fn test_split_documents_keeps_metadata() {
        let splitter = RecursiveTextSplitter::new(20, 5).unwrap();
        let docs = vec![PageDocument {
            text: "alpha beta gamma delta epsilon zeta".to_string(),
            metadata: DocumentMetadata {
                source: "manual.pdf".to_string(),
                page: 4,
            },
        }];

        let chunks = splitter.split_documents(&docs);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.metadata.page == 4 && c.metadata.source == "manual.pdf"));
    }
}
