use super::chunker::RecursiveSplitter;
use super::traits::{DocumentChunk, DocumentLoader};
use crate::error::RetrievalError;
use async_trait::async_trait;
use std::path::Path;

/// Loads UTF-8 text documents. Binary formats such as PDF must be converted
/// to text before ingestion.
#[derive(Debug, Clone, Default)]
pub struct TextDocumentLoader {
    splitter: RecursiveSplitter,
}

impl TextDocumentLoader {
    pub fn new(splitter: RecursiveSplitter) -> Self {
        Self { splitter }
    }
}

#[async_trait]
impl DocumentLoader for TextDocumentLoader {
    async fn load_and_chunk(&self, path: &Path) -> Result<Vec<DocumentChunk>, RetrievalError> {
        let source = path.display().to_string();
        let bytes = tokio::fs::read(path).await.map_err(|e| RetrievalError::Load {
            path: source.clone(),
            message: e.to_string(),
        })?;
        let text = String::from_utf8(bytes).map_err(|_| RetrievalError::Load {
            path: source.clone(),
            message: "not UTF-8 text; extract binary documents (e.g. PDF) to text first".into(),
        })?;

        let chunks: Vec<DocumentChunk> = self
            .splitter
            .split(&text)
            .into_iter()
            .enumerate()
            .map(|(index, text)| DocumentChunk {
                index,
                text,
                source: source.clone(),
            })
            .collect();

        tracing::debug!(path = %source, chunks = chunks.len(), "Document chunked");
        Ok(chunks)
    }
}
