use crate::error::RetrievalError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Stable identity of an ingested document: the sanitized file stem of its
/// path. Only ASCII alphanumerics, `-` and `_` survive, so the id is safe to
/// use as a store file name and as a URL path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(raw: &str) -> Result<Self, RetrievalError> {
        let sanitized: String = raw
            .trim()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        let sanitized = sanitized.trim_matches('_').to_string();
        if sanitized.is_empty() {
            return Err(RetrievalError::Load {
                path: raw.to_string(),
                message: "cannot derive a document id".into(),
            });
        }
        Ok(Self(sanitized))
    }

    pub fn from_path(path: &Path) -> Result<Self, RetrievalError> {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| RetrievalError::Load {
                path: path.display().to_string(),
                message: "path has no file name".into(),
            })?;
        Self::new(stem)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One retrievable span of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Position of the chunk within its document.
    pub index: usize,
    pub text: String,
    pub source: String,
}

/// A chunk paired with its relevance to a query. The sign convention of
/// `score` depends on the backend; rank with a [`ScorePolicy`].
///
/// [`ScorePolicy`]: super::scoring::ScorePolicy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: DocumentChunk,
    pub score: f32,
}

/// Reads a document from disk and splits it into chunks.
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    async fn load_and_chunk(&self, path: &Path) -> Result<Vec<DocumentChunk>, RetrievalError>;
}

/// Top-k nearest chunks of an ingested document.
#[async_trait]
pub trait SimilaritySearch: Send + Sync {
    async fn similarity_search(
        &self,
        document: &DocumentId,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredChunk>, RetrievalError>;
}
