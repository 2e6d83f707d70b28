use super::embeddings::EmbeddingProvider;
use super::traits::{DocumentChunk, DocumentId, ScoredChunk, SimilaritySearch};
use super::vector::cosine_similarity;
use crate::error::RetrievalError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Debug, Serialize, Deserialize)]
struct StoredDocument {
    document: DocumentId,
    embedding_model: String,
    entries: Vec<StoredEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    chunk: DocumentChunk,
    embedding: Vec<f32>,
}

/// Brute-force cosine search over per-document embeddings.
///
/// Each document is persisted as `{root}/{id}.json` and loaded into memory
/// on first use.
pub struct InMemoryVectorStore {
    root: PathBuf,
    embedder: Arc<dyn EmbeddingProvider>,
    documents: RwLock<HashMap<DocumentId, Arc<StoredDocument>>>,
}

impl InMemoryVectorStore {
    pub fn new(root: impl Into<PathBuf>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            root: root.into(),
            embedder,
            documents: RwLock::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn document_path(&self, document: &DocumentId) -> PathBuf {
        self.root.join(format!("{document}.json"))
    }

    /// Embed `chunks`, persist them and replace any previous version of
    /// `document`. Returns the number of stored chunks.
    pub async fn ingest(
        &self,
        document: &DocumentId,
        chunks: Vec<DocumentChunk>,
    ) -> Result<usize, RetrievalError> {
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = if texts.is_empty() {
            Vec::new()
        } else {
            self.embedder
                .embed(&texts)
                .await
                .map_err(|e| RetrievalError::Embedding(e.to_string()))?
        };

        let stored = StoredDocument {
            document: document.clone(),
            embedding_model: self.embedder.model().to_string(),
            entries: chunks
                .into_iter()
                .zip(embeddings)
                .map(|(chunk, embedding)| StoredEntry { chunk, embedding })
                .collect(),
        };
        let count = stored.entries.len();

        self.persist(&stored).await?;
        self.documents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(document.clone(), Arc::new(stored));

        tracing::info!(document = %document, chunks = count, "Document ingested");
        Ok(count)
    }

    async fn persist(&self, stored: &StoredDocument) -> Result<(), RetrievalError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| RetrievalError::Store(format!("create {}: {e}", self.root.display())))?;

        let path = self.document_path(&stored.document);
        let tmp = path.with_extension("json.tmp");
        let bytes =
            serde_json::to_vec(stored).map_err(|e| RetrievalError::Store(e.to_string()))?;
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| RetrievalError::Store(format!("write {}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| RetrievalError::Store(format!("rename {}: {e}", path.display())))?;
        Ok(())
    }

    async fn load(&self, document: &DocumentId) -> Result<Arc<StoredDocument>, RetrievalError> {
        let cached = self
            .documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(document)
            .cloned();
        if let Some(stored) = cached {
            return Ok(stored);
        }

        let path = self.document_path(document);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RetrievalError::UnknownDocument(document.to_string()));
            }
            Err(e) => {
                return Err(RetrievalError::Store(format!("read {}: {e}", path.display())));
            }
        };
        let stored: StoredDocument = serde_json::from_slice(&bytes)
            .map_err(|e| RetrievalError::Store(format!("parse {}: {e}", path.display())))?;

        if stored.embedding_model != self.embedder.model() {
            tracing::warn!(
                document = %document,
                stored = %stored.embedding_model,
                current = self.embedder.model(),
                "Stored embeddings were produced by a different model; re-ingest the document"
            );
        }

        let stored = Arc::new(stored);
        self.documents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(document.clone(), Arc::clone(&stored));
        Ok(stored)
    }

    /// Number of stored chunks for `document`.
    pub async fn chunk_count(&self, document: &DocumentId) -> Result<usize, RetrievalError> {
        Ok(self.load(document).await?.entries.len())
    }
}

/// Document ids with a persisted `{id}.json` under `root`. A missing root
/// lists nothing.
pub async fn list_stored_documents(root: &Path) -> Result<Vec<DocumentId>, RetrievalError> {
    let mut entries = match tokio::fs::read_dir(root).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(RetrievalError::Store(e.to_string())),
    };

    let mut ids = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| RetrievalError::Store(e.to_string()))?
    {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("json")
            && let Ok(id) = DocumentId::from_path(&path)
        {
            ids.push(id);
        }
    }
    ids.sort();
    Ok(ids)
}

#[async_trait]
impl SimilaritySearch for InMemoryVectorStore {
    async fn similarity_search(
        &self,
        document: &DocumentId,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredChunk>, RetrievalError> {
        let stored = self.load(document).await?;
        if k == 0 || stored.entries.is_empty() {
            return Ok(Vec::new());
        }

        let query_vec = self
            .embedder
            .embed_one(query)
            .await
            .map_err(|e| RetrievalError::Embedding(e.to_string()))?;

        let mut scored: Vec<ScoredChunk> = stored
            .entries
            .iter()
            .map(|entry| ScoredChunk {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(&query_vec, &entry.embedding),
            })
            .collect();
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);
        Ok(scored)
    }
}
