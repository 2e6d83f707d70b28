use crate::config::{Config, ProviderKind};
use crate::error::{DocQaError, RetrievalError};
use crate::llm::{
    ProviderFailoverRouter, build_provider_client_with_timeout, build_router_from, rotator_for,
};
use crate::query::{AnswerCache, QueryAnswer, QueryHandler};
use crate::retrieval::{
    DocumentId, DocumentLoader, EmbeddingProvider, GeminiEmbedding, InMemoryVectorStore,
    RecursiveSplitter, TextDocumentLoader,
};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub document: DocumentId,
    pub chunks: usize,
}

/// Everything one running instance needs: loader, store, router and cache,
/// built once and shared through `Arc`.
pub struct DocQaService {
    config: Arc<Config>,
    loader: Arc<dyn DocumentLoader>,
    store: Arc<InMemoryVectorStore>,
    handler: Arc<QueryHandler>,
}

impl DocQaService {
    /// Build from config and environment credentials. Gemini credentials
    /// are always required since embeddings use them; the rotator is shared
    /// with the Gemini generation provider.
    pub fn from_config(config: Config) -> Result<Self, DocQaError> {
        config.require_store_path()?;
        let gemini = rotator_for(&config, ProviderKind::Gemini)?;
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(GeminiEmbedding::with_client(
            &config.gemini.base_url,
            &config.gemini.embedding_model,
            Arc::clone(&gemini),
            build_provider_client_with_timeout(config.provider_timeout_secs),
        ));
        let router = build_router_from(&config, |kind| match kind {
            ProviderKind::Gemini => Ok(Arc::clone(&gemini)),
            ProviderKind::OpenAiCompatible => rotator_for(&config, kind),
        })?;
        Self::assemble(config, embedder, router)
    }

    /// Wire the service from prebuilt collaborators.
    pub fn assemble(
        config: Config,
        embedder: Arc<dyn EmbeddingProvider>,
        router: ProviderFailoverRouter,
    ) -> Result<Self, DocQaError> {
        let store_path = config.require_store_path()?.clone();
        let store = Arc::new(InMemoryVectorStore::new(store_path, embedder));
        let loader: Arc<dyn DocumentLoader> = Arc::new(TextDocumentLoader::new(
            RecursiveSplitter::new(config.retrieval.chunk_size, config.retrieval.chunk_overlap),
        ));
        let cache = Arc::new(AnswerCache::from_config(&config.cache));
        let handler = Arc::new(QueryHandler::new(
            Arc::clone(&store) as _,
            Arc::new(router),
            cache,
            &config.retrieval,
        ));
        Ok(Self {
            config: Arc::new(config),
            loader,
            store,
            handler,
        })
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn store(&self) -> &Arc<InMemoryVectorStore> {
        &self.store
    }

    pub fn handler(&self) -> &Arc<QueryHandler> {
        &self.handler
    }

    /// Document named by `DOC_PATH`, if configured.
    pub fn default_document(&self) -> Option<DocumentId> {
        self.config
            .document_path
            .as_deref()
            .and_then(|path| DocumentId::from_path(path).ok())
    }

    /// Load, chunk, embed and persist `path`, then drop cached answers for
    /// the document.
    pub async fn ingest(&self, path: &Path) -> Result<IngestReport, DocQaError> {
        let document = DocumentId::from_path(path)?;
        let chunks = self.loader.load_and_chunk(path).await?;
        let chunks = self.store.ingest(&document, chunks).await?;
        let dropped = self.handler.cache().invalidate_document(&document);
        if dropped > 0 {
            tracing::info!(document = %document, dropped, "Cached answers invalidated");
        }
        Ok(IngestReport { document, chunks })
    }

    /// Ingest the `DOC_PATH` document when the store has no copy of it yet.
    /// Returns the report when an ingest ran.
    pub async fn ensure_default_ingested(&self) -> Result<Option<IngestReport>, DocQaError> {
        let Some(path) = self.config.document_path.clone() else {
            return Ok(None);
        };
        let document = DocumentId::from_path(&path)?;
        match self.store.chunk_count(&document).await {
            Ok(chunks) => {
                tracing::info!(document = %document, chunks, "Default document already indexed");
                Ok(None)
            }
            Err(RetrievalError::UnknownDocument(_)) => {
                tracing::info!(document = %document, "Default document not indexed yet, ingesting");
                self.ingest(&path).await.map(Some)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn ask(&self, document: &DocumentId, question: &str) -> QueryAnswer {
        self.handler.ask(document, question).await
    }

    pub fn invalidate(&self, document: &DocumentId) -> usize {
        self.handler.cache().invalidate_document(document)
    }
}
