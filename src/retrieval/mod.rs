pub mod chunker;
pub mod embeddings;
pub mod loader;
pub mod scoring;
pub mod store;
pub mod traits;
pub mod vector;

pub use chunker::RecursiveSplitter;
pub use embeddings::{EmbeddingProvider, GeminiEmbedding};
pub use loader::TextDocumentLoader;
pub use scoring::{AbsoluteWhenAllNegative, BackendOrder, ScorePolicy, policy_for};
pub use store::{InMemoryVectorStore, list_stored_documents};
pub use traits::{DocumentChunk, DocumentId, DocumentLoader, ScoredChunk, SimilaritySearch};
pub use vector::cosine_similarity;
