use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `docqa`.
///
/// Startup and ingestion paths surface these; the query path never does,
/// it always degrades to a plain-text assistant message instead. Provider
/// implementations use `anyhow::Result` internally and wrap [`LlmError`]
/// where the router needs to classify a failure.
#[derive(Debug, Error)]
pub enum DocQaError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── LLM / Provider ──────────────────────────────────────────────────
    #[error("llm: {0}")]
    Llm(#[from] LlmError),

    // ── Retrieval ───────────────────────────────────────────────────────
    #[error("retrieval: {0}")]
    Retrieval(#[from] RetrievalError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("no credentials found for {provider} (expected {prefix}_1..{prefix}_N or {prefix})")]
    MissingCredentials { provider: String, prefix: String },

    #[error("missing required setting {0}")]
    MissingSetting(&'static str),

    #[error("unknown provider '{0}' (expected gemini or openai)")]
    UnknownProvider(String),
}

// ─── LLM / Provider errors ──────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("provider {provider} request failed: {message}")]
    Request { provider: String, message: String },

    #[error("provider {provider} quota exhausted: {message}")]
    QuotaExhausted { provider: String, message: String },

    #[error("provider {provider} returned an empty answer")]
    EmptyAnswer { provider: String },

    #[error("prompt render failed: {0}")]
    Prompt(String),
}

// ─── Retrieval errors ───────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("document {0} has not been ingested")]
    UnknownDocument(String),

    #[error("document {path} could not be loaded: {message}")]
    Load { path: String, message: String },

    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error("store: {0}")]
    Store(String),
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, DocQaError>;
