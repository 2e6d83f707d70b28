use super::cache::AnswerCache;
use crate::config::RetrievalConfig;
use crate::llm::{AnswerSource, InvocationRequest, ProviderFailoverRouter};
use crate::retrieval::{DocumentId, ScorePolicy, SimilaritySearch, policy_for};
use serde::Serialize;
use std::sync::Arc;

pub const RETRIEVAL_EMPTY_MESSAGE: &str =
    "I couldn't find any relevant information in the document to answer your question.";

pub const RETRIEVAL_FAILED_MESSAGE: &str =
    "I'm sorry, I couldn't search the document right now. Please make sure it has been ingested and try again.";

/// Separator placed between retrieved chunks in the generation context.
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Where an answer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerOrigin {
    Cache,
    Primary,
    Fallback,
    Degraded,
    RetrievalEmpty,
    RetrievalFailed,
}

impl From<AnswerSource> for AnswerOrigin {
    fn from(source: AnswerSource) -> Self {
        match source {
            AnswerSource::Primary => Self::Primary,
            AnswerSource::Fallback => Self::Fallback,
            AnswerSource::Degraded => Self::Degraded,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryAnswer {
    pub text: String,
    pub origin: AnswerOrigin,
}

impl QueryAnswer {
    fn new(text: impl Into<String>, origin: AnswerOrigin) -> Self {
        Self {
            text: text.into(),
            origin,
        }
    }
}

/// Retrieval, ranking, generation and memoization for one question.
pub struct QueryHandler {
    search: Arc<dyn SimilaritySearch>,
    router: Arc<ProviderFailoverRouter>,
    cache: Arc<AnswerCache>,
    policy: Arc<dyn ScorePolicy>,
    candidate_k: usize,
    context_k: usize,
}

impl QueryHandler {
    pub fn new(
        search: Arc<dyn SimilaritySearch>,
        router: Arc<ProviderFailoverRouter>,
        cache: Arc<AnswerCache>,
        retrieval: &RetrievalConfig,
    ) -> Self {
        Self {
            search,
            router,
            cache,
            policy: policy_for(retrieval.score_policy),
            candidate_k: retrieval.candidate_k.max(retrieval.context_k),
            context_k: retrieval.context_k,
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: Arc<dyn ScorePolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn cache(&self) -> &Arc<AnswerCache> {
        &self.cache
    }

    pub fn router(&self) -> &Arc<ProviderFailoverRouter> {
        &self.router
    }

    /// Answer `question` against `document`. Never fails: retrieval and
    /// provider errors become assistant-facing text.
    pub async fn ask(&self, document: &DocumentId, question: &str) -> QueryAnswer {
        if let Some(text) = self.cache.get(document, question) {
            tracing::debug!(document = %document, "Answer served from cache");
            return QueryAnswer::new(text, AnswerOrigin::Cache);
        }
        let generation = self.cache.generation(document);

        let results = match self
            .search
            .similarity_search(document, question, self.candidate_k)
            .await
        {
            Ok(results) => results,
            Err(e) => {
                tracing::error!(document = %document, "Similarity search failed: {e}");
                return QueryAnswer::new(RETRIEVAL_FAILED_MESSAGE, AnswerOrigin::RetrievalFailed);
            }
        };

        if results.is_empty() {
            tracing::info!(document = %document, "No relevant chunks found");
            return QueryAnswer::new(RETRIEVAL_EMPTY_MESSAGE, AnswerOrigin::RetrievalEmpty);
        }

        let mut ranked = self.policy.rank(results);
        ranked.truncate(self.context_k);
        tracing::debug!(
            document = %document,
            policy = self.policy.name(),
            scores = ?ranked.iter().map(|r| r.score).collect::<Vec<_>>(),
            "Context selected"
        );

        let context = ranked
            .iter()
            .map(|r| r.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR);

        let routed = self
            .router
            .route(&InvocationRequest::new(context, question))
            .await;

        if !routed.is_degraded()
            && !self
                .cache
                .insert(document, question, routed.text.clone(), generation)
        {
            tracing::debug!(document = %document, "Document invalidated mid-request, answer not cached");
        }
        QueryAnswer::new(routed.text, routed.source.into())
    }
}
