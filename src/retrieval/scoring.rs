use super::traits::ScoredChunk;
use crate::config::ScorePolicyKind;
use std::sync::Arc;

/// Orders search results before the top `context_k` are kept as context.
///
/// Backends disagree on score sign: some return similarities (higher is
/// better), others distances that may come back negative.
pub trait ScorePolicy: Send + Sync {
    fn name(&self) -> &'static str;

    fn rank(&self, results: Vec<ScoredChunk>) -> Vec<ScoredChunk>;
}

/// Keeps the order the store returned.
#[derive(Debug, Clone, Copy, Default)]
pub struct BackendOrder;

impl ScorePolicy for BackendOrder {
    fn name(&self) -> &'static str {
        "raw"
    }

    fn rank(&self, results: Vec<ScoredChunk>) -> Vec<ScoredChunk> {
        results
    }
}

/// When every score is negative, the smallest magnitude ranks first;
/// otherwise descending raw score.
#[derive(Debug, Clone, Copy, Default)]
pub struct AbsoluteWhenAllNegative;

impl ScorePolicy for AbsoluteWhenAllNegative {
    fn name(&self) -> &'static str {
        "absolute_when_negative"
    }

    fn rank(&self, mut results: Vec<ScoredChunk>) -> Vec<ScoredChunk> {
        let all_negative = !results.is_empty() && results.iter().all(|r| r.score < 0.0);
        if all_negative {
            tracing::debug!(
                candidates = results.len(),
                "All relevance scores negative, ranking by magnitude"
            );
            results.sort_by(|a, b| a.score.abs().total_cmp(&b.score.abs()));
            results
        } else {
            results.sort_by(|a, b| b.score.total_cmp(&a.score));
            results
        }
    }
}

pub fn policy_for(kind: ScorePolicyKind) -> Arc<dyn ScorePolicy> {
    match kind {
        ScorePolicyKind::Raw => Arc::new(BackendOrder),
        ScorePolicyKind::AbsoluteWhenNegative => Arc::new(AbsoluteWhenAllNegative),
    }
}
