use crate::config::CacheConfig;
use crate::retrieval::DocumentId;
use lru::LruCache;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    document: DocumentId,
    question: String,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    answer: String,
    inserted_at: Instant,
}

/// Invalidation counter for one document, captured before an answer is
/// computed and checked again when it is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheGeneration(u64);

#[derive(Debug)]
struct CacheState {
    entries: LruCache<CacheKey, CacheEntry>,
    generations: HashMap<DocumentId, u64>,
}

impl CacheState {
    fn generation(&self, document: &DocumentId) -> CacheGeneration {
        CacheGeneration(self.generations.get(document).copied().unwrap_or(0))
    }
}

/// Bounded memo of successful answers keyed by `(document, question)`.
///
/// Least-recently-used entries are evicted at capacity; with a TTL, older
/// entries read as misses. Concurrent writers for the same key race and the
/// last one wins. An insert computed before the document's last
/// invalidation is dropped.
#[derive(Debug)]
pub struct AnswerCache {
    state: Mutex<CacheState>,
    ttl: Option<Duration>,
}

impl AnswerCache {
    pub fn new(capacity: usize, ttl: Option<Duration>) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            state: Mutex::new(CacheState {
                entries: LruCache::new(capacity),
                generations: HashMap::new(),
            }),
            ttl,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.capacity, config.ttl_secs.map(Duration::from_secs))
    }

    fn key(document: &DocumentId, question: &str) -> CacheKey {
        CacheKey {
            document: document.clone(),
            question: question.to_string(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, document: &DocumentId, question: &str) -> Option<String> {
        let key = Self::key(document, question);
        let mut state = self.lock();
        let expired = match state.entries.get(&key) {
            Some(entry) => self
                .ttl
                .is_some_and(|ttl| entry.inserted_at.elapsed() >= ttl),
            None => return None,
        };
        if expired {
            state.entries.pop(&key);
            return None;
        }
        state.entries.get(&key).map(|entry| entry.answer.clone())
    }

    /// Current invalidation generation of `document`.
    pub fn generation(&self, document: &DocumentId) -> CacheGeneration {
        self.lock().generation(document)
    }

    /// Store `answer` unless `document` was invalidated after `observed` was
    /// taken. Returns whether the answer was stored.
    pub fn insert(
        &self,
        document: &DocumentId,
        question: &str,
        answer: impl Into<String>,
        observed: CacheGeneration,
    ) -> bool {
        let mut state = self.lock();
        if state.generation(document) != observed {
            return false;
        }
        let entry = CacheEntry {
            answer: answer.into(),
            inserted_at: Instant::now(),
        };
        state.entries.put(Self::key(document, question), entry);
        true
    }

    /// Drop every entry for `document` and reject in-flight inserts that
    /// started before this call. Returns how many entries were removed.
    pub fn invalidate_document(&self, document: &DocumentId) -> usize {
        let mut state = self.lock();
        *state.generations.entry(document.clone()).or_insert(0) += 1;
        let stale: Vec<CacheKey> = state
            .entries
            .iter()
            .filter(|(key, _)| &key.document == document)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &stale {
            state.entries.pop(key);
        }
        stale.len()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(name: &str) -> DocumentId {
        DocumentId::new(name).unwrap()
    }

    fn put(cache: &AnswerCache, document: &str, question: &str, answer: &str) {
        let document = doc(document);
        let generation = cache.generation(&document);
        assert!(cache.insert(&document, question, answer, generation));
    }

    #[test]
    fn hit_returns_stored_answer() {
        let cache = AnswerCache::new(4, None);
        put(&cache, "a", "q", "answer");
        assert_eq!(cache.get(&doc("a"), "q").as_deref(), Some("answer"));
        assert_eq!(cache.get(&doc("b"), "q"), None);
        assert_eq!(cache.get(&doc("a"), "other"), None);
    }

    #[test]
    fn least_recently_used_is_evicted() {
        let cache = AnswerCache::new(2, None);
        put(&cache, "a", "q1", "1");
        put(&cache, "a", "q2", "2");
        assert!(cache.get(&doc("a"), "q1").is_some());
        put(&cache, "a", "q3", "3");
        assert!(cache.get(&doc("a"), "q2").is_none());
        assert!(cache.get(&doc("a"), "q1").is_some());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn expired_entries_are_misses() {
        let cache = AnswerCache::new(4, Some(Duration::ZERO));
        put(&cache, "a", "q", "answer");
        assert_eq!(cache.get(&doc("a"), "q"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn invalidation_is_scoped_to_one_document() {
        let cache = AnswerCache::new(8, None);
        put(&cache, "a", "q1", "1");
        put(&cache, "a", "q2", "2");
        put(&cache, "b", "q1", "3");
        assert_eq!(cache.invalidate_document(&doc("a")), 2);
        assert_eq!(cache.get(&doc("a"), "q1"), None);
        assert_eq!(cache.get(&doc("b"), "q1").as_deref(), Some("3"));
    }

    #[test]
    fn insert_started_before_invalidation_is_dropped() {
        let cache = AnswerCache::new(8, None);
        let before = cache.generation(&doc("a"));
        let other = cache.generation(&doc("b"));

        cache.invalidate_document(&doc("a"));

        assert!(!cache.insert(&doc("a"), "q", "old text", before));
        assert_eq!(cache.get(&doc("a"), "q"), None);
        assert!(cache.insert(&doc("b"), "q", "unaffected", other));

        let after = cache.generation(&doc("a"));
        assert_ne!(before, after);
        assert!(cache.insert(&doc("a"), "q", "new text", after));
        assert_eq!(cache.get(&doc("a"), "q").as_deref(), Some("new text"));
    }

    #[test]
    fn last_writer_wins() {
        let cache = AnswerCache::new(4, None);
        put(&cache, "a", "q", "first");
        put(&cache, "a", "q", "second");
        assert_eq!(cache.get(&doc("a"), "q").as_deref(), Some("second"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let cache = AnswerCache::new(0, None);
        put(&cache, "a", "q", "x");
        assert_eq!(cache.len(), 1);
    }
}
