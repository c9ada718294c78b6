//! L1 in-memory phrase→vector cache using moka.

use std::time::Duration;

use moka::sync::Cache;

/// In-memory vector cache, keyed by the phrase itself.
///
/// Sources are pure functions of the phrase, so the phrase is the natural
/// cache key. Entries idle out after an hour.
pub struct VectorCache {
    cache: Cache<String, Vec<f32>>,
}

impl VectorCache {
    /// Create a new cache holding at most `max_entries` vectors.
    pub fn new(max_entries: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_idle(Duration::from_secs(3600))
            .build();
        Self { cache }
    }

    pub fn get(&self, phrase: &str) -> Option<Vec<f32>> {
        self.cache.get(phrase)
    }

    pub fn insert(&self, phrase: String, vector: Vec<f32>) {
        self.cache.insert(phrase, vector);
    }

    pub fn len(&self) -> u64 {
        // moka processes writes through an async buffer, so entry_count() lags
        // until pending tasks are run; flush them for an accurate count.
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.cache.invalidate_all();
    }
}
