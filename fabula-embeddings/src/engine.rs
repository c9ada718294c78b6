//! VectorEngine — the main entry point for fabula-embeddings.
//!
//! Wraps any `IVectorSource` with an L1 cache, optional L2 normalization,
//! and rayon batch fan-out re-aligned to input order. Implements
//! `IVectorSource` so it can be used anywhere a source is expected.

use fabula_core::traits::IVectorSource;
use fabula_core::vectors;
use fabula_core::NarrativeResult;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::cache::VectorCache;

const DEFAULT_CACHE_ENTRIES: u64 = 100_000;

/// Caching, normalizing wrapper around a vector source.
pub struct VectorEngine {
    inner: Box<dyn IVectorSource>,
    cache: VectorCache,
    normalize: bool,
}

impl VectorEngine {
    /// Wrap a source with the default cache size and L2 normalization on.
    pub fn new(inner: Box<dyn IVectorSource>) -> Self {
        Self::with_options(inner, DEFAULT_CACHE_ENTRIES, true)
    }

    pub fn with_options(inner: Box<dyn IVectorSource>, cache_entries: u64, normalize: bool) -> Self {
        info!(
            source = inner.name(),
            dims = inner.dimensions(),
            normalize,
            "vector engine initialized"
        );
        Self {
            inner,
            cache: VectorCache::new(cache_entries),
            normalize,
        }
    }

    /// Number of cached vectors.
    pub fn cached(&self) -> u64 {
        self.cache.len()
    }

    fn compute(&self, phrase: &str) -> NarrativeResult<Vec<f32>> {
        let mut v = self.inner.vector(phrase)?;
        // Invalid vectors pass through untouched so callers can detect them.
        if self.normalize && vectors::is_valid(&v) {
            vectors::l2_normalize(&mut v);
        }
        Ok(v)
    }
}

impl IVectorSource for VectorEngine {
    fn vector(&self, phrase: &str) -> NarrativeResult<Vec<f32>> {
        if let Some(hit) = self.cache.get(phrase) {
            debug!(phrase, "vector cache hit");
            return Ok(hit);
        }
        let v = self.compute(phrase)?;
        self.cache.insert(phrase.to_string(), v.clone());
        Ok(v)
    }

    /// Batch vectorization. Phrases are embedded in parallel; the output is
    /// collected back into input order, so downstream index alignment holds.
    fn vectors(&self, phrases: &[String]) -> NarrativeResult<Vec<Vec<f32>>> {
        phrases
            .par_iter()
            .map(|p| self.vector(p))
            .collect::<NarrativeResult<Vec<_>>>()
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
