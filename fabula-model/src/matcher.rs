//! Known-entity matching.
//!
//! Two strategies share one contract: given phrases (or their vectors),
//! return the matched indices with label strings, input order preserved.
//! Pure functions of registry + input.

use fabula_core::traits::IVectorSource;
use fabula_core::vectors;
use fabula_core::NarrativeResult;
use tracing::debug;

/// Separator between entity names when a phrase matches several.
pub const LABEL_SEPARATOR: &str = "|";

/// True when `needle`'s whitespace tokens appear in `haystack`'s tokens as
/// an order-preserving (not necessarily contiguous) subsequence.
pub fn is_token_subsequence(needle: &str, haystack: &str) -> bool {
    let mut hay = haystack.split_whitespace();
    needle.split_whitespace().all(|n| hay.any(|h| h == n))
}

/// Ordered registry of canonical entity names, optionally paired 1:1 with
/// precomputed vectors for similarity matching. Immutable once built.
pub struct EntityRegistry {
    entities: Vec<String>,
    vectors: Option<Vec<Option<Vec<f32>>>>,
}

impl EntityRegistry {
    pub fn new(entities: Vec<String>) -> Self {
        Self {
            entities,
            vectors: None,
        }
    }

    /// Build a registry with entity vectors computed up front.
    ///
    /// Entities whose vector comes back invalid keep a `None` slot and can
    /// never match by similarity.
    pub fn with_vectors(
        entities: Vec<String>,
        source: &dyn IVectorSource,
    ) -> NarrativeResult<Self> {
        let raw = source.vectors(&entities)?;
        let entity_vectors: Vec<Option<Vec<f32>>> = raw
            .into_iter()
            .map(|v| vectors::is_valid(&v).then_some(v))
            .collect();
        let unembeddable = entity_vectors.iter().filter(|v| v.is_none()).count();
        if unembeddable > 0 {
            debug!(unembeddable, "registry entities without a valid vector");
        }
        Ok(Self {
            entities,
            vectors: Some(entity_vectors),
        })
    }

    pub fn entities(&self) -> &[String] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Matcher over a registry.
pub struct EntityMatcher {
    registry: EntityRegistry,
    threshold: f32,
}

impl EntityMatcher {
    pub fn new(registry: EntityRegistry, threshold: f32) -> Self {
        Self {
            registry,
            threshold,
        }
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    /// Token-subsequence matching.
    ///
    /// A phrase matching several entities gets their names joined with
    /// [`LABEL_SEPARATOR`] in registry order.
    pub fn match_tokens(&self, phrases: &[String]) -> Vec<(usize, String)> {
        let mut matches = Vec::new();
        for (i, phrase) in phrases.iter().enumerate() {
            let hits: Vec<&str> = self
                .registry
                .entities
                .iter()
                .filter(|entity| is_token_subsequence(entity, phrase))
                .map(String::as_str)
                .collect();
            if !hits.is_empty() {
                matches.push((i, hits.join(LABEL_SEPARATOR)));
            }
        }
        matches
    }

    /// Vector-similarity matching over precomputed phrase vectors (aligned
    /// with the phrase list the caller holds).
    ///
    /// A phrase matches its nearest entity only when the cosine distance is
    /// below the threshold; ties go to the first-minimum registry index.
    /// Invalid phrase vectors never match.
    pub fn match_vectors(&self, phrase_vectors: &[Vec<f32>]) -> Vec<(usize, String)> {
        let entity_vectors = match &self.registry.vectors {
            Some(vs) => vs,
            None => return Vec::new(),
        };

        let mut matches = Vec::new();
        for (i, pv) in phrase_vectors.iter().enumerate() {
            if !vectors::is_valid(pv) {
                continue;
            }
            let mut best: Option<(usize, f64)> = None;
            for (e, ev) in entity_vectors.iter().enumerate() {
                let Some(ev) = ev else { continue };
                let d = vectors::cosine_distance(pv, ev);
                // Strict less-than keeps the first minimum on ties.
                if best.map_or(true, |(_, bd)| d < bd) {
                    best = Some((e, d));
                }
            }
            if let Some((e, d)) = best {
                if d < self.threshold as f64 {
                    matches.push((i, self.registry.entities[e].clone()));
                }
            }
        }
        matches
    }
}
