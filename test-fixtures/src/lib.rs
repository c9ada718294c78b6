//! Deterministic test support for the fabula workspace.
//!
//! Vector sources here are pure functions of the phrase (blake3-based), so
//! tests are reproducible without any trained lexicon on disk.

use fabula_core::traits::IVectorSource;
use fabula_core::{NarrativeResult, Role, Statement};

/// Hash-based vector source: every phrase gets a deterministic
/// pseudo-random vector. An empty phrase yields the all-zero (invalid)
/// vector.
pub struct HashSource {
    dims: usize,
}

impl HashSource {
    pub fn new(dims: usize) -> Self {
        Self { dims }
    }
}

impl IVectorSource for HashSource {
    fn vector(&self, phrase: &str) -> NarrativeResult<Vec<f32>> {
        Ok(hash_vector(phrase, self.dims))
    }

    fn vectors(&self, phrases: &[String]) -> NarrativeResult<Vec<Vec<f32>>> {
        Ok(phrases.iter().map(|p| hash_vector(p, self.dims)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    fn name(&self) -> &str {
        "hash-fixture"
    }
}

/// Vector source with controllable cluster structure: phrases sharing a
/// first word land in one tight blob, so a test corpus's semantic grouping
/// is spelled out in its phrases.
pub struct TopicSource {
    dims: usize,
}

impl TopicSource {
    pub fn new(dims: usize) -> Self {
        Self { dims }
    }
}

impl IVectorSource for TopicSource {
    fn vector(&self, phrase: &str) -> NarrativeResult<Vec<f32>> {
        let Some(topic) = phrase.split_whitespace().next() else {
            return Ok(vec![0.0; self.dims]);
        };
        let mut center = hash_vector(topic, self.dims);
        // Scale the topic center out, then add a small phrase-specific
        // jitter so blob members are distinct but tight.
        let jitter = hash_vector(phrase, self.dims);
        for (c, j) in center.iter_mut().zip(&jitter) {
            *c = *c * 10.0 + j * 0.05;
        }
        Ok(center)
    }

    fn vectors(&self, phrases: &[String]) -> NarrativeResult<Vec<Vec<f32>>> {
        phrases.iter().map(|p| self.vector(p)).collect()
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    fn name(&self) -> &str {
        "topic-fixture"
    }
}

/// Deterministic pseudo-random vector in [-1, 1]^dims from a blake3 hash.
/// Empty input hashes to the all-zero (invalid) vector.
pub fn hash_vector(text: &str, dims: usize) -> Vec<f32> {
    if text.is_empty() {
        return vec![0.0; dims];
    }
    let mut out = Vec::with_capacity(dims);
    let mut counter = 0u32;
    'outer: loop {
        let mut hasher = blake3::Hasher::new();
        hasher.update(text.as_bytes());
        hasher.update(&counter.to_le_bytes());
        for byte in hasher.finalize().as_bytes() {
            out.push((*byte as f32 / 255.0) * 2.0 - 1.0);
            if out.len() == dims {
                break 'outer;
            }
        }
        counter += 1;
    }
    out
}

/// Build a statement from (role, filler) pairs.
pub fn statement(pairs: &[(Role, &str)]) -> Statement {
    let mut s = Statement::new();
    for (role, filler) in pairs {
        s.set(*role, *filler);
    }
    s
}

/// A corpus with one agent-role statement per phrase, each carrying a verb.
pub fn agent_corpus(agents: &[&str]) -> Vec<Statement> {
    agents
        .iter()
        .map(|a| statement(&[(Role::Agent, *a), (Role::Verb, "said")]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabula_core::vectors::{cosine_similarity, is_valid};

    #[test]
    fn hash_vectors_are_deterministic() {
        assert_eq!(hash_vector("phrase", 64), hash_vector("phrase", 64));
        assert_ne!(hash_vector("phrase", 64), hash_vector("other", 64));
    }

    #[test]
    fn hash_vector_fills_any_dimension() {
        assert_eq!(hash_vector("x", 100).len(), 100);
        assert!(is_valid(&hash_vector("x", 100)));
    }

    #[test]
    fn empty_phrase_is_invalid() {
        assert!(!is_valid(&hash_vector("", 32)));
    }

    #[test]
    fn topic_source_groups_by_first_word() {
        let s = TopicSource::new(32);
        let a = s.vector("rates went up").unwrap();
        let b = s.vector("rates went down").unwrap();
        let c = s.vector("farmers protested loudly").unwrap();
        assert!(cosine_similarity(&a, &b) > cosine_similarity(&a, &c));
    }

    #[test]
    fn agent_corpus_has_one_statement_per_phrase() {
        let corpus = agent_corpus(&["a b", "c d"]);
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus[0].get(Role::Agent), Some("a b"));
        assert_eq!(corpus[0].get(Role::Verb), Some("said"));
    }
}
