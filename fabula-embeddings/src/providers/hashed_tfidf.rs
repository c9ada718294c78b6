//! Feature-hashing vector source.
//!
//! Signed hashing of unigrams and adjacent bigrams into fixed-dimension
//! buckets. Deterministic, dependency-free, always available; the fallback
//! when no trained lexicon is configured.

use fabula_core::traits::IVectorSource;
use fabula_core::vectors;
use fabula_core::NarrativeResult;

const BIGRAM_WEIGHT: f32 = 0.7;

/// Hashed bag-of-terms vector source.
///
/// Each term lands in one bucket with a hash-derived sign, which keeps
/// collisions from piling up in one direction. An empty phrase yields the
/// all-zero (invalid) vector.
pub struct HashedTfIdf {
    dimensions: usize,
}

impl HashedTfIdf {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    /// FNV-1a over the term bytes.
    fn hash(term: &str) -> u64 {
        let mut h: u64 = 0xcbf29ce484222325;
        for b in term.as_bytes() {
            h ^= *b as u64;
            h = h.wrapping_mul(0x100000001b3);
        }
        h
    }

    fn accumulate(&self, term: &str, weight: f32, out: &mut [f32]) {
        let h = Self::hash(term);
        let bucket = (h >> 1) as usize % self.dimensions;
        let sign = if h & 1 == 0 { 1.0 } else { -1.0 };
        out[bucket] += sign * weight;
    }

    fn phrase_vector(&self, phrase: &str) -> Vec<f32> {
        let tokens: Vec<String> = phrase
            .split_whitespace()
            .map(|t| t.to_lowercase())
            .collect();

        let mut out = vec![0.0f32; self.dimensions];
        if tokens.is_empty() {
            return out;
        }

        for tok in &tokens {
            self.accumulate(tok, 1.0, &mut out);
        }
        for pair in tokens.windows(2) {
            let bigram = format!("{} {}", pair[0], pair[1]);
            self.accumulate(&bigram, BIGRAM_WEIGHT, &mut out);
        }

        vectors::l2_normalize(&mut out);
        out
    }
}

impl IVectorSource for HashedTfIdf {
    fn vector(&self, phrase: &str) -> NarrativeResult<Vec<f32>> {
        Ok(self.phrase_vector(phrase))
    }

    fn vectors(&self, phrases: &[String]) -> NarrativeResult<Vec<Vec<f32>>> {
        Ok(phrases.iter().map(|p| self.phrase_vector(p)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "hashed-tfidf"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_phrase_is_invalid() {
        let s = HashedTfIdf::new(128);
        let v = s.vector("").unwrap();
        assert!(!vectors::is_valid(&v));
    }

    #[test]
    fn produces_requested_dimensions() {
        let s = HashedTfIdf::new(384);
        assert_eq!(s.vector("cut interest rates").unwrap().len(), 384);
    }

    #[test]
    fn deterministic() {
        let s = HashedTfIdf::new(128);
        assert_eq!(
            s.vector("the federal reserve").unwrap(),
            s.vector("the federal reserve").unwrap()
        );
    }

    #[test]
    fn case_insensitive() {
        let s = HashedTfIdf::new(128);
        assert_eq!(
            s.vector("United States").unwrap(),
            s.vector("united states").unwrap()
        );
    }

    #[test]
    fn word_order_changes_the_vector() {
        // Bigram buckets make order matter.
        let s = HashedTfIdf::new(128);
        assert_ne!(
            s.vector("rates interest cut").unwrap(),
            s.vector("cut interest rates").unwrap()
        );
    }

    #[test]
    fn overlapping_phrases_are_closer_than_disjoint_ones() {
        let s = HashedTfIdf::new(256);
        let a = s.vector("cut interest rates").unwrap();
        let b = s.vector("raise interest rates").unwrap();
        let c = s.vector("illegal aliens").unwrap();
        let ab = vectors::cosine_similarity(&a, &b);
        let ac = vectors::cosine_similarity(&a, &c);
        assert!(ab > ac);
    }

    #[test]
    fn batch_matches_individual() {
        let s = HashedTfIdf::new(64);
        let phrases = vec!["one two".to_string(), "three".to_string()];
        let batch = s.vectors(&phrases).unwrap();
        for (i, p) in phrases.iter().enumerate() {
            assert_eq!(batch[i], s.vector(p).unwrap());
        }
    }
}
