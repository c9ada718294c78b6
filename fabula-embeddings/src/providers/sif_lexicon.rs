//! Word-lexicon vector source with smooth-inverse-frequency weighting.
//!
//! A phrase vector is the SIF-weighted mean of its tokens' word vectors,
//! weight = α / (α + corpus count of the word). Words absent from the
//! lexicon are skipped; a phrase with no known words yields the all-zero
//! (invalid) vector.

use std::collections::HashMap;
use std::io::Read;

use fabula_core::errors::ModelError;
use fabula_core::traits::IVectorSource;
use fabula_core::NarrativeResult;
use tracing::debug;

const DEFAULT_ALPHA: f32 = 0.001;

/// SIF-weighted word-lexicon source.
pub struct SifLexicon {
    vectors: HashMap<String, Vec<f32>>,
    sif_weights: HashMap<String, f32>,
    dimensions: usize,
    alpha: f32,
}

impl SifLexicon {
    /// Build from a word→vector table and corpus word counts.
    ///
    /// Every lexicon vector must share one dimensionality.
    pub fn new(
        lexicon: HashMap<String, Vec<f32>>,
        word_counts: &HashMap<String, u64>,
        alpha: Option<f32>,
    ) -> NarrativeResult<Self> {
        let alpha = alpha.unwrap_or(DEFAULT_ALPHA);
        let dimensions = lexicon
            .values()
            .next()
            .map(Vec::len)
            .ok_or(ModelError::InsufficientData {
                context: "lexicon",
                needed: 1,
                available: 0,
            })?;
        if let Some(bad) = lexicon.values().find(|v| v.len() != dimensions) {
            return Err(ModelError::DimensionMismatch {
                expected: dimensions,
                actual: bad.len(),
            }
            .into());
        }

        let sif_weights = word_counts
            .iter()
            .map(|(w, &count)| (w.clone(), alpha / (alpha + count as f32)))
            .collect();

        debug!(
            words = lexicon.len(),
            dims = dimensions,
            "SIF lexicon loaded"
        );

        Ok(Self {
            vectors: lexicon,
            sif_weights,
            dimensions,
            alpha,
        })
    }

    /// Load a JSON lexicon of the form `{"word": [f32, ...], ...}`.
    pub fn from_json<R: Read>(
        reader: R,
        word_counts: &HashMap<String, u64>,
        alpha: Option<f32>,
    ) -> NarrativeResult<Self> {
        let lexicon: HashMap<String, Vec<f32>> =
            serde_json::from_reader(reader).map_err(|e| ModelError::VectorSource {
                source_name: "sif-lexicon".to_string(),
                reason: format!("lexicon parse failed: {e}"),
            })?;
        Self::new(lexicon, word_counts, alpha)
    }

    /// SIF weight for a word. Unseen words get the maximum weight 1.0.
    fn weight(&self, word: &str) -> f32 {
        self.sif_weights.get(word).copied().unwrap_or(1.0)
    }

    fn phrase_vector(&self, phrase: &str) -> Vec<f32> {
        let mut out = vec![0.0f32; self.dimensions];
        let mut used = 0usize;

        for token in phrase.split_whitespace() {
            let token = token.to_lowercase();
            if let Some(v) = self.vectors.get(&token) {
                let w = self.weight(&token);
                for (o, x) in out.iter_mut().zip(v) {
                    *o += w * x;
                }
                used += 1;
            }
        }

        if used > 0 {
            let n = used as f32;
            for o in &mut out {
                *o /= n;
            }
        }
        out
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }
}

impl IVectorSource for SifLexicon {
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
        "sif-lexicon"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lexicon() -> HashMap<String, Vec<f32>> {
        HashMap::from([
            ("interest".to_string(), vec![1.0, 0.0]),
            ("rates".to_string(), vec![0.0, 1.0]),
        ])
    }

    fn counts() -> HashMap<String, u64> {
        HashMap::from([("interest".to_string(), 9), ("rates".to_string(), 1)])
    }

    #[test]
    fn empty_lexicon_is_rejected() {
        let res = SifLexicon::new(HashMap::new(), &HashMap::new(), None);
        assert!(res.is_err());
    }

    #[test]
    fn inconsistent_dimensions_are_rejected() {
        let mut lex = lexicon();
        lex.insert("bad".to_string(), vec![1.0, 2.0, 3.0]);
        assert!(SifLexicon::new(lex, &counts(), None).is_err());
    }

    #[test]
    fn frequent_words_get_smaller_weight() {
        let s = SifLexicon::new(lexicon(), &counts(), Some(1.0)).unwrap();
        // alpha/(alpha+9) < alpha/(alpha+1)
        assert!(s.weight("interest") < s.weight("rates"));
        assert_eq!(s.weight("unseen"), 1.0);
    }

    #[test]
    fn unknown_words_yield_invalid_vector() {
        let s = SifLexicon::new(lexicon(), &counts(), None).unwrap();
        let v = s.vector("completely unknown words").unwrap();
        assert!(!fabula_core::vectors::is_valid(&v));
    }

    #[test]
    fn known_words_average_in() {
        let s = SifLexicon::new(lexicon(), &HashMap::new(), None).unwrap();
        let v = s.vector("interest rates").unwrap();
        assert!(fabula_core::vectors::is_valid(&v));
        assert!(v[0] > 0.0 && v[1] > 0.0);
    }

    #[test]
    fn loads_from_json() {
        let json = r#"{"tax": [0.5, 0.5], "cut": [1.0, 0.0]}"#;
        let s = SifLexicon::from_json(json.as_bytes(), &HashMap::new(), None).unwrap();
        assert_eq!(s.dimensions(), 2);
        assert!(fabula_core::vectors::is_valid(&s.vector("cut tax").unwrap()));
    }
}
