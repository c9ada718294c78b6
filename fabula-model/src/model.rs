//! NarrativeModel: the fit/predict orchestrator.

use std::collections::{BTreeMap, BTreeSet};

use fabula_core::errors::ModelError;
use fabula_core::traits::IVectorSource;
use fabula_core::vectors;
use fabula_core::{MatchStrategy, NarrativeConfig, NarrativeResult, Statement};
use tracing::{debug, info};

use crate::cluster::selection::{self, SelectionDiagnostics};
use crate::cluster::ClusterModel;
use crate::labeling::ClusterVocabulary;
use crate::matcher::{EntityMatcher, EntityRegistry};
use crate::reduce::DimensionalityReducer;
use crate::vocab;

/// Everything a successful fit produces, as one immutable value.
///
/// Re-fitting replaces the whole FitResult; nothing accumulates in place.
pub struct FitResult {
    pub(crate) training_phrases: Vec<String>,
    pub(crate) reducer: DimensionalityReducer,
    pub(crate) cluster_model: ClusterModel,
    pub(crate) vocabulary: ClusterVocabulary,
    pub(crate) diagnostics: SelectionDiagnostics,
}

/// The narrative clustering model.
///
/// Construction validates the configuration eagerly and, for the
/// vector-similarity strategy, precomputes the entity registry vectors.
/// After a successful `fit` the model is read-only; `predict` can be called
/// from multiple threads.
pub struct NarrativeModel {
    config: NarrativeConfig,
    source: Box<dyn IVectorSource>,
    matcher: EntityMatcher,
    state: Option<FitResult>,
}

impl NarrativeModel {
    pub fn new(config: NarrativeConfig, source: Box<dyn IVectorSource>) -> NarrativeResult<Self> {
        config.validate()?;

        let entities = config.known_entities.clone();
        let registry = match config.match_strategy {
            MatchStrategy::VectorSimilarity if !entities.is_empty() => {
                EntityRegistry::with_vectors(entities, source.as_ref())?
            }
            _ => EntityRegistry::new(entities),
        };
        let matcher = EntityMatcher::new(registry, config.similarity_threshold);

        info!(
            source = source.name(),
            entities = matcher.registry().len(),
            strategy = ?config.match_strategy,
            "narrative model constructed"
        );

        Ok(Self {
            config,
            source,
            matcher,
            state: None,
        })
    }

    pub fn config(&self) -> &NarrativeConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        self.state.is_some()
    }

    /// Retained grid-search diagnostics from the last fit.
    pub fn diagnostics(&self) -> Option<&SelectionDiagnostics> {
        self.state.as_ref().map(|s| &s.diagnostics)
    }

    /// Cluster vocabulary and labels from the last fit.
    pub fn vocabulary(&self) -> Option<&ClusterVocabulary> {
        self.state.as_ref().map(|s| &s.vocabulary)
    }

    /// Phrases whose vectors made up the training set.
    pub fn training_phrases(&self) -> Option<&[String]> {
        self.state.as_ref().map(|s| s.training_phrases.as_slice())
    }

    /// Fit the model on a corpus.
    ///
    /// All-or-nothing: on error no partial state is retained, and a second
    /// fit replaces the previous state wholesale.
    pub fn fit(&mut self, corpus: &[Statement]) -> NarrativeResult<()> {
        let mut corpus_counts: BTreeMap<String, u64> = BTreeMap::new();
        let mut pool: BTreeSet<String> = BTreeSet::new();

        for &role in &self.config.roles_with_unknown_entities {
            let role_counts = vocab::role_vocabulary(corpus, role);
            let phrases: Vec<String> = role_counts.keys().cloned().collect();
            vocab::merge_counts(&mut corpus_counts, &role_counts);

            let claimed: BTreeSet<usize> =
                if self.config.roles_with_known_entities.contains(&role) {
                    self.match_known(&phrases)?
                        .into_iter()
                        .map(|(i, _)| i)
                        .collect()
                } else {
                    BTreeSet::new()
                };

            debug!(
                role = %role,
                fillers = phrases.len(),
                claimed = claimed.len(),
                "role vocabulary extracted"
            );

            pool.extend(
                phrases
                    .into_iter()
                    .enumerate()
                    .filter(|(i, _)| !claimed.contains(i))
                    .map(|(_, p)| p),
            );
        }

        let pool: Vec<String> = pool.into_iter().collect();
        if pool.is_empty() {
            return Err(ModelError::InsufficientData {
                context: "training pool",
                needed: 1,
                available: 0,
            }
            .into());
        }

        let raw = self.source.vectors(&pool)?;
        let mut training_phrases = Vec::with_capacity(pool.len());
        let mut training_vectors = Vec::with_capacity(pool.len());
        for (phrase, vector) in pool.into_iter().zip(raw) {
            if vectors::is_valid(&vector) {
                training_phrases.push(phrase);
                training_vectors.push(vector);
            } else {
                debug!(phrase = %phrase, "dropping phrase without a valid vector");
            }
        }
        if training_vectors.is_empty() {
            return Err(ModelError::InsufficientData {
                context: "valid training vectors",
                needed: 1,
                available: 0,
            }
            .into());
        }

        let (reducer, reduced) =
            DimensionalityReducer::fit(&training_vectors, &self.config.reducer)?;
        let outcome = selection::select(&reduced, &self.config.clustering)?;
        let vocabulary = ClusterVocabulary::build(
            outcome.model.training_labels(),
            &training_phrases,
            &corpus_counts,
            outcome.model.has_noise(),
        );

        info!(
            training_phrases = training_phrases.len(),
            clusters = vocabulary.len(),
            "narrative model fitted"
        );

        self.state = Some(FitResult {
            training_phrases,
            reducer,
            cluster_model: outcome.model,
            vocabulary,
            diagnostics: outcome.diagnostics,
        });
        Ok(())
    }

    /// Predict narrative labels for a corpus.
    ///
    /// Returns a new corpus of the same length and order; the input is
    /// never mutated. Per role: known-entity label first, else cluster
    /// label; a filler with neither is dropped from the output statement.
    /// Non-embeddable roles are carried through unchanged.
    pub fn predict(&self, corpus: &[Statement]) -> NarrativeResult<Vec<Statement>> {
        let state = self.state.as_ref().ok_or(ModelError::NotFitted)?;
        let mut output = corpus.to_vec();

        for &role in &self.config.roles_considered {
            if !role.is_embeddable() {
                continue;
            }

            let (indices, phrases) = vocab::fillers_for_role(corpus, role);
            if phrases.is_empty() {
                continue;
            }

            let mut labels: Vec<Option<String>> = vec![None; phrases.len()];
            let mut phrase_vectors: Option<Vec<Vec<f32>>> = None;

            if self.config.roles_with_known_entities.contains(&role) {
                let matches = match self.config.match_strategy {
                    MatchStrategy::TokenSubsequence => self.matcher.match_tokens(&phrases),
                    MatchStrategy::VectorSimilarity => {
                        let vs = self.source.vectors(&phrases)?;
                        let matches = self.matcher.match_vectors(&vs);
                        phrase_vectors = Some(vs);
                        matches
                    }
                };
                for (i, label) in matches {
                    labels[i] = Some(label);
                }
            }

            if self.config.roles_with_unknown_entities.contains(&role) {
                let vs = match phrase_vectors {
                    Some(vs) => vs,
                    None => self.source.vectors(&phrases)?,
                };
                for (i, vector) in vs.iter().enumerate() {
                    // Known-entity labels take priority.
                    if labels[i].is_some() {
                        continue;
                    }
                    // An invalid vector is unassignable; the role gets
                    // dropped below.
                    if !vectors::is_valid(vector) {
                        continue;
                    }
                    let reduced = state.reducer.transform(vector);
                    let cluster = state.cluster_model.assign(&reduced);
                    if let Some(label) = state.vocabulary.label(cluster) {
                        if !label.is_empty() {
                            labels[i] = Some(label.to_string());
                        }
                    }
                }
            }

            for (label, &statement_idx) in labels.iter().zip(&indices) {
                match label {
                    Some(l) => output[statement_idx].set(role, l.clone()),
                    None => {
                        output[statement_idx].remove(role);
                    }
                }
            }
        }

        Ok(output)
    }

    fn match_known(&self, phrases: &[String]) -> NarrativeResult<Vec<(usize, String)>> {
        match self.config.match_strategy {
            MatchStrategy::TokenSubsequence => Ok(self.matcher.match_tokens(phrases)),
            MatchStrategy::VectorSimilarity => {
                let vs = self.source.vectors(phrases)?;
                Ok(self.matcher.match_vectors(&vs))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabula_core::{ClusterFamilyConfig, Role};

    /// Vector source that maps phrases onto one of two distant blobs based
    /// on a keyword, with a per-phrase jitter.
    struct BlobSource;

    impl IVectorSource for BlobSource {
        fn vector(&self, phrase: &str) -> NarrativeResult<Vec<f32>> {
            if phrase.is_empty() {
                return Ok(vec![0.0; 4]);
            }
            let jitter = (phrase.len() % 7) as f32 * 0.01;
            let base = if phrase.contains("rates") { 0.0 } else { 5.0 };
            Ok(vec![base + jitter, base - jitter, base, 1.0])
        }
        fn vectors(&self, phrases: &[String]) -> NarrativeResult<Vec<Vec<f32>>> {
            phrases.iter().map(|p| self.vector(p)).collect()
        }
        fn dimensions(&self) -> usize {
            4
        }
        fn name(&self) -> &str {
            "blob-test"
        }
    }

    fn small_config() -> NarrativeConfig {
        let mut config = NarrativeConfig::default();
        config.known_entities = vec!["United States".to_string()];
        config.reducer.pca_rank = 2;
        config.reducer.neighbors = 3;
        config.clustering = ClusterFamilyConfig::Centroid {
            candidate_counts: vec![2, 3],
            seed: 0,
        };
        config
    }

    fn corpus() -> Vec<Statement> {
        let agents = [
            "cut interest rates",
            "raise interest rates",
            "lower interest rates",
            "interest rates policy",
            "steady interest rates",
            "farm subsidies",
            "crop subsidies",
            "dairy subsidies",
            "export subsidies",
            "subsidies for corn",
        ];
        agents
            .iter()
            .map(|a| {
                Statement::new()
                    .with(Role::Agent, *a)
                    .with(Role::Verb, "announced")
            })
            .collect()
    }

    #[test]
    fn construction_rejects_invalid_config() {
        let mut config = small_config();
        config.known_entities.clear();
        assert!(NarrativeModel::new(config, Box::new(BlobSource)).is_err());
    }

    #[test]
    fn predict_before_fit_is_an_error() {
        let model = NarrativeModel::new(small_config(), Box::new(BlobSource)).unwrap();
        assert!(model.predict(&corpus()).is_err());
    }

    #[test]
    fn fit_populates_state() {
        let mut model = NarrativeModel::new(small_config(), Box::new(BlobSource)).unwrap();
        model.fit(&corpus()).unwrap();
        assert!(model.is_fitted());
        assert!(model.diagnostics().is_some());
        assert!(model.vocabulary().is_some());
        assert_eq!(model.training_phrases().unwrap().len(), 10);
    }

    #[test]
    fn fit_on_empty_corpus_fails_without_state() {
        let mut model = NarrativeModel::new(small_config(), Box::new(BlobSource)).unwrap();
        assert!(model.fit(&[]).is_err());
        assert!(!model.is_fitted());
    }

    #[test]
    fn predict_does_not_mutate_the_input() {
        let mut model = NarrativeModel::new(small_config(), Box::new(BlobSource)).unwrap();
        let corpus = corpus();
        model.fit(&corpus).unwrap();
        let before = corpus.clone();
        let _ = model.predict(&corpus).unwrap();
        assert_eq!(corpus, before);
    }

    #[test]
    fn verbs_are_carried_through_unchanged() {
        let mut model = NarrativeModel::new(small_config(), Box::new(BlobSource)).unwrap();
        let corpus = corpus();
        model.fit(&corpus).unwrap();
        let predicted = model.predict(&corpus).unwrap();
        assert!(predicted
            .iter()
            .all(|s| s.get(Role::Verb) == Some("announced")));
    }
}
