//! Model configuration.
//!
//! Validated eagerly by `NarrativeConfig::validate`; a model is never
//! constructed from an invalid configuration.

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::statement::Role;

/// Default values, kept in one place so configs and docs agree.
pub mod defaults {
    pub const PCA_RANK: usize = 50;
    pub const NEIGHBORS: usize = 15;
    pub const TARGET_RANK: usize = 2;
    pub const SEED: u64 = 0;
    pub const SIMILARITY_THRESHOLD: f32 = 0.1;
    pub const CENTROID_CANDIDATES: [usize; 5] = [50, 100, 150, 200, 250];
    pub const MIN_CLUSTER_SIZES: [usize; 4] = [10, 30, 50, 100];
    pub const MIN_SAMPLES: [usize; 3] = [5, 10, 20];
    pub const SELECTION_EPSILONS: [f32; 1] = [0.0];
}

/// How fillers are assigned to known entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// The entity's words must appear as an order-preserving subsequence of
    /// the filler's words.
    TokenSubsequence,
    /// Cosine distance from the filler vector to the nearest entity vector
    /// must fall below the configured threshold.
    VectorSimilarity,
}

/// Two-stage dimensionality reduction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReducerConfig {
    /// Rank of the stage-1 orthogonal projection.
    pub pca_rank: usize,
    /// Neighbor count for the stage-2 embedding graph.
    pub neighbors: usize,
    /// Output dimensionality of stage 2.
    pub target_rank: usize,
    /// Seed for every randomized reduction sub-step.
    pub seed: u64,
}

impl Default for ReducerConfig {
    fn default() -> Self {
        Self {
            pca_rank: defaults::PCA_RANK,
            neighbors: defaults::NEIGHBORS,
            target_rank: defaults::TARGET_RANK,
            seed: defaults::SEED,
        }
    }
}

/// The clustering algorithm family and its hyperparameter grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterFamilyConfig {
    /// k-means over a candidate list of cluster counts, scored by mean
    /// silhouette. Exposes centroids for nearest-centroid prediction.
    Centroid { candidate_counts: Vec<usize>, seed: u64 },
    /// HDBSCAN over a grid of (min cluster size, min samples, selection
    /// epsilon), scored by a density-validity index. Supports a noise
    /// cluster and approximate assignment of new points.
    Density {
        min_cluster_sizes: Vec<usize>,
        min_samples: Vec<usize>,
        selection_epsilons: Vec<f32>,
    },
}

impl Default for ClusterFamilyConfig {
    fn default() -> Self {
        Self::Density {
            min_cluster_sizes: defaults::MIN_CLUSTER_SIZES.to_vec(),
            min_samples: defaults::MIN_SAMPLES.to_vec(),
            selection_epsilons: defaults::SELECTION_EPSILONS.to_vec(),
        }
    }
}

/// Full model configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrativeConfig {
    /// Roles read from statements at fit and predict time.
    pub roles_considered: Vec<Role>,
    /// Roles whose fillers are matched against the known-entity registry.
    pub roles_with_known_entities: Vec<Role>,
    /// Roles whose unmatched fillers are clustered. Must be embeddable.
    pub roles_with_unknown_entities: Vec<Role>,
    /// Canonical entity names, in registry order.
    pub known_entities: Vec<String>,
    pub match_strategy: MatchStrategy,
    /// Cosine-distance cutoff for `MatchStrategy::VectorSimilarity`:
    /// a filler matches only when distance to the nearest entity is below
    /// this value.
    pub similarity_threshold: f32,
    pub reducer: ReducerConfig,
    pub clustering: ClusterFamilyConfig,
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        let embeddable: Vec<Role> = Role::all()
            .into_iter()
            .filter(|r| r.is_embeddable())
            .collect();
        Self {
            roles_considered: Role::all().to_vec(),
            roles_with_known_entities: embeddable.clone(),
            roles_with_unknown_entities: embeddable,
            known_entities: Vec::new(),
            match_strategy: MatchStrategy::TokenSubsequence,
            similarity_threshold: defaults::SIMILARITY_THRESHOLD,
            reducer: ReducerConfig::default(),
            clustering: ClusterFamilyConfig::default(),
        }
    }
}

impl NarrativeConfig {
    /// Validate the configuration. Called by `NarrativeModel::new`; all
    /// configuration problems surface here, none later.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.roles_considered.is_empty() {
            return Err(ConfigError::NoRoles);
        }
        let mut seen = std::collections::BTreeSet::new();
        for role in &self.roles_considered {
            if !seen.insert(*role) {
                return Err(ConfigError::DuplicateRole {
                    role: role.to_string(),
                });
            }
        }

        for role in self
            .roles_with_known_entities
            .iter()
            .chain(&self.roles_with_unknown_entities)
        {
            if !self.roles_considered.contains(role) {
                return Err(ConfigError::RoleNotConsidered {
                    role: role.to_string(),
                });
            }
        }

        for role in &self.roles_with_unknown_entities {
            if !role.is_embeddable() {
                return Err(ConfigError::NotEmbeddable {
                    role: role.to_string(),
                });
            }
        }

        if !self.roles_with_known_entities.is_empty() && self.known_entities.is_empty() {
            return Err(ConfigError::EmptyRegistry);
        }
        if self.known_entities.iter().any(|e| e.trim().is_empty()) {
            return Err(ConfigError::BlankEntity);
        }

        if self.match_strategy == MatchStrategy::VectorSimilarity
            && !(self.similarity_threshold.is_finite() && self.similarity_threshold > 0.0)
        {
            return Err(ConfigError::BadThreshold {
                value: self.similarity_threshold,
            });
        }

        self.validate_reducer()?;
        self.validate_clustering()
    }

    fn validate_reducer(&self) -> Result<(), ConfigError> {
        let r = &self.reducer;
        if r.pca_rank == 0 || r.target_rank == 0 {
            return Err(ConfigError::Reducer {
                reason: "ranks must be at least 1".to_string(),
            });
        }
        if r.target_rank > r.pca_rank {
            return Err(ConfigError::Reducer {
                reason: format!(
                    "target rank {} exceeds projection rank {}",
                    r.target_rank, r.pca_rank
                ),
            });
        }
        if r.neighbors == 0 {
            return Err(ConfigError::Reducer {
                reason: "neighbor count must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    fn validate_clustering(&self) -> Result<(), ConfigError> {
        match &self.clustering {
            ClusterFamilyConfig::Centroid { candidate_counts, .. } => {
                if candidate_counts.is_empty() {
                    return Err(ConfigError::Clustering {
                        reason: "no candidate cluster counts".to_string(),
                    });
                }
                if let Some(&k) = candidate_counts.iter().find(|&&k| k < 2) {
                    return Err(ConfigError::Clustering {
                        reason: format!("cluster count {k} is below 2"),
                    });
                }
            }
            ClusterFamilyConfig::Density {
                min_cluster_sizes,
                min_samples,
                selection_epsilons,
            } => {
                if min_cluster_sizes.is_empty()
                    || min_samples.is_empty()
                    || selection_epsilons.is_empty()
                {
                    return Err(ConfigError::Clustering {
                        reason: "empty density hyperparameter axis".to_string(),
                    });
                }
                if let Some(&m) = min_cluster_sizes.iter().find(|&&m| m < 2) {
                    return Err(ConfigError::Clustering {
                        reason: format!("min cluster size {m} is below 2"),
                    });
                }
                if let Some(&e) = selection_epsilons.iter().find(|e| !e.is_finite() || **e < 0.0)
                {
                    return Err(ConfigError::Clustering {
                        reason: format!("selection epsilon {e} is not a non-negative number"),
                    });
                }
            }
        }
        Ok(())
    }
}
