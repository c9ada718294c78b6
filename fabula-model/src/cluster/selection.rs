//! Hyperparameter grid search and model selection.
//!
//! Every grid point is fitted and scored independently (in parallel); the
//! argmax is taken only after the whole grid completes. The full grid and
//! score list are retained for diagnostics.

use fabula_core::errors::ModelError;
use fabula_core::ClusterFamilyConfig;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use super::grid::{expand_grid, ClusterParams};
use super::{density, kmeans, ClusterModel};

/// Retained search results, queryable after fit for inspection or external
/// plotting. Scores align with the grid; failed candidates score NaN.
#[derive(Debug, Clone, Serialize)]
pub struct SelectionDiagnostics {
    pub grid: Vec<ClusterParams>,
    pub scores: Vec<f64>,
    /// Index of the selected grid point.
    pub selected: usize,
}

/// The selected model plus its diagnostics.
pub struct SelectionOutcome {
    pub model: ClusterModel,
    pub diagnostics: SelectionDiagnostics,
}

/// Evaluate the full grid on the reduced training vectors and select the
/// best-scoring candidate (first occurrence wins ties).
pub fn select(
    data: &[Vec<f32>],
    config: &ClusterFamilyConfig,
) -> Result<SelectionOutcome, ModelError> {
    let grid = expand_grid(config);
    if grid.len() < 2 {
        return Err(ModelError::InsufficientData {
            context: "hyperparameter grid",
            needed: 2,
            available: grid.len(),
        });
    }

    let evaluated: Vec<(Option<ClusterModel>, f64)> = grid
        .par_iter()
        .map(|params| evaluate(data, params))
        .collect();

    let scores: Vec<f64> = evaluated.iter().map(|(_, score)| *score).collect();
    for (params, score) in grid.iter().zip(&scores) {
        debug!(candidate = %params, score, "grid point evaluated");
    }

    // Strict greater-than keeps the first occurrence on ties; NaN never wins.
    let mut selected = None;
    let mut best_score = f64::NEG_INFINITY;
    for (i, (model, score)) in evaluated.iter().enumerate() {
        if model.is_some() && score.is_finite() && *score > best_score {
            selected = Some(i);
            best_score = *score;
        }
    }

    let Some(selected) = selected else {
        return Err(ModelError::DegenerateSelection {
            reason: "every candidate score is undefined".to_string(),
        });
    };

    info!(
        candidate = %grid[selected],
        score = best_score,
        grid_size = grid.len(),
        "cluster model selected"
    );

    let model = evaluated
        .into_iter()
        .nth(selected)
        .and_then(|(model, _)| model)
        .expect("selected candidate was fitted");

    Ok(SelectionOutcome {
        model,
        diagnostics: SelectionDiagnostics {
            grid,
            scores,
            selected,
        },
    })
}

fn evaluate(data: &[Vec<f32>], params: &ClusterParams) -> (Option<ClusterModel>, f64) {
    match params {
        ClusterParams::Centroid { clusters, seed } => match kmeans::fit(data, *clusters, *seed) {
            Ok(model) => {
                let score = kmeans::silhouette_score(data, model.labels());
                (Some(ClusterModel::Centroid(model)), score)
            }
            Err(e) => {
                debug!(candidate = %params, error = %e, "candidate fit failed");
                (None, f64::NAN)
            }
        },
        ClusterParams::Density {
            min_cluster_size,
            min_samples,
            selection_epsilon,
        } => match density::fit(data, *min_cluster_size, *min_samples, *selection_epsilon) {
            Ok(model) => {
                let score = density::validity_index(data, model.labels());
                (Some(ClusterModel::Density(model)), score)
            }
            Err(e) => {
                debug!(candidate = %params, error = %e, "candidate fit failed");
                (None, f64::NAN)
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two tight blobs, enough points for small grids.
    fn two_blobs() -> Vec<Vec<f32>> {
        let mut data = Vec::new();
        for i in 0..8 {
            let j = i as f32 * 0.02;
            data.push(vec![j, j]);
            data.push(vec![6.0 + j, 6.0 - j]);
        }
        data
    }

    #[test]
    fn single_candidate_grid_is_rejected() {
        let config = ClusterFamilyConfig::Centroid {
            candidate_counts: vec![2],
            seed: 0,
        };
        assert!(matches!(
            select(&two_blobs(), &config),
            Err(ModelError::InsufficientData { .. })
        ));
    }

    #[test]
    fn centroid_selection_picks_the_true_count() {
        let config = ClusterFamilyConfig::Centroid {
            candidate_counts: vec![2, 4, 6],
            seed: 0,
        };
        let outcome = select(&two_blobs(), &config).unwrap();
        assert_eq!(outcome.diagnostics.selected, 0);
        assert!(matches!(outcome.model, ClusterModel::Centroid(_)));
        assert!(outcome.model.centroids().is_some());
        assert_eq!(outcome.diagnostics.scores.len(), 3);
    }

    #[test]
    fn density_selection_returns_a_noise_capable_model() {
        let config = ClusterFamilyConfig::Density {
            min_cluster_sizes: vec![3, 4],
            min_samples: vec![2],
            selection_epsilons: vec![0.0],
        };
        let outcome = select(&two_blobs(), &config).unwrap();
        assert!(outcome.model.has_noise());
        assert!(outcome.model.centroids().is_none());
    }

    #[test]
    fn all_candidates_failing_is_an_error() {
        // Every k exceeds the point count, so every fit fails.
        let config = ClusterFamilyConfig::Centroid {
            candidate_counts: vec![50, 60],
            seed: 0,
        };
        let data = vec![vec![0.0, 0.0], vec![1.0, 1.0], vec![2.0, 2.0]];
        assert!(matches!(
            select(&data, &config),
            Err(ModelError::DegenerateSelection { .. })
        ));
    }

    #[test]
    fn diagnostics_scores_align_with_grid() {
        let config = ClusterFamilyConfig::Centroid {
            candidate_counts: vec![2, 4, 8],
            seed: 0,
        };
        let outcome = select(&two_blobs(), &config).unwrap();
        let d = &outcome.diagnostics;
        assert_eq!(d.grid.len(), d.scores.len());
        let best = d.scores[d.selected];
        assert!(d
            .scores
            .iter()
            .filter(|s| s.is_finite())
            .all(|&s| s <= best));
    }
}
