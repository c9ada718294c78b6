//! Typed hyperparameter grids.
//!
//! The Cartesian product is expanded up front, in a fixed enumeration
//! order, so each grid point can be fitted and scored independently and
//! first-occurrence tie-breaks are well defined.

use fabula_core::ClusterFamilyConfig;
use serde::Serialize;

/// One candidate hyperparameter combination.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterParams {
    Centroid {
        clusters: usize,
        seed: u64,
    },
    Density {
        min_cluster_size: usize,
        min_samples: usize,
        selection_epsilon: f32,
    },
}

impl std::fmt::Display for ClusterParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClusterParams::Centroid { clusters, .. } => write!(f, "kmeans(k={clusters})"),
            ClusterParams::Density {
                min_cluster_size,
                min_samples,
                selection_epsilon,
            } => write!(
                f,
                "hdbscan(min_cluster_size={min_cluster_size}, min_samples={min_samples}, epsilon={selection_epsilon})"
            ),
        }
    }
}

/// Expand a family config into its full candidate grid.
pub fn expand_grid(config: &ClusterFamilyConfig) -> Vec<ClusterParams> {
    match config {
        ClusterFamilyConfig::Centroid {
            candidate_counts,
            seed,
        } => candidate_counts
            .iter()
            .map(|&clusters| ClusterParams::Centroid {
                clusters,
                seed: *seed,
            })
            .collect(),
        ClusterFamilyConfig::Density {
            min_cluster_sizes,
            min_samples,
            selection_epsilons,
        } => {
            let mut grid = Vec::new();
            for &mcs in min_cluster_sizes {
                for &ms in min_samples {
                    for &eps in selection_epsilons {
                        grid.push(ClusterParams::Density {
                            min_cluster_size: mcs,
                            min_samples: ms,
                            selection_epsilon: eps,
                        });
                    }
                }
            }
            grid
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centroid_grid_preserves_candidate_order() {
        let grid = expand_grid(&ClusterFamilyConfig::Centroid {
            candidate_counts: vec![50, 100, 150],
            seed: 3,
        });
        assert_eq!(grid.len(), 3);
        assert_eq!(
            grid[0],
            ClusterParams::Centroid {
                clusters: 50,
                seed: 3
            }
        );
    }

    #[test]
    fn density_grid_is_the_full_cartesian_product() {
        let grid = expand_grid(&ClusterFamilyConfig::Density {
            min_cluster_sizes: vec![10, 30],
            min_samples: vec![5, 10, 20],
            selection_epsilons: vec![0.0],
        });
        assert_eq!(grid.len(), 6);
        // Outer axis varies slowest.
        assert_eq!(
            grid[0],
            ClusterParams::Density {
                min_cluster_size: 10,
                min_samples: 5,
                selection_epsilon: 0.0
            }
        );
        assert_eq!(
            grid[3],
            ClusterParams::Density {
                min_cluster_size: 30,
                min_samples: 5,
                selection_epsilon: 0.0
            }
        );
    }
}
