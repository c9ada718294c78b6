//! Density family: HDBSCAN with a noise sentinel, scored by a
//! density-validity index, plus approximate assignment of new points
//! against the fitted training set (no refitting).

use std::collections::BTreeSet;

use fabula_core::errors::ModelError;
use fabula_core::vectors::euclidean_distance;
use hdbscan::{Hdbscan, HdbscanHyperParams};

use super::NOISE_ID;

/// A fitted density model: the training points in reduced space and their
/// cluster labels (−1 = noise).
pub struct DensityModel {
    points: Vec<Vec<f32>>,
    labels: Vec<i64>,
}

impl DensityModel {
    /// Training assignments, aligned with the fit input.
    pub fn labels(&self) -> &[i64] {
        &self.labels
    }

    /// Approximate-predict: the label of the nearest training point.
    ///
    /// A point whose nearest neighbor is noise lands in noise itself; new
    /// points never force a refit.
    pub fn assign(&self, v: &[f32]) -> i64 {
        let mut best = NOISE_ID;
        let mut best_dist = f64::INFINITY;
        for (point, &label) in self.points.iter().zip(&self.labels) {
            let d = euclidean_distance(point, v);
            if d < best_dist {
                best_dist = d;
                best = label;
            }
        }
        best
    }
}

/// Fit HDBSCAN on the reduced vectors.
pub fn fit(
    data: &[Vec<f32>],
    min_cluster_size: usize,
    min_samples: usize,
    selection_epsilon: f32,
) -> Result<DensityModel, ModelError> {
    if data.len() < min_cluster_size {
        return Err(ModelError::InsufficientData {
            context: "density fit",
            needed: min_cluster_size,
            available: data.len(),
        });
    }

    let points: Vec<Vec<f32>> = data.to_vec();
    let hyper_params = HdbscanHyperParams::builder()
        .min_cluster_size(min_cluster_size)
        .min_samples(min_samples)
        .epsilon(selection_epsilon as f64)
        .build();

    let clusterer = Hdbscan::new(&points, hyper_params);
    let labels = clusterer
        .cluster()
        .map_err(|e| ModelError::DegenerateSelection {
            reason: format!("density fit failed: {e:?}"),
        })?;

    let labels = labels.into_iter().map(|l| l as i64).collect();
    Ok(DensityModel { points, labels })
}

/// Density-validity index over a labeled point set. Higher is better.
///
/// Per cluster: sparseness = the heaviest edge of the in-cluster Euclidean
/// minimum spanning tree; separation = the smallest distance to any point of
/// another cluster; validity = (separation − sparseness) /
/// max(separation, sparseness). The index is the cluster-size-weighted sum
/// over all points, noise counted in the denominator only. Undefined (NaN)
/// with fewer than two surviving clusters.
pub fn validity_index(data: &[Vec<f32>], labels: &[i64]) -> f64 {
    let n = data.len();
    let clusters: BTreeSet<i64> = labels.iter().copied().filter(|&l| l != NOISE_ID).collect();
    if clusters.len() < 2 {
        return f64::NAN;
    }

    let mut index = 0.0f64;
    for &c in &clusters {
        let members: Vec<usize> = (0..n).filter(|&i| labels[i] == c).collect();
        let others: Vec<usize> = (0..n)
            .filter(|&i| labels[i] != c && labels[i] != NOISE_ID)
            .collect();

        let sparseness = mst_max_edge(data, &members);
        let separation = members
            .iter()
            .flat_map(|&i| others.iter().map(move |&j| (i, j)))
            .map(|(i, j)| euclidean_distance(&data[i], &data[j]))
            .fold(f64::INFINITY, f64::min);

        let denom = separation.max(sparseness);
        let validity = if denom > 0.0 {
            (separation - sparseness) / denom
        } else {
            0.0
        };
        index += members.len() as f64 / n as f64 * validity;
    }
    index
}

/// Heaviest edge of the Euclidean MST over the given member indices
/// (Prim's algorithm; 0.0 for singletons).
fn mst_max_edge(data: &[Vec<f32>], members: &[usize]) -> f64 {
    if members.len() < 2 {
        return 0.0;
    }
    let m = members.len();
    let mut in_tree = vec![false; m];
    let mut best_dist = vec![f64::INFINITY; m];
    in_tree[0] = true;
    for i in 1..m {
        best_dist[i] = euclidean_distance(&data[members[0]], &data[members[i]]);
    }

    let mut max_edge = 0.0f64;
    for _ in 1..m {
        let mut next = None;
        let mut next_dist = f64::INFINITY;
        for i in 0..m {
            if !in_tree[i] && best_dist[i] < next_dist {
                next = Some(i);
                next_dist = best_dist[i];
            }
        }
        let Some(next) = next else { break };
        in_tree[next] = true;
        max_edge = max_edge.max(next_dist);
        for i in 0..m {
            if !in_tree[i] {
                let d = euclidean_distance(&data[members[next]], &data[members[i]]);
                if d < best_dist[i] {
                    best_dist[i] = d;
                }
            }
        }
    }
    max_edge
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two dense blobs plus one far-away straggler.
    fn blobs_with_outlier() -> Vec<Vec<f32>> {
        let mut data = Vec::new();
        for i in 0..10 {
            let j = i as f32 * 0.02;
            data.push(vec![j, j]);
            data.push(vec![5.0 + j, 5.0 - j]);
        }
        data.push(vec![100.0, -100.0]);
        data
    }

    #[test]
    fn too_few_points_error() {
        let data = vec![vec![0.0, 0.0]; 3];
        assert!(matches!(
            fit(&data, 10, 2, 0.0),
            Err(ModelError::InsufficientData { .. })
        ));
    }

    #[test]
    fn finds_two_clusters_and_noise() {
        let data = blobs_with_outlier();
        let model = fit(&data, 3, 2, 0.0).unwrap();
        let clusters: BTreeSet<i64> = model
            .labels()
            .iter()
            .copied()
            .filter(|&l| l != NOISE_ID)
            .collect();
        assert_eq!(clusters.len(), 2, "labels: {:?}", model.labels());
        // The straggler is noise.
        assert_eq!(*model.labels().last().unwrap(), NOISE_ID);
    }

    #[test]
    fn assign_follows_nearest_training_point() {
        let data = blobs_with_outlier();
        let model = fit(&data, 3, 2, 0.0).unwrap();
        let a = model.assign(&[0.05, 0.05]);
        let b = model.assign(&[5.05, 4.95]);
        assert_ne!(a, NOISE_ID);
        assert_ne!(b, NOISE_ID);
        assert_ne!(a, b);
        // A point right on the straggler inherits noise.
        assert_eq!(model.assign(&[100.0, -100.0]), NOISE_ID);
    }

    #[test]
    fn validity_rewards_separated_clusters() {
        let data = blobs_with_outlier();
        let model = fit(&data, 3, 2, 0.0).unwrap();
        let good = validity_index(&data, model.labels());
        assert!(good > 0.0, "got {good}");

        // Scrambled labels should score worse.
        let scrambled: Vec<i64> = (0..data.len() as i64).map(|i| i % 2).collect();
        let bad = validity_index(&data, &scrambled);
        assert!(good > bad, "expected {good} > {bad}");
    }

    #[test]
    fn validity_single_cluster_is_undefined() {
        let data = blobs_with_outlier();
        let labels = vec![0i64; data.len()];
        assert!(validity_index(&data, &labels).is_nan());
    }
}
