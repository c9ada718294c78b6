//! Centroid family: k-means with k-means++ seeding, scored by mean
//! silhouette. The fitted centroids double as the "vectors of unknown
//! entities" for nearest-centroid assignment of new points.

use fabula_core::errors::ModelError;
use fabula_core::vectors::euclidean_distance;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const MAX_ITERATIONS: usize = 100;

/// A fitted centroid partition.
pub struct CentroidModel {
    centroids: Vec<Vec<f32>>,
    labels: Vec<i64>,
}

impl CentroidModel {
    pub fn centroids(&self) -> &[Vec<f32>] {
        &self.centroids
    }

    /// Training assignments, aligned with the fit input.
    pub fn labels(&self) -> &[i64] {
        &self.labels
    }

    /// Nearest-centroid assignment; ties go to the lowest centroid index.
    pub fn assign(&self, v: &[f32]) -> i64 {
        nearest_centroid(&self.centroids, v)
    }
}

pub fn nearest_centroid(centroids: &[Vec<f32>], v: &[f32]) -> i64 {
    let mut best = 0usize;
    let mut best_dist = f64::INFINITY;
    for (i, c) in centroids.iter().enumerate() {
        let d = euclidean_distance(c, v);
        if d < best_dist {
            best = i;
            best_dist = d;
        }
    }
    best as i64
}

/// Fit k-means on the reduced vectors. Deterministic given the seed.
pub fn fit(data: &[Vec<f32>], k: usize, seed: u64) -> Result<CentroidModel, ModelError> {
    let n = data.len();
    if k == 0 || n < k {
        return Err(ModelError::InsufficientData {
            context: "centroid fit",
            needed: k.max(1),
            available: n,
        });
    }
    let dims = data[0].len();
    let mut rng = StdRng::seed_from_u64(seed);

    let mut centroids = plus_plus_init(data, k, &mut rng);
    let mut labels = vec![0i64; n];

    for _ in 0..MAX_ITERATIONS {
        // Assignment step.
        let mut changed = false;
        for (i, point) in data.iter().enumerate() {
            let new = nearest_centroid(&centroids, point);
            if new != labels[i] {
                labels[i] = new;
                changed = true;
            }
        }

        // Update step, in f64 to keep the sums stable.
        let mut sums = vec![vec![0.0f64; dims]; k];
        let mut counts = vec![0usize; k];
        for (point, &label) in data.iter().zip(&labels) {
            let c = label as usize;
            counts[c] += 1;
            for (s, x) in sums[c].iter_mut().zip(point) {
                *s += *x as f64;
            }
        }
        for c in 0..k {
            if counts[c] == 0 {
                // Reseed an emptied centroid at the point farthest from its
                // current centroid (first such point on ties).
                let far = farthest_point(data, &centroids, &labels);
                centroids[c] = data[far].clone();
                continue;
            }
            centroids[c] = sums[c]
                .iter()
                .map(|s| (*s / counts[c] as f64) as f32)
                .collect();
        }

        if !changed {
            break;
        }
    }

    Ok(CentroidModel { centroids, labels })
}

/// k-means++ initialization: the first centroid is sampled uniformly, each
/// subsequent one proportionally to squared distance from the nearest
/// already-chosen centroid.
fn plus_plus_init(data: &[Vec<f32>], k: usize, rng: &mut StdRng) -> Vec<Vec<f32>> {
    let n = data.len();
    let mut centroids: Vec<Vec<f32>> = Vec::with_capacity(k);
    centroids.push(data[rng.gen_range(0..n)].clone());

    let mut dist_sq: Vec<f64> = data
        .iter()
        .map(|p| euclidean_distance(p, &centroids[0]).powi(2))
        .collect();

    while centroids.len() < k {
        let total: f64 = dist_sq.iter().sum();
        let next = if total <= f64::EPSILON {
            // All remaining mass at zero distance; fall back to uniform.
            rng.gen_range(0..n)
        } else {
            let mut target = rng.gen::<f64>() * total;
            let mut chosen = n - 1;
            for (i, &d) in dist_sq.iter().enumerate() {
                target -= d;
                if target <= 0.0 {
                    chosen = i;
                    break;
                }
            }
            chosen
        };
        let newest = data[next].clone();
        for (d, p) in dist_sq.iter_mut().zip(data) {
            let nd = euclidean_distance(p, &newest).powi(2);
            if nd < *d {
                *d = nd;
            }
        }
        centroids.push(newest);
    }
    centroids
}

fn farthest_point(data: &[Vec<f32>], centroids: &[Vec<f32>], labels: &[i64]) -> usize {
    let mut far = 0usize;
    let mut far_dist = -1.0f64;
    for (i, point) in data.iter().enumerate() {
        let d = euclidean_distance(point, &centroids[labels[i] as usize]);
        if d > far_dist {
            far = i;
            far_dist = d;
        }
    }
    far
}

/// Mean silhouette coefficient over all points.
///
/// Undefined (NaN) when fewer than two clusters are populated or every
/// point is its own cluster; singleton members contribute 0, matching the
/// usual convention.
pub fn silhouette_score(data: &[Vec<f32>], labels: &[i64]) -> f64 {
    let n = data.len();
    let distinct: std::collections::BTreeSet<i64> = labels.iter().copied().collect();
    if distinct.len() < 2 || distinct.len() >= n {
        return f64::NAN;
    }

    let mut total = 0.0f64;
    for i in 0..n {
        let own = labels[i];
        let own_size = labels.iter().filter(|&&l| l == own).count();
        if own_size == 1 {
            continue; // s(i) = 0 for singletons.
        }

        let mut intra = 0.0f64;
        let mut inter_best = f64::INFINITY;
        for &other in &distinct {
            let members: Vec<usize> = (0..n).filter(|&j| labels[j] == other && j != i).collect();
            if members.is_empty() {
                continue;
            }
            let mean: f64 = members
                .iter()
                .map(|&j| euclidean_distance(&data[i], &data[j]))
                .sum::<f64>()
                / members.len() as f64;
            if other == own {
                intra = mean;
            } else if mean < inter_best {
                inter_best = mean;
            }
        }

        let denom = intra.max(inter_best);
        if denom > 0.0 {
            total += (inter_best - intra) / denom;
        }
    }
    total / n as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two tight groups around (0,0) and (10,10).
    fn two_blobs() -> Vec<Vec<f32>> {
        let mut data = Vec::new();
        for i in 0..6 {
            let jitter = i as f32 * 0.01;
            data.push(vec![jitter, -jitter]);
            data.push(vec![10.0 + jitter, 10.0 - jitter]);
        }
        data
    }

    #[test]
    fn more_clusters_than_points_errors() {
        let data = vec![vec![0.0, 0.0], vec![1.0, 1.0]];
        assert!(matches!(
            fit(&data, 3, 0),
            Err(ModelError::InsufficientData { .. })
        ));
    }

    #[test]
    fn separates_two_blobs() {
        let data = two_blobs();
        let model = fit(&data, 2, 0).unwrap();
        // Even indices form one blob, odd the other.
        let first = model.labels()[0];
        let second = model.labels()[1];
        assert_ne!(first, second);
        for (i, &l) in model.labels().iter().enumerate() {
            assert_eq!(l, if i % 2 == 0 { first } else { second });
        }
    }

    #[test]
    fn deterministic_given_seed() {
        let data = two_blobs();
        let a = fit(&data, 2, 11).unwrap();
        let b = fit(&data, 2, 11).unwrap();
        assert_eq!(a.labels(), b.labels());
        assert_eq!(a.centroids(), b.centroids());
    }

    #[test]
    fn assign_picks_nearest_centroid_for_unseen_point() {
        let data = two_blobs();
        let model = fit(&data, 2, 0).unwrap();
        let near_origin = model.assign(&[0.5, 0.5]);
        let near_far = model.assign(&[9.5, 9.5]);
        assert_ne!(near_origin, near_far);
        assert_eq!(near_origin, model.labels()[0]);
        assert_eq!(near_far, model.labels()[1]);
    }

    #[test]
    fn silhouette_prefers_the_true_split() {
        let data = two_blobs();
        let good = fit(&data, 2, 0).unwrap();
        let bad = fit(&data, 4, 0).unwrap();
        let s_good = silhouette_score(&data, good.labels());
        let s_bad = silhouette_score(&data, bad.labels());
        assert!(s_good > s_bad, "expected {s_good} > {s_bad}");
    }

    #[test]
    fn silhouette_single_cluster_is_undefined() {
        let data = two_blobs();
        let labels = vec![0i64; data.len()];
        assert!(silhouette_score(&data, &labels).is_nan());
    }
}
