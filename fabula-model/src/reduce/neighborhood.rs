//! Stage 2: neighborhood-preserving embedding.
//!
//! A k-nearest-neighbor graph over the stage-1 vectors is laid out in the
//! target rank by a seeded attraction/repulsion loop (negative sampling,
//! clipped updates). Out-of-sample points are placed at the
//! inverse-distance-weighted mean of their k nearest training anchors, so
//! `transform` never refits.

use fabula_core::errors::ModelError;
use fabula_core::vectors::euclidean_distance;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const EPOCHS: usize = 200;
const INITIAL_LR: f64 = 0.1;
const ATTRACTION: f64 = 0.5;
const REPULSION: f64 = 0.05;
const NEGATIVE_SAMPLES: usize = 2;
const UPDATE_CLIP: f64 = 4.0;
const WEIGHT_EPS: f64 = 1e-6;

/// A fitted neighborhood embedding.
pub struct NeighborhoodEmbedding {
    anchors: Vec<Vec<f32>>,
    coords: Vec<Vec<f32>>,
    neighbors: usize,
}

impl NeighborhoodEmbedding {
    pub fn fit(
        data: &[Vec<f32>],
        neighbors: usize,
        target_rank: usize,
        seed: u64,
    ) -> Result<Self, ModelError> {
        let n = data.len();
        if n == 0 {
            return Err(ModelError::InsufficientData {
                context: "neighborhood embedding",
                needed: 1,
                available: 0,
            });
        }

        let k = neighbors.min(n - 1);
        if k == 0 {
            // A single training point sits at the origin.
            return Ok(Self {
                anchors: data.to_vec(),
                coords: vec![vec![0.0; target_rank]; n],
                neighbors,
            });
        }

        let edges = knn_edges(data, k);
        let mut rng = StdRng::seed_from_u64(seed);

        let mut coords: Vec<Vec<f64>> = (0..n)
            .map(|_| (0..target_rank).map(|_| rng.gen::<f64>() * 2.0 - 1.0).collect())
            .collect();

        for epoch in 0..EPOCHS {
            let lr = INITIAL_LR * (1.0 - epoch as f64 / EPOCHS as f64);
            for &(i, j, w) in &edges {
                // Pull i toward its neighbor j, scaled by the edge weight.
                for d in 0..target_rank {
                    let delta = (coords[j][d] - coords[i][d]) * ATTRACTION * w * lr;
                    coords[i][d] += delta.clamp(-UPDATE_CLIP, UPDATE_CLIP);
                }
                // Push i away from sampled non-neighbors.
                for _ in 0..NEGATIVE_SAMPLES {
                    let r = rng.gen_range(0..n);
                    if r == i {
                        continue;
                    }
                    let dist_sq: f64 = (0..target_rank)
                        .map(|d| {
                            let diff = coords[i][d] - coords[r][d];
                            diff * diff
                        })
                        .sum();
                    for d in 0..target_rank {
                        let diff = coords[i][d] - coords[r][d];
                        let delta = diff / (dist_sq + 0.1) * REPULSION * lr;
                        coords[i][d] += delta.clamp(-UPDATE_CLIP, UPDATE_CLIP);
                    }
                }
            }
        }

        let coords = coords
            .into_iter()
            .map(|row| row.into_iter().map(|x| x as f32).collect())
            .collect();

        Ok(Self {
            anchors: data.to_vec(),
            coords,
            neighbors,
        })
    }

    /// The fitted coordinates of the training points, input order.
    pub fn coords(&self) -> &[Vec<f32>] {
        &self.coords
    }

    /// Embed an arbitrary stage-1 vector without refitting.
    pub fn transform_one(&self, v: &[f32]) -> Vec<f32> {
        let rank = self.coords[0].len();
        let k = self.neighbors.min(self.anchors.len());

        let mut nearest: Vec<(usize, f64)> = self
            .anchors
            .iter()
            .enumerate()
            .map(|(i, a)| (i, euclidean_distance(a, v)))
            .collect();
        nearest.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        nearest.truncate(k);

        let mut out = vec![0.0f64; rank];
        let mut total = 0.0f64;
        for (i, d) in nearest {
            let w = 1.0 / (d + WEIGHT_EPS);
            for (o, c) in out.iter_mut().zip(&self.coords[i]) {
                *o += w * *c as f64;
            }
            total += w;
        }
        out.into_iter().map(|x| (x / total) as f32).collect()
    }
}

/// Directed kNN edges (i → each of its k nearest) with locally scaled
/// weights: the nearest neighbor gets weight 1, farther neighbors decay
/// with distance relative to the local scale. Deterministic order.
fn knn_edges(data: &[Vec<f32>], k: usize) -> Vec<(usize, usize, f64)> {
    let n = data.len();
    let mut edges = Vec::with_capacity(n * k);
    for i in 0..n {
        let mut dists: Vec<(usize, f64)> = (0..n)
            .filter(|&j| j != i)
            .map(|j| (j, euclidean_distance(&data[i], &data[j])))
            .collect();
        dists.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        dists.truncate(k);

        let rho = dists[0].1;
        let sigma = dists.iter().map(|(_, d)| d - rho).sum::<f64>() / dists.len() as f64;
        for &(j, d) in &dists {
            let w = if sigma > f64::EPSILON {
                (-(d - rho) / sigma).exp()
            } else {
                1.0
            };
            edges.push((i, j, w));
        }
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two well-separated blobs in 3-D.
    fn blob_data() -> Vec<Vec<f32>> {
        let mut data = Vec::new();
        for i in 0..8 {
            let j = (i % 4) as f32 * 0.05;
            data.push(vec![j, 0.1 + j, 0.0]);
            data.push(vec![10.0 + j, 10.0 - j, 10.0]);
        }
        data
    }

    #[test]
    fn empty_input_errors() {
        assert!(NeighborhoodEmbedding::fit(&[], 5, 2, 0).is_err());
    }

    #[test]
    fn single_point_lands_at_origin() {
        let emb = NeighborhoodEmbedding::fit(&[vec![3.0, 4.0]], 15, 2, 0).unwrap();
        assert_eq!(emb.coords(), &[vec![0.0, 0.0]]);
    }

    #[test]
    fn output_has_target_rank() {
        let emb = NeighborhoodEmbedding::fit(&blob_data(), 3, 2, 0).unwrap();
        assert!(emb.coords().iter().all(|c| c.len() == 2));
    }

    #[test]
    fn deterministic_given_seed() {
        let data = blob_data();
        let a = NeighborhoodEmbedding::fit(&data, 3, 2, 9).unwrap();
        let b = NeighborhoodEmbedding::fit(&data, 3, 2, 9).unwrap();
        assert_eq!(a.coords(), b.coords());
    }

    #[test]
    fn separated_blobs_stay_separated() {
        let data = blob_data();
        let emb = NeighborhoodEmbedding::fit(&data, 3, 2, 1).unwrap();
        let coords = emb.coords();

        // Mean within-blob distance should be well below the between-blob
        // distance of the embedded points.
        let blob_a: Vec<&Vec<f32>> = coords.iter().step_by(2).collect();
        let blob_b: Vec<&Vec<f32>> = coords.iter().skip(1).step_by(2).collect();
        let centroid = |pts: &[&Vec<f32>]| -> Vec<f64> {
            let mut c = vec![0.0; 2];
            for p in pts {
                for (ci, x) in c.iter_mut().zip(p.iter()) {
                    *ci += *x as f64;
                }
            }
            c.iter().map(|x| x / pts.len() as f64).collect()
        };
        let ca = centroid(&blob_a);
        let cb = centroid(&blob_b);
        let between: f64 = ca
            .iter()
            .zip(&cb)
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f64>()
            .sqrt();
        assert!(between > 0.1, "blobs collapsed: {between}");
    }

    #[test]
    fn transform_places_new_point_near_its_neighborhood() {
        let data = blob_data();
        let emb = NeighborhoodEmbedding::fit(&data, 3, 2, 1).unwrap();

        // A point inside blob A should land nearer A's coords than B's.
        let out = emb.transform_one(&[0.02, 0.12, 0.0]);
        let da = euclidean_distance(&out, &emb.coords()[0]);
        let db = euclidean_distance(&out, &emb.coords()[1]);
        assert!(da < db);
    }

    #[test]
    fn transform_is_idempotent() {
        let data = blob_data();
        let emb = NeighborhoodEmbedding::fit(&data, 3, 2, 1).unwrap();
        let probe = vec![5.0, 5.0, 5.0];
        assert_eq!(emb.transform_one(&probe), emb.transform_one(&probe));
    }
}
