//! Stage 1: fixed-rank orthogonal projection.
//!
//! Principal axes found by power iteration with Gram-Schmidt
//! re-orthogonalization; the covariance product is applied implicitly so the
//! full covariance matrix is never materialized. Deterministic given a seed.

use fabula_core::errors::ModelError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const MAX_ITERATIONS: usize = 100;
const CONVERGENCE_EPS: f64 = 1e-10;

/// A fitted mean-centered orthogonal projection.
pub struct PcaProjection {
    mean: Vec<f64>,
    /// Row-major components: `components[r]` is the r-th principal axis.
    components: Vec<Vec<f64>>,
}

impl PcaProjection {
    /// Fit a projection of the given rank on the training vectors.
    ///
    /// Errors when the training set is empty, has fewer points than the
    /// rank, has fewer input dimensions than the rank, or mixes vector
    /// lengths.
    pub fn fit(data: &[Vec<f32>], rank: usize, seed: u64) -> Result<Self, ModelError> {
        let n = data.len();
        if n == 0 {
            return Err(ModelError::InsufficientData {
                context: "projection fit",
                needed: 1,
                available: 0,
            });
        }
        let dims = data[0].len();
        if let Some(bad) = data.iter().find(|v| v.len() != dims) {
            return Err(ModelError::DimensionMismatch {
                expected: dims,
                actual: bad.len(),
            });
        }
        if n < rank {
            return Err(ModelError::InsufficientData {
                context: "projection rank (points)",
                needed: rank,
                available: n,
            });
        }
        if dims < rank {
            return Err(ModelError::InsufficientData {
                context: "projection rank (dimensions)",
                needed: rank,
                available: dims,
            });
        }

        let mut mean = vec![0.0f64; dims];
        for row in data {
            for (m, x) in mean.iter_mut().zip(row) {
                *m += *x as f64;
            }
        }
        for m in &mut mean {
            *m /= n as f64;
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut components: Vec<Vec<f64>> = Vec::with_capacity(rank);

        for _ in 0..rank {
            let mut v = random_unit(&mut rng, dims);
            let mut prev = v.clone();

            for _ in 0..MAX_ITERATIONS {
                let mut next = covariance_product(data, &mean, &v);
                orthogonalize(&mut next, &components);
                if normalize(&mut next) < 1e-12 {
                    // Remaining variance is numerically zero; restart from a
                    // fresh direction orthogonal to what we have.
                    next = random_unit(&mut rng, dims);
                    orthogonalize(&mut next, &components);
                    normalize(&mut next);
                }
                let aligned: f64 = next.iter().zip(&prev).map(|(a, b)| a * b).sum();
                let converged = (1.0 - aligned.abs()) < CONVERGENCE_EPS;
                prev = next.clone();
                v = next;
                if converged {
                    break;
                }
            }
            components.push(v);
        }

        Ok(Self { mean, components })
    }

    /// Project one vector. Idempotent, side-effect-free.
    pub fn transform_one(&self, v: &[f32]) -> Vec<f32> {
        self.components
            .iter()
            .map(|axis| {
                axis.iter()
                    .zip(self.mean.iter())
                    .zip(v.iter())
                    .map(|((a, m), x)| a * (*x as f64 - m))
                    .sum::<f64>() as f32
            })
            .collect()
    }

    pub fn transform(&self, data: &[Vec<f32>]) -> Vec<Vec<f32>> {
        data.iter().map(|v| self.transform_one(v)).collect()
    }

    pub fn rank(&self) -> usize {
        self.components.len()
    }
}

/// y = C·v for the centered covariance C, computed as Xᶜᵀ(Xᶜ·v)/n without
/// materializing C.
fn covariance_product(data: &[Vec<f32>], mean: &[f64], v: &[f64]) -> Vec<f64> {
    let dims = mean.len();
    let mut out = vec![0.0f64; dims];
    for row in data {
        let dot: f64 = row
            .iter()
            .zip(mean)
            .zip(v)
            .map(|((x, m), vi)| (*x as f64 - m) * vi)
            .sum();
        for ((o, x), m) in out.iter_mut().zip(row).zip(mean) {
            *o += dot * (*x as f64 - m);
        }
    }
    let n = data.len() as f64;
    for o in &mut out {
        *o /= n;
    }
    out
}

fn orthogonalize(v: &mut [f64], basis: &[Vec<f64>]) {
    for b in basis {
        let dot: f64 = v.iter().zip(b).map(|(a, c)| a * c).sum();
        for (x, c) in v.iter_mut().zip(b) {
            *x -= dot * c;
        }
    }
}

fn normalize(v: &mut [f64]) -> f64 {
    let norm: f64 = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > 1e-12 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
    norm
}

fn random_unit(rng: &mut StdRng, dims: usize) -> Vec<f64> {
    let mut v: Vec<f64> = (0..dims).map(|_| rng.gen::<f64>() * 2.0 - 1.0).collect();
    normalize(&mut v);
    v
}
