//! Two-stage dimensionality reduction: linear projection, then a nonlinear
//! neighborhood embedding. Fit exactly once per model fit; `transform` is
//! reused as-is at prediction time.

pub mod neighborhood;
pub mod pca;

use fabula_core::errors::ModelError;
use fabula_core::ReducerConfig;

pub use neighborhood::NeighborhoodEmbedding;
pub use pca::PcaProjection;

/// Distinct per-stage seeds derived from the one configured seed.
const STAGE2_SEED_SALT: u64 = 0x9e3779b97f4a7c15;

/// The fitted two-stage reducer.
pub struct DimensionalityReducer {
    pca: PcaProjection,
    embedding: NeighborhoodEmbedding,
}

impl DimensionalityReducer {
    /// Fit both stages on the training vectors. Returns the reducer and the
    /// reduced training coordinates, aligned with the input order.
    pub fn fit(
        data: &[Vec<f32>],
        config: &ReducerConfig,
    ) -> Result<(Self, Vec<Vec<f32>>), ModelError> {
        let pca = PcaProjection::fit(data, config.pca_rank, config.seed)?;
        let stage1 = pca.transform(data);
        let embedding = NeighborhoodEmbedding::fit(
            &stage1,
            config.neighbors,
            config.target_rank,
            config.seed ^ STAGE2_SEED_SALT,
        )?;
        let reduced = embedding.coords().to_vec();
        Ok((Self { pca, embedding }, reduced))
    }

    /// Reduce one new vector through both fitted stages. Side-effect-free.
    pub fn transform(&self, v: &[f32]) -> Vec<f32> {
        self.embedding.transform_one(&self.pca.transform_one(v))
    }

    pub fn transform_batch(&self, data: &[Vec<f32>]) -> Vec<Vec<f32>> {
        data.iter().map(|v| self.transform(v)).collect()
    }
}
