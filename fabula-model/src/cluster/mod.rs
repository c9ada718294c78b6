//! Cluster algorithm families behind one sealed contract.
//!
//! `ClusterModel` is the tagged variant the orchestrator holds: assignment
//! and optional centroids, no family checks scattered anywhere else.

pub mod density;
pub mod grid;
pub mod kmeans;
pub mod selection;

pub use density::DensityModel;
pub use grid::{expand_grid, ClusterParams};
pub use kmeans::CentroidModel;
pub use selection::{SelectionDiagnostics, SelectionOutcome};

/// Reserved id for points the density family declines to assign.
pub const NOISE_ID: i64 = -1;

/// A fitted cluster model of either family.
pub enum ClusterModel {
    Centroid(CentroidModel),
    Density(DensityModel),
}

impl ClusterModel {
    /// Assign a reduced vector to a cluster id. Only the density family can
    /// return [`NOISE_ID`].
    pub fn assign(&self, v: &[f32]) -> i64 {
        match self {
            ClusterModel::Centroid(m) => m.assign(v),
            ClusterModel::Density(m) => m.assign(v),
        }
    }

    /// Explicit centroid vectors; `Some` only for the centroid family.
    pub fn centroids(&self) -> Option<&[Vec<f32>]> {
        match self {
            ClusterModel::Centroid(m) => Some(m.centroids()),
            ClusterModel::Density(_) => None,
        }
    }

    /// Training assignments, aligned with the vectors the model was fit on.
    pub fn training_labels(&self) -> &[i64] {
        match self {
            ClusterModel::Centroid(m) => m.labels(),
            ClusterModel::Density(m) => m.labels(),
        }
    }

    /// Whether this family reserves a noise cluster.
    pub fn has_noise(&self) -> bool {
        matches!(self, ClusterModel::Density(_))
    }
}
