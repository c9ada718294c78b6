//! # fabula-model
//!
//! The narrative clustering model: filler vocabulary extraction →
//! known-entity matching → vectorization → PCA + neighborhood reduction →
//! cluster family grid search → frequency-based labeling, with
//! `NarrativeModel::fit` / `::predict` orchestrating the pipeline.

pub mod cluster;
pub mod export;
pub mod labeling;
pub mod matcher;
pub mod model;
pub mod reduce;
pub mod vocab;

pub use cluster::{ClusterModel, ClusterParams, SelectionDiagnostics, NOISE_ID};
pub use labeling::ClusterVocabulary;
pub use matcher::{EntityMatcher, EntityRegistry};
pub use model::{FitResult, NarrativeModel};
pub use reduce::DimensionalityReducer;
