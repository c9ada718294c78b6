//! # fabula-core
//!
//! Foundation crate for the fabula narrative clustering system.
//! Defines the role/statement data model, configuration, errors, and the
//! vector-source trait. Every other crate in the workspace depends on this.

pub mod config;
pub mod errors;
pub mod statement;
pub mod traits;
pub mod vectors;

// Re-export the most commonly used types at the crate root.
pub use config::{ClusterFamilyConfig, MatchStrategy, NarrativeConfig, ReducerConfig};
pub use errors::{ConfigError, ModelError, NarrativeError, NarrativeResult};
pub use statement::{Corpus, Role, Statement};
pub use traits::IVectorSource;
