//! Error types for the fabula workspace.
//!
//! Configuration problems surface eagerly at model construction; data
//! problems surface during fit. Per-phrase vector failures are recovered
//! locally by the model and never reach these types.

/// Configuration errors, raised at `NarrativeModel::new` and never deferred.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no roles configured")]
    NoRoles,

    #[error("duplicate role in roles_considered: {role}")]
    DuplicateRole { role: String },

    #[error("role {role} is not in roles_considered")]
    RoleNotConsidered { role: String },

    #[error("role {role} cannot be embedded and clustered")]
    NotEmbeddable { role: String },

    #[error("similarity threshold must be positive and finite, got {value}")]
    BadThreshold { value: f32 },

    #[error("known-entity roles configured but the entity registry is empty")]
    EmptyRegistry,

    #[error("entity registry contains a blank name")]
    BlankEntity,

    #[error("reducer config invalid: {reason}")]
    Reducer { reason: String },

    #[error("clustering config invalid: {reason}")]
    Clustering { reason: String },
}

/// Fit- and predict-time errors.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("insufficient data for {context}: needed {needed}, available {available}")]
    InsufficientData {
        context: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("degenerate model selection: {reason}")]
    DegenerateSelection { reason: String },

    #[error("vector source '{source_name}' failed: {reason}")]
    VectorSource { source_name: String, reason: String },

    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("model has not been fitted")]
    NotFitted,
}

/// Umbrella error for the whole workspace.
#[derive(Debug, thiserror::Error)]
pub enum NarrativeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("export failed: {0}")]
    Export(#[from] std::io::Error),
}

pub type NarrativeResult<T> = Result<T, NarrativeError>;
