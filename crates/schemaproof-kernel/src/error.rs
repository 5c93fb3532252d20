//! Error types for kernel operations.

/// Fatal input problems. Everything else degrades instead of erroring.
#[derive(Debug, thiserror::Error)]
pub enum KernelError {
    /// The schema IR cannot enumerate its tables.
    #[error("malformed schema IR: {0}")]
    MalformedSchema(String),

    /// Scoring an empty schema would report a misleading verdict.
    #[error("schema IR contains no tables")]
    EmptySchema,

    #[error("serialization error: {0}")]
    Serialize(String),
}

/// A weight or threshold configuration that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid weight configuration: {0}")]
    InvalidWeights(String),

    #[error("invalid readiness thresholds: {0}")]
    InvalidThresholds(String),
}
