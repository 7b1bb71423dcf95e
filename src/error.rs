//! Error types for fatigue evaluations

use thiserror::Error;

use crate::config::ValidationError;

/// Main error type for the fatigue core and its field readers
#[derive(Error, Debug)]
pub enum FatigueError {
    /// A criterion needs a material property the material does not define.
    #[error("The {criterion} criterion is not implemented for material {material} as it does not define {capability}")]
    MissingCapability {
        material: String,
        criterion: String,
        capability: String,
    },

    /// Two inputs that must be aligned point by point have different sizes.
    #[error("{input} has wrong shape: expected {expected}, got {actual}")]
    ShapeMismatch {
        input: String,
        expected: usize,
        actual: usize,
    },

    #[error("Material '{0}' not found in registry")]
    UnknownMaterial(String),

    #[error("Element type '{0}' is not supported")]
    UnknownElementType(String),

    #[error("Element {0} not found in geometry")]
    UnknownElement(u64),

    #[error("Steel data field '{0}' is missing")]
    MissingSteelField(String),

    #[error("Label mismatch in {input} at position {position}: expected {expected}, got {actual}")]
    LabelMismatch {
        input: String,
        position: usize,
        expected: u64,
        actual: u64,
    },

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("No root of the failure probability within [{low}, {high}] cycles")]
    RootNotBracketed { low: f64, high: f64 },

    #[error("Failed to evaluate '{formula}': {message}")]
    Expression { formula: String, message: String },

    #[error("{path}, line {line}: {message}")]
    Parse {
        path: String,
        line: usize,
        message: String,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Result type for fatigue operations
pub type Result<T> = std::result::Result<T, FatigueError>;

impl FatigueError {
    pub(crate) fn shape(input: impl Into<String>, expected: usize, actual: usize) -> Self {
        FatigueError::ShapeMismatch {
            input: input.into(),
            expected,
            actual,
        }
    }
}
