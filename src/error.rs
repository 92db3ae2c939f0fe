use thiserror::Error;

/// Error types for the stepkmeans library
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KMeansError {
    /// Two vectors that were compared, summed or divided have different lengths
    #[error("Arity mismatch: expected {expected} components, found {found}")]
    ArityMismatch { expected: usize, found: usize },

    /// The input batch has no vectors
    #[error("Input batch is empty")]
    EmptyInput,

    /// The number of clusters k is invalid (must be > 0), or the given
    /// initial centroids are not distinct
    #[error("Invalid k value: {0}")]
    InvalidK(String),

    /// Vectors carry no feature component besides the identifier, or there
    /// are no centroid rows to compare against
    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),

    /// Not enough distinct vectors for the requested number of clusters
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Model has not been fitted yet
    #[error("Model has not been fitted. Call fit() first.")]
    NotFitted,
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, KMeansError>;
