use thiserror::Error;

/// A result type for MCMC sampling
pub type Result<T> = std::result::Result<T, McmcError>;

/// An error when setting up distributions or running a chain
#[derive(Error, Debug)]
pub enum McmcError {
    /// When dimensions of states and target density do not match
    #[error("Dimension error: expected {expected}, got {got}")]
    DimensionError {
        /// Dimension of the target density
        expected: usize,
        /// Given dimension
        got: usize,
    },
    /// When error due to a bad value
    #[error("InvalidValue error: {0}")]
    InvalidValueError(String),
}
