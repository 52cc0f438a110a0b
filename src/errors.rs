use thiserror::Error;

/// A result type for emulation and calibration errors
pub type Result<T> = std::result::Result<T, EmuError>;

/// An error for emulation and calibration
#[derive(Error, Debug)]
pub enum EmuError {
    /// When an argument or a configuration is invalid
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// When the emulator is used before being trained
    #[error("Emulator not trained: call `train()` before predicting")]
    NotTrained,
    /// When the gaussian process engine fails
    #[error(transparent)]
    GpError(#[from] gpemu_gp::GpError),
    /// When the MCMC engine fails
    #[error(transparent)]
    McmcError(#[from] gpemu_mcmc::McmcError),
    /// When array reshaping fails
    #[error("Shape error: {0}")]
    ShapeError(#[from] ndarray::ShapeError),
    /// When (de)serialization of a configuration fails
    #[error("Json error: {0}")]
    JsonError(#[from] serde_json::Error),
}
