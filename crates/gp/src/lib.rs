//! This library implements [Gaussian Process](https://en.wikipedia.org/wiki/Gaussian_process) regression
//! with covariance functions composed from primitive kernels by addition and multiplication,
//! in the manner of GPflow kernels.
//!
//! A GP is specified by [GpParams] (kernel, noise, hyperparameter optimization settings)
//! and trained with [`linfa::traits::Fit`] on a dataset whose targets may hold several
//! output columns. All outputs share the same kernel and are modeled as independent
//! processes, which is the usual setting when emulating a gridded simulator output
//! where each grid cell is an output.
//!
//! Kernel and noise hyperparameters are estimated by maximizing the log marginal likelihood
//! with a multistart COBYLA optimization in log10 space.
#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
mod algorithm;
mod errors;
pub mod kernels;
pub mod metrics;

mod parameters;
mod utils;

mod optimization;

pub use algorithm::*;
pub use errors::*;
pub use kernels::{Covariance, Kernel};
pub use parameters::*;
