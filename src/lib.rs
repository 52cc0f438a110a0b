//! Gaussian process emulation of simulator ensembles and calibration of the simulator
//! parameters against observations.
//!
//! An expensive simulator is run for a small set of parameter vectors, producing an
//! ensemble of gridded output fields. This library:
//! * fits a [GP](gpemu_gp) [Emulator] of the output field as a function of the
//!   parameters, every grid cell being an output sharing the same kernel,
//! * predicts the field (mean and variance) at unseen parameters as [LabeledGrid]s
//!   keeping the ensemble units,
//! * evaluates the [implausibility] of parameters given an observation and four
//!   uncertainty sources combined in quadrature,
//! * draws parameters consistent with the observation with an MCMC [Sampler]
//!   (random walk Metropolis or Hamiltonian Monte Carlo from [gpemu_mcmc]) or with
//!   the [AbcSampler] rejection scheme.
//!
//! # Kernels
//!
//! Emulator kernels are given by name (`Bias`, `Linear`, `Polynomial`, `RBF`, `White`,
//! `Exponential`, `Matern12`, `Matern32`, `Matern52`, `RationalQuadratic`, `Cosine`)
//! combined with `+` or `*`, as a pre-built [gpemu_gp::Kernel], or left to the default
//! `RBF + Linear + Polynomial`. See [KernelSpec].
//!
//! # Logging
//!
//! Samplers log through the [log] facade, initializing [env_logger] at construction.
//! The level is read from the `GPEMU_LOG` environment variable (default `info`).
//!
//! # Example
//!
//! ```no_run
//! use gpemu::{
//!     uniform_params, Emulator, KernelSpec, LabeledGrid, Sampler, SamplerConfig,
//!     Uncertainties, Uncertainty,
//! };
//! use ndarray::{array, Array1, Axis};
//!
//! // Simulator runs on a 5x5 grid of the unit square
//! let params = uniform_params(2, 5);
//! let outputs: Array1<f64> = params
//!     .axis_iter(Axis(0))
//!     .map(|x| x[0] * x[0] + 2. * x[1])
//!     .collect();
//! let ensemble = LabeledGrid::new(outputs.into_dyn()).with_units("m");
//!
//! let mut emulator = Emulator::new(&params, &ensemble, KernelSpec::default())
//!     .expect("valid emulator");
//! emulator.train().expect("emulator training");
//!
//! let obs = LabeledGrid::new(array![2.].into_dyn());
//! let uncertainties = Uncertainties::default().observational(Uncertainty::absolute(0.1));
//! let samples = Sampler::new(&emulator, &obs, uncertainties, SamplerConfig::default())
//!     .expect("valid sampler")
//!     .sample(100)
//!     .expect("MCMC sampling");
//! assert_eq!((100, 2), samples.dim());
//! ```
#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]

mod abc;
mod emulator;
mod errors;
mod grid;
pub mod implausibility;
mod kernel_spec;
mod processors;
mod sampler;
mod sampling;
mod surrogate;
mod uncertainty;
mod validation;

pub use abc::*;
pub use emulator::*;
pub use errors::*;
pub use grid::*;
pub use implausibility::{constrain, target_log_likelihood};
pub use kernel_spec::*;
pub use processors::*;
pub use sampler::*;
pub use sampling::*;
pub use surrogate::*;
pub use uncertainty::*;
pub use validation::*;

pub use gpemu_doe as doe;
pub use gpemu_gp as gp;
pub use gpemu_mcmc as mcmc;
