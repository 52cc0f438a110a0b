use crate::errors::{GpError, Result};
use crate::kernels::{Covariance, Kernel, StationaryKind};
use crate::{GP_COBYLA_MAX_EVAL, GP_COBYLA_MIN_EVAL, GP_OPTIM_N_START};
use linfa::{Float, ParamGuard};

#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};

/// Tuning mode of the kernel hyperparameters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub enum HyperTuning {
    /// Hyperparameters are used as given
    Fixed,
    /// Hyperparameters are estimated by likelihood maximization,
    /// starting from the values given with the kernel
    #[default]
    Optimized,
}

/// Tuning of the gaussian likelihood noise variance
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub enum NoiseTuning<F: Float> {
    /// Constant noise variance
    Fixed(F),
    /// Noise variance optimized between given bounds starting from the initial guess
    Optimized {
        /// Initial guess
        init: F,
        /// Bounds (lower, upper)
        bounds: (F, F),
    },
}

impl<F: Float> Default for NoiseTuning<F> {
    fn default() -> Self {
        NoiseTuning::Optimized {
            init: F::cast(Self::DEFAULT_INIT),
            bounds: (
                F::cast(Self::DEFAULT_BOUNDS.0),
                F::cast(Self::DEFAULT_BOUNDS.1),
            ),
        }
    }
}

impl<F: Float> NoiseTuning<F> {
    /// Default initial noise variance (in whitened output units)
    pub const DEFAULT_INIT: f64 = 1e-2;
    /// Default bounds of the noise variance
    pub const DEFAULT_BOUNDS: (f64, f64) = (1e-6, 1e1);

    /// Get initial noise variance
    pub fn init(&self) -> F {
        match self {
            NoiseTuning::Fixed(v) => *v,
            NoiseTuning::Optimized { init, .. } => *init,
        }
    }
}

/// A set of validated GP parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serializable",
    derive(Serialize, Deserialize),
    serde(bound(
        serialize = "F: Serialize",
        deserialize = "F: Deserialize<'de>"
    ))
)]
pub struct GpValidParams<F: Float> {
    /// Covariance function, its hyperparameters are the optimization starting point
    pub(crate) kernel: Kernel<F>,
    /// Kernel hyperparameters tuning mode
    pub(crate) tuning: HyperTuning,
    /// Gaussian likelihood noise variance tuning
    pub(crate) noise: NoiseTuning<F>,
    /// Number of internal likelihood optimization restart
    pub(crate) n_start: usize,
    /// Max number of internal likelihood evaluation during optimization
    pub(crate) max_eval: usize,
    /// Parameter to improve numerical stability
    pub(crate) nugget: F,
    /// Seed of the multistart initial points
    pub(crate) seed: u64,
}

impl<F: Float> Default for GpValidParams<F> {
    fn default() -> GpValidParams<F> {
        GpValidParams {
            kernel: Kernel::stationary(
                StationaryKind::SquaredExponential,
                F::one(),
                ndarray::array![F::one()],
            ),
            tuning: HyperTuning::default(),
            noise: NoiseTuning::default(),
            n_start: GP_OPTIM_N_START,
            max_eval: GP_COBYLA_MAX_EVAL,
            nugget: F::cast(100.0) * F::epsilon(),
            seed: 42,
        }
    }
}

impl<F: Float> GpValidParams<F> {
    /// Get covariance function
    pub fn kernel(&self) -> &Kernel<F> {
        &self.kernel
    }

    /// Get kernel hyperparameters tuning mode
    pub fn tuning(&self) -> HyperTuning {
        self.tuning
    }

    /// Get noise variance tuning
    pub fn noise(&self) -> &NoiseTuning<F> {
        &self.noise
    }

    /// Get the number of internal optimization restart
    pub fn n_start(&self) -> usize {
        self.n_start
    }

    /// Get the max number of internal likelihood evaluations during one optimization
    pub fn max_eval(&self) -> usize {
        self.max_eval
    }

    /// Get nugget
    pub fn nugget(&self) -> F {
        self.nugget
    }

    /// Get the seed of the multistart
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

#[derive(Clone, Debug)]
/// The set of hyperparameters that can be specified for the execution of
/// the [GP algorithm](struct.GaussianProcess.html).
pub struct GpParams<F: Float>(GpValidParams<F>);

impl<F: Float> GpParams<F> {
    /// A constructor for GP parameters given a covariance function
    pub fn new(kernel: Kernel<F>) -> GpParams<F> {
        Self(GpValidParams {
            kernel,
            ..Default::default()
        })
    }

    /// A constructor for GP parameters from validated parameters
    pub fn new_from_valid(params: &GpValidParams<F>) -> Self {
        Self(params.clone())
    }

    /// Set covariance function.
    pub fn kernel(mut self, kernel: Kernel<F>) -> Self {
        self.0.kernel = kernel;
        self
    }

    /// Set kernel hyperparameters tuning mode
    pub fn tuning(mut self, tuning: HyperTuning) -> Self {
        self.0.tuning = tuning;
        self
    }

    /// Set noise variance tuning
    pub fn noise(mut self, noise: NoiseTuning<F>) -> Self {
        self.0.noise = noise;
        self
    }

    /// Set the number of internal GP hyperparameter optimization restarts
    pub fn n_start(mut self, n_start: usize) -> Self {
        self.0.n_start = n_start;
        self
    }

    /// Set the max number of internal likelihood evaluations during one optimization
    /// Given max_eval has to be greater than [crate::GP_COBYLA_MIN_EVAL] otherwise
    /// max_eval is set to [crate::GP_COBYLA_MIN_EVAL].
    pub fn max_eval(mut self, max_eval: usize) -> Self {
        self.0.max_eval = GP_COBYLA_MIN_EVAL.max(max_eval);
        self
    }

    /// Set nugget.
    ///
    /// Nugget is used to improve numerical stability
    pub fn nugget(mut self, nugget: F) -> Self {
        self.0.nugget = nugget;
        self
    }

    /// Set the seed used to draw multistart initial points
    pub fn seed(mut self, seed: u64) -> Self {
        self.0.seed = seed;
        self
    }
}

impl<F: Float> From<GpValidParams<F>> for GpParams<F> {
    fn from(valid: GpValidParams<F>) -> Self {
        GpParams(valid)
    }
}

impl<F: Float> ParamGuard for GpParams<F> {
    type Checked = GpValidParams<F>;
    type Error = GpError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        let kernel = &self.0.kernel;
        let values = kernel.hyperparameters();
        if values.iter().any(|v| !v.is_finite() || *v <= F::zero()) {
            return Err(GpError::InvalidValueError(format!(
                "Kernel {kernel} hyperparameters should be positive, got {values:?}"
            )));
        }
        let noise_ok = match self.0.noise {
            NoiseTuning::Fixed(v) => v >= F::zero(),
            NoiseTuning::Optimized { init, bounds } => {
                bounds.0 > F::zero() && bounds.0 <= bounds.1 && init > F::zero()
            }
        };
        if !noise_ok {
            return Err(GpError::InvalidValueError(format!(
                "Bad noise variance settings: {:?}",
                self.0.noise
            )));
        }
        if self.0.nugget < F::zero() {
            return Err(GpError::InvalidValueError(
                "`nugget` should be non negative".to_string(),
            ));
        }
        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_params_check() {
        let params = GpParams::new(Kernel::linear(array![1.0, 1.0]))
            .n_start(3)
            .max_eval(2);
        let valid = params.check().expect("valid params");
        assert_eq!(3, valid.n_start());
        assert_eq!(GP_COBYLA_MIN_EVAL, valid.max_eval());
    }

    #[test]
    fn test_params_bad_values() {
        let params = GpParams::new(Kernel::linear(array![1.0, -1.0]));
        assert!(matches!(params.check(), Err(GpError::InvalidValueError(_))));
        let params = GpParams::new(Kernel::<f64>::bias()).noise(NoiseTuning::Optimized {
            init: 1e-2,
            bounds: (1., 1e-3),
        });
        assert!(matches!(params.check(), Err(GpError::InvalidValueError(_))));
    }
}
