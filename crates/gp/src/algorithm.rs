use crate::errors::{GpError, Result};
use crate::kernels::{Covariance, Kernel};
use crate::optimization::{into_f64, optimize_params, prepare_multistart, CobylaParams};
use crate::parameters::{GpParams, GpValidParams, HyperTuning, NoiseTuning};
use crate::utils::{has_duplicate_rows, NormalizedData};

use linfa::prelude::{DatasetBase, Fit, Float, PredictInplace};
use linfa_linalg::{cholesky::*, triangular::*};
use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix2};

use log::{debug, warn};
use rayon::prelude::*;
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

#[cfg(feature = "persistent")]
use std::fs;
#[cfg(feature = "persistent")]
use std::io::Write;

/// Default number of multistart for hyperparameters optimization
pub const GP_OPTIM_N_START: usize = 10;
/// Minimum of function evaluations for COBYLA optimizer
pub const GP_COBYLA_MIN_EVAL: usize = 25;
/// Maximum of function evaluations for COBYLA optimizer
pub const GP_COBYLA_MAX_EVAL: usize = 1000;

/// Internal parameters computed during training
/// used later on in prediction computations
#[derive(Default, Debug, Clone)]
#[cfg_attr(
    feature = "serializable",
    derive(Serialize, Deserialize),
    serde(bound(deserialize = "F: Deserialize<'de>"))
)]
pub(crate) struct GpInnerParams<F: Float> {
    /// Cholesky decomposition of the training covariance matrix K + noise I
    l_chol: Array2<F>,
    /// Weights (K + noise I)^-1 y of each whitened output (n, ny)
    alpha: Array2<F>,
}

/// A GP regression models outputs as realizations of a gaussian process
/// with zero mean (on whitened outputs) and covariance given by a [Kernel],
/// observed with an additive gaussian noise:
///
/// `y_j(x) = f_j(x) + e`, `f_j ~ GP(0, k(x, x'))`, `e ~ Normal(0, noise_variance)`
///
/// Each output column `j` is whitened with its mean and standard deviation then
/// modeled independently with the same kernel, so that training cost is dominated
/// by a single Cholesky factorization whatever the number of outputs.
///
/// Kernel hyperparameters and noise variance are estimated by maximizing the
/// log marginal likelihood summed over the outputs.
///
/// # Features
///
/// ## serializable
///
/// The `serializable` feature enables the serialization of GP models using the [`serde crate`](https://serde.rs/).
///
/// ## persistent
///
/// The `persistent` feature enables `save()/load()` methods for a GP model
/// to/from a json file using the [`serde and serde_json crates`](https://serde.rs/).
///
/// # Example
///
/// ```no_run
/// use gpemu_gp::{kernels::StationaryKind, GaussianProcess, Kernel};
/// use linfa::prelude::*;
/// use ndarray::{arr1, arr2, Array, Axis};
///
/// // training data with two outputs
/// let xt = arr2(&[[0.0], [5.0], [10.0], [15.0], [18.0], [20.0], [25.0]]);
/// let yt = ndarray::concatenate![Axis(1), xt.mapv(|v: f64| v.sin()), xt.mapv(|v: f64| v.cos())];
///
/// let kernel = Kernel::stationary(StationaryKind::SquaredExponential, 1.0, arr1(&[1.0]));
/// let gp = GaussianProcess::params(kernel)
///     .fit(&Dataset::new(xt, yt))
///     .expect("GP trained");
///
/// let xtest = Array::linspace(0., 25., 26).insert_axis(Axis(1));
/// let ymean = gp.predict(&xtest).expect("GP prediction");
/// let yvariances = gp.predict_var(&xtest).expect("GP prediction");
///```
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "serializable",
    derive(Serialize, Deserialize),
    serde(bound(serialize = "F: Serialize", deserialize = "F: Deserialize<'de>"))
)]
pub struct GaussianProcess<F: Float> {
    /// Fitted covariance function
    kernel: Kernel<F>,
    /// Fitted noise variance (whitened output units)
    noise_variance: F,
    /// Log marginal likelihood at fitted hyperparameters
    likelihood: F,
    /// Gaussian process internal fitted params
    inner_params: GpInnerParams<F>,
    /// Training inputs
    xtrain: Array2<F>,
    /// Whitened training outputs
    yt_norm: NormalizedData<F>,
    /// Training dataset (input, output)
    pub(crate) training_data: (Array2<F>, Array2<F>),
    /// Parameters used to fit this model
    pub(crate) params: GpValidParams<F>,
}

impl<F: Float> fmt::Display for GaussianProcess<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "GP(kernel={}, hyperparameters={:?}, noise_variance={}, likelihood={})",
            self.kernel,
            self.kernel.hyperparameters(),
            self.noise_variance,
            self.likelihood,
        )
    }
}

impl<F: Float> GaussianProcess<F> {
    /// Gp parameters contructor
    pub fn params(kernel: Kernel<F>) -> GpParams<F> {
        GpParams::new(kernel)
    }

    fn check_input(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<()> {
        if x.ncols() != self.xtrain.ncols() {
            return Err(GpError::InvalidValueError(format!(
                "Expected points with {} components, got {}",
                self.xtrain.ncols(),
                x.ncols()
            )));
        }
        Ok(())
    }

    /// Predict output values at n given `x` points of nx components specified as a (n, nx) matrix.
    /// Returns a (n, ny) matrix of the output means.
    pub fn predict(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array2<F>> {
        self.check_input(x)?;
        let ks = self.kernel.cross(x, &self.xtrain);
        let mean = ks.dot(&self.inner_params.alpha);
        Ok(self.yt_norm.denormalize(&mean))
    }

    /// Predict variance of the latent function at n given `x` points of nx components
    /// specified as a (n, nx) matrix. Returns a (n, ny) matrix of variances.
    pub fn predict_var(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array2<F>> {
        self.check_input(x)?;
        let ks = self.kernel.cross(x, &self.xtrain);
        let var = self.latent_var(x, &ks)?;
        Ok(self.yt_norm.denormalize_var(&var))
    }

    /// Predict both output values and variances at n given `x` points of nx components
    pub fn predict_valvar(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Result<(Array2<F>, Array2<F>)> {
        self.check_input(x)?;
        let ks = self.kernel.cross(x, &self.xtrain);
        let mean = ks.dot(&self.inner_params.alpha);
        let var = self.latent_var(x, &ks)?;
        Ok((
            self.yt_norm.denormalize(&mean),
            self.yt_norm.denormalize_var(&var),
        ))
    }

    /// Variance of the whitened latent process given cross covariances `ks` (n, nt)
    fn latent_var(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
        ks: &Array2<F>,
    ) -> Result<Array1<F>> {
        let v = self
            .inner_params
            .l_chol
            .solve_triangular(&ks.t(), UPLO::Lower)?;
        let var = self.kernel.diag(x) - v.mapv(|v| v * v).sum_axis(Axis(0));
        // Variance might be slightly negative depending on
        // machine precision: set to zero in that case
        Ok(var.mapv(|v| if v < F::zero() { F::zero() } else { v }))
    }

    /// Fitted covariance function
    pub fn kernel(&self) -> &Kernel<F> {
        &self.kernel
    }

    /// Fitted noise variance expressed in whitened output units
    pub fn noise_variance(&self) -> F {
        self.noise_variance
    }

    /// Log marginal likelihood of the training data at fitted hyperparameters
    pub fn likelihood(&self) -> F {
        self.likelihood
    }

    /// Input dimension
    pub fn dims(&self) -> usize {
        self.xtrain.ncols()
    }

    /// Number of outputs
    pub fn n_outputs(&self) -> usize {
        self.yt_norm.data.ncols()
    }

    /// Training dataset (inputs, outputs)
    pub fn training_data(&self) -> &(Array2<F>, Array2<F>) {
        &self.training_data
    }

    /// Parameters used to fit this model
    pub fn params_used(&self) -> &GpValidParams<F> {
        &self.params
    }
}

#[cfg(feature = "persistent")]
impl<F: Float + Serialize + serde::de::DeserializeOwned> GaussianProcess<F> {
    /// Save the trained GP in given json file
    pub fn save(&self, path: &str) -> Result<()> {
        let mut file = fs::File::create(path)?;
        let bytes = serde_json::to_vec(self)?;
        file.write_all(&bytes)?;
        Ok(())
    }

    /// Load a trained GP from given json file
    pub fn load(path: &str) -> Result<Box<GaussianProcess<F>>> {
        let data = fs::read(path)?;
        let gp: GaussianProcess<F> = serde_json::from_slice(&data)?;
        Ok(Box::new(gp))
    }
}

impl<F, D> PredictInplace<ArrayBase<D, Ix2>, Array2<F>> for GaussianProcess<F>
where
    F: Float,
    D: Data<Elem = F>,
{
    fn predict_inplace(&self, x: &ArrayBase<D, Ix2>, y: &mut Array2<F>) {
        assert_eq!(
            x.nrows(),
            y.nrows(),
            "The number of data points must match the number of output targets."
        );

        let values = self.predict(x).expect("GP Prediction");
        *y = values;
    }

    fn default_target(&self, x: &ArrayBase<D, Ix2>) -> Array2<F> {
        Array2::zeros((x.nrows(), self.n_outputs()))
    }
}

impl<F: Float, D: Data<Elem = F>> Fit<ArrayBase<D, Ix2>, ArrayBase<D, Ix2>, GpError>
    for GpValidParams<F>
{
    type Object = GaussianProcess<F>;

    /// Fit GP hyperparameters using maximum likelihood
    fn fit(
        &self,
        dataset: &DatasetBase<ArrayBase<D, Ix2>, ArrayBase<D, Ix2>>,
    ) -> Result<Self::Object> {
        let x = dataset.records().to_owned();
        let y = dataset.targets().to_owned();

        if x.nrows() != y.nrows() {
            return Err(GpError::InvalidValueError(format!(
                "Inputs and outputs should have the same number of rows, got {} and {}",
                x.nrows(),
                y.nrows()
            )));
        }
        if x.nrows() < 2 {
            return Err(GpError::InvalidValueError(format!(
                "At least 2 training points are required, got {}",
                x.nrows()
            )));
        }
        if !self.kernel().accepts_dim(x.ncols()) {
            return Err(GpError::InvalidValueError(format!(
                "Kernel {} expects inputs with {:?} components, got {}",
                self.kernel(),
                self.kernel().input_dims(),
                x.ncols()
            )));
        }
        if has_duplicate_rows(&x) {
            warn!("Multiple training points have the same input value (at least same row twice)");
        }

        let ytrain = NormalizedData::new(&y);
        let kernel0 = self.kernel().clone();

        // Hyperparameters to optimize: kernel ones then noise variance
        let mut init: Vec<F> = vec![];
        let mut bounds: Vec<(F, F)> = vec![];
        let n_kernel = match self.tuning() {
            HyperTuning::Fixed => 0,
            HyperTuning::Optimized => {
                init.extend(kernel0.hyperparameters());
                bounds.extend(kernel0.hyperparameter_bounds());
                init.len()
            }
        };
        if let NoiseTuning::Optimized {
            init: noise0,
            bounds: noise_bounds,
        } = self.noise()
        {
            init.push(*noise0);
            bounds.push(*noise_bounds);
        }

        let (kernel, noise) = if init.is_empty() {
            (kernel0, self.noise().init())
        } else {
            let base: f64 = 10.;
            let unpack = |log_params: &[f64]| -> (Kernel<F>, F) {
                let values: Vec<F> = log_params.iter().map(|v| F::cast(base.powf(*v))).collect();
                let mut kernel = kernel0.clone();
                if n_kernel > 0 {
                    kernel.set_hyperparameters(&values[..n_kernel]);
                }
                let noise = match self.noise() {
                    NoiseTuning::Fixed(v) => *v,
                    NoiseTuning::Optimized { .. } => values[values.len() - 1],
                };
                (kernel, noise)
            };
            let objfn = |p: &[f64], _gradient: Option<&mut [f64]>, _params: &mut ()| -> f64 {
                // check as optimizer may return nan values
                if p.iter().any(|v| v.is_nan()) {
                    // shortcut return worst value wrt to likelihood maximization
                    return f64::INFINITY;
                }
                let (kernel, noise) = unpack(p);
                match log_marginal_likelihood(&kernel, noise, self.nugget(), &x, &ytrain.data) {
                    Ok((lml, _)) => -into_f64(&lml),
                    Err(_) => f64::INFINITY,
                }
            };

            let (starts, log_bounds) = prepare_multistart(
                self.n_start(),
                &Array1::from_vec(init),
                &bounds,
                self.seed(),
            );
            debug!("Optimize with multistart log10 params = {starts:?} and bounds = {log_bounds:?}");
            let now = Instant::now();
            let opt_params = (0..starts.nrows())
                .into_par_iter()
                .map(|i| {
                    optimize_params(
                        objfn,
                        &starts.row(i).to_owned(),
                        &log_bounds,
                        CobylaParams {
                            maxeval: (10 * starts.ncols())
                                .clamp(GP_COBYLA_MIN_EVAL, self.max_eval()),
                            ..CobylaParams::default()
                        },
                    )
                })
                .reduce(
                    || (f64::INFINITY, Array1::zeros(starts.ncols())),
                    |a, b| if b.0 < a.0 { b } else { a },
                );
            debug!("elapsed optim = {:?}", now.elapsed().as_millis());

            if opt_params.0.is_finite() {
                unpack(&opt_params.1.to_vec())
            } else {
                warn!("GP hyperparameters optimization failed, keep initial values");
                unpack(&starts.row(0).to_vec())
            }
        };

        let (likelihood, inner_params) =
            log_marginal_likelihood(&kernel, noise, self.nugget(), &x, &ytrain.data)?;
        debug!("GP fitted: kernel={kernel} noise_variance={noise} likelihood={likelihood}");
        Ok(GaussianProcess {
            kernel,
            noise_variance: noise,
            likelihood,
            inner_params,
            xtrain: x.to_owned(),
            yt_norm: ytrain,
            training_data: (x, y),
            params: self.clone(),
        })
    }
}

/// Compute log marginal likelihood summed over independent whitened outputs
/// kernel: covariance function,
/// noise: gaussian likelihood variance,
/// nugget: factor to improve numerical stability,
/// x: training inputs,
/// ytrain: whitened training outputs (n, ny)
fn log_marginal_likelihood<F: Float>(
    kernel: &Kernel<F>,
    noise: F,
    nugget: F,
    x: &Array2<F>,
    ytrain: &Array2<F>,
) -> Result<(F, GpInnerParams<F>)> {
    let n_obs = F::cast(x.nrows());
    let n_out = F::cast(ytrain.ncols());

    let mut k_mx = kernel.gram(x);
    k_mx.diag_mut().mapv_inplace(|v| v + noise + nugget);
    let l_chol = k_mx.cholesky()?;

    let a = l_chol.solve_triangular(ytrain, UPLO::Lower)?;
    let data_fit = a.mapv(|v| v * v).sum();
    // log det K = 2 sum log L_ii
    let half_logdet = l_chol.diag().mapv(|v| v.ln()).sum();
    let log_2pi = F::cast((2. * std::f64::consts::PI).ln());

    let likelihood =
        F::cast(-0.5) * data_fit - n_out * half_logdet - F::cast(0.5) * n_obs * n_out * log_2pi;
    if !likelihood.is_finite() {
        return Err(GpError::LikelihoodComputationError(format!(
            "Non finite log likelihood with kernel {kernel} and noise {noise}"
        )));
    }

    let alpha = l_chol.t().solve_triangular(&a, UPLO::Upper)?;
    Ok((likelihood, GpInnerParams { l_chol, alpha }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::StationaryKind;
    use approx::assert_abs_diff_eq;
    use gpemu_doe::{RandomUniform, SamplingMethod};
    use linfa::prelude::{Dataset, Predict};
    use ndarray::{arr1, arr2, array, concatenate, Array};
    use ndarray_npy::write_npy;
    use ndarray_rand::rand::SeedableRng;
    use paste::paste;
    use rand_xoshiro::Xoshiro256Plus;

    fn rbf(dim: usize, l: f64) -> Kernel<f64> {
        Kernel::stationary(
            StationaryKind::SquaredExponential,
            1.0,
            Array1::from_elem(dim, l),
        )
    }

    #[test]
    fn test_constant_function() {
        let dim = 3;
        let lim = array![[0., 1.]];
        let xlimits = lim.broadcast((dim, 2)).unwrap();
        let rng = Xoshiro256Plus::seed_from_u64(42);
        let nt = 5;
        let xt = RandomUniform::new(&xlimits).with_rng(rng).sample(nt);
        let yt = Array2::from_elem((nt, 2), 3.1);
        let gp = GaussianProcess::params(rbf(dim, 0.5))
            .fit(&Dataset::new(xt, yt))
            .expect("GP fit error");
        let rng = Xoshiro256Plus::seed_from_u64(43);
        let xtest = RandomUniform::new(&xlimits).with_rng(rng).sample(nt);
        let ytest = gp.predict(&xtest).expect("prediction error");
        assert_abs_diff_eq!(Array::from_elem((nt, 2), 3.1), ytest, epsilon = 1e-6);
    }

    #[test]
    fn test_log_marginal_likelihood_value() {
        // K = [[2, 1], [1, 2]] with whitened y = [1, -1] / sqrt(2)
        let xt = array![[0.], [1.]];
        let yt = array![[1.], [-1.]];
        let gp = GaussianProcess::params(Kernel::bias())
            .tuning(HyperTuning::Fixed)
            .noise(NoiseTuning::Fixed(1.0))
            .nugget(0.)
            .fit(&Dataset::new(xt, yt))
            .expect("GP fit error");
        let expected = -0.5 - 0.5 * 3f64.ln() - (2. * std::f64::consts::PI).ln();
        assert_abs_diff_eq!(expected, gp.likelihood(), epsilon = 1e-12);
    }

    #[test]
    fn test_multi_output() {
        let xt = Array::linspace(0., 6., 12).insert_axis(Axis(1));
        let yt = concatenate![Axis(1), xt.mapv(f64::sin), xt.mapv(|v| 2. * v.cos())];
        let gp = GaussianProcess::params(rbf(1, 1.0))
            .fit(&Dataset::new(xt, yt))
            .expect("GP fit error");
        assert_eq!(2, gp.n_outputs());
        let xtest = array![[1.3], [2.9], [4.4]];
        let expected = concatenate![
            Axis(1),
            xtest.mapv(f64::sin),
            xtest.mapv(|v| 2. * v.cos())
        ];
        let (mean, var) = gp.predict_valvar(&xtest).expect("prediction error");
        assert_abs_diff_eq!(expected, mean, epsilon = 5e-2);
        assert_eq!((3, 2), var.dim());
        assert!(var.iter().all(|v| *v >= 0. && *v < 1e-1));
        // outputs share the kernel so variances only differ by output scale
        let ratio = &var.column(1) / &var.column(0);
        let scale = gp.training_data().1.std_axis(Axis(0), 1.);
        let expected_ratio = (scale[1] / scale[0]).powi(2);
        for r in ratio.iter().filter(|r| r.is_finite()) {
            assert_abs_diff_eq!(*r, expected_ratio, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_linfa_predict() {
        let xt = array![[0.0], [1.0], [2.0], [3.0], [4.0]];
        let yt = array![[0.0], [1.0], [1.5], [0.9], [1.0]];
        let gp = GaussianProcess::params(rbf(1, 1.0))
            .fit(&Dataset::new(xt.clone(), yt))
            .expect("GP fit error");
        let ypred: Array2<f64> = Predict::predict(&gp, &xt);
        assert_abs_diff_eq!(ypred, gp.predict(&xt).unwrap(), epsilon = 1e-12);
    }

    #[test]
    fn test_bad_inputs() {
        let res = GaussianProcess::params(rbf(1, 1.0)).fit(&Dataset::new(array![[0.]], array![[1.]]));
        assert!(matches!(res, Err(GpError::InvalidValueError(_))));

        let res = GaussianProcess::params(rbf(2, 1.0)).fit(&Dataset::new(
            array![[0.], [1.], [2.]],
            array![[1.], [0.], [1.]],
        ));
        assert!(matches!(res, Err(GpError::InvalidValueError(_))));

        let gp = GaussianProcess::params(rbf(1, 1.0))
            .fit(&Dataset::new(array![[0.], [1.], [2.]], array![[1.], [0.], [1.]]))
            .expect("GP fit error");
        assert!(matches!(
            gp.predict(&array![[0., 1.]]),
            Err(GpError::InvalidValueError(_))
        ));
    }

    macro_rules! test_gp {
        ($name:ident, $kernel:expr) => {
            paste! {

                #[test]
                fn [<test_gp_ $name>]() {
                    let xt = array![[0.0], [1.0], [2.0], [3.0], [4.0]];
                    let xplot = Array::linspace(0., 4., 100).insert_axis(Axis(1));
                    let yt = array![[0.0], [1.0], [1.5], [0.9], [1.0]];
                    let gp = GaussianProcess::params($kernel)
                        .fit(&Dataset::new(xt, yt))
                        .expect("GP fit error");
                    let yvals = gp
                        .predict(&arr2(&[[1.0], [3.5]]))
                        .expect("prediction error");
                    let expected_y = arr2(&[[1.0], [0.9]]);
                    assert_abs_diff_eq!(expected_y, yvals, epsilon = 0.5);

                    let gpr_vals = gp.predict(&xplot).unwrap();

                    let yvars = gp
                        .predict_var(&arr2(&[[1.0], [3.5]]))
                        .expect("prediction error");
                    let expected_vars = arr2(&[[0.], [0.1]]);
                    assert_abs_diff_eq!(expected_vars, yvars, epsilon = 0.5);

                    let gpr_vars = gp.predict_var(&xplot).unwrap();

                    let test_dir = "target/tests";
                    std::fs::create_dir_all(test_dir).ok();

                    let xplot_file = stringify!([<gp_x_ $name>]);
                    let file_path = format!("{}/{}.npy", test_dir, xplot_file);
                    write_npy(file_path, &xplot).expect("x saved");

                    let gp_vals_file = stringify!([<gp_vals_ $name>]);
                    let file_path = format!("{}/{}.npy", test_dir, gp_vals_file);
                    write_npy(file_path, &gpr_vals).expect("gp vals saved");

                    let gp_vars_file = stringify!([<gp_vars_ $name>]);
                    let file_path = format!("{}/{}.npy", test_dir, gp_vars_file);
                    write_npy(file_path, &gpr_vars).expect("gp vars saved");
                }
            }
        };
    }

    test_gp!(rbf, rbf(1, 1.0));
    test_gp!(
        matern32,
        Kernel::stationary(StationaryKind::Matern32, 1.0, arr1(&[1.0]))
    );
    test_gp!(
        matern52,
        Kernel::stationary(StationaryKind::Matern52, 1.0, arr1(&[1.0]))
    );
    test_gp!(
        matern12,
        Kernel::stationary(StationaryKind::Matern12, 1.0, arr1(&[1.0]))
    );
    test_gp!(
        rational_quadratic,
        Kernel::rational_quadratic(1.0, arr1(&[1.0]), 1.0)
    );
    test_gp!(rbf_plus_bias, rbf(1, 1.0) + Kernel::bias());

    #[cfg(feature = "persistent")]
    #[test]
    fn test_save_load() {
        let xt = array![[0.0], [1.0], [2.0], [3.0], [4.0]];
        let yt = array![[0.0, 1.], [1.0, 2.], [1.5, 0.], [0.9, 1.], [1.0, 3.]];
        let gp = GaussianProcess::params(rbf(1, 1.0))
            .fit(&Dataset::new(xt, yt))
            .expect("GP fit error");
        let test_dir = "target/tests";
        std::fs::create_dir_all(test_dir).ok();
        let path = format!("{test_dir}/gp_save.json");
        gp.save(&path).expect("GP saved");
        let loaded = GaussianProcess::<f64>::load(&path).expect("GP loaded");
        let xtest = array![[0.5], [2.5]];
        assert_abs_diff_eq!(
            gp.predict(&xtest).unwrap(),
            loaded.predict(&xtest).unwrap(),
            epsilon = 1e-12
        );
    }
}
