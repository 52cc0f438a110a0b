//! Gaussian process emulation of an ensemble of simulator runs.

use crate::errors::{EmuError, Result};
use crate::grid::LabeledGrid;
use crate::kernel_spec::KernelSpec;
use crate::processors::{DataProcessor, ProcessorSpec};
use crate::surrogate::Surrogate;

use gpemu_gp::{
    Covariance, GaussianProcess, GpParams, Kernel, NoiseTuning, GP_COBYLA_MAX_EVAL,
    GP_OPTIM_N_START,
};
use linfa::{traits::Fit, Dataset};
use log::{debug, info};
use ndarray::{Array1, Array2, ArrayBase, ArrayView2, Axis, Data, Ix2, Zip};
use serde::{Deserialize, Serialize};

/// Prefix of the predicted mean name
pub const MEAN_PREFIX: &str = "Emulated ";
/// Prefix of the predicted variance name
pub const VARIANCE_PREFIX: &str = "Variance in emulated ";

/// Default number of parameter rows predicted at once by [Emulator::batch_stats]
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Emulator configuration as read from json
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmulatorConfig {
    /// Kernel names, see [KernelSpec] conversion from json values
    pub kernel: serde_json::Value,
    /// Number of restarts of the hyperparameters optimization
    pub n_start: usize,
    /// Max number of likelihood evaluations per optimization
    pub max_eval: usize,
    /// Seed of the optimization restarts
    pub seed: u64,
    /// Transforms applied to the training outputs
    pub processors: Vec<ProcessorSpec>,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        EmulatorConfig {
            kernel: serde_json::Value::Null,
            n_start: GP_OPTIM_N_START,
            max_eval: GP_COBYLA_MAX_EVAL,
            seed: 42,
            processors: vec![],
        }
    }
}

/// A GP surrogate of a simulator trained on an ensemble of runs.
///
/// Every cell of the output field is an output of the GP, all cells sharing the
/// same kernel hyperparameters.
#[derive(Debug)]
pub struct Emulator {
    params: Array2<f64>,
    outputs: Array2<f64>,
    template: LabeledGrid,
    kernel: Kernel<f64>,
    gp_params: GpParams<f64>,
    processors: Vec<Box<dyn DataProcessor>>,
    gp: Option<GaussianProcess<f64>>,
}

impl Emulator {
    /// Emulator of the `ensemble` whose members (first axis) were generated with
    /// the (n_members, n_params) `params`.
    ///
    /// The kernel is built here so that invalid specifications fail early.
    pub fn new(
        params: &ArrayBase<impl Data<Elem = f64>, Ix2>,
        ensemble: &LabeledGrid,
        kernel: KernelSpec,
    ) -> Result<Self> {
        if ensemble.data().ndim() == 0 {
            return Err(EmuError::InvalidArgument(
                "Ensemble should have a leading member axis".to_string(),
            ));
        }
        if params.nrows() != ensemble.n_members() {
            return Err(EmuError::InvalidArgument(format!(
                "Got {} parameter rows for {} ensemble members",
                params.nrows(),
                ensemble.n_members()
            )));
        }
        if params.ncols() == 0 {
            return Err(EmuError::InvalidArgument(
                "At least one parameter is required".to_string(),
            ));
        }
        let kernel = kernel.build(params.ncols());
        if !kernel.accepts_dim(params.ncols()) {
            return Err(EmuError::InvalidArgument(format!(
                "Kernel {kernel} expects {:?} parameters, got {}",
                kernel.input_dims(),
                params.ncols()
            )));
        }
        let gp_params = GaussianProcess::params(kernel.clone());
        Ok(Emulator {
            params: params.to_owned(),
            outputs: ensemble.flatten_members()?,
            template: ensemble.member(0)?,
            kernel,
            gp_params,
            processors: vec![],
            gp: None,
        })
    }

    /// Emulator built from a json like configuration
    pub fn from_config(
        params: &ArrayBase<impl Data<Elem = f64>, Ix2>,
        ensemble: &LabeledGrid,
        config: &EmulatorConfig,
    ) -> Result<Self> {
        let spec = KernelSpec::try_from(&config.kernel)?;
        let emulator = Emulator::new(params, ensemble, spec)?
            .n_start(config.n_start)
            .max_eval(config.max_eval)
            .seed(config.seed);
        Ok(config
            .processors
            .iter()
            .fold(emulator, |emu, p| emu.with_processor(p.build())))
    }

    /// Set the number of restarts of the hyperparameters optimization
    pub fn n_start(mut self, n_start: usize) -> Self {
        self.gp_params = self.gp_params.n_start(n_start);
        self
    }

    /// Set the max number of likelihood evaluations per optimization
    pub fn max_eval(mut self, max_eval: usize) -> Self {
        self.gp_params = self.gp_params.max_eval(max_eval);
        self
    }

    /// Set the seed of the optimization restarts
    pub fn seed(mut self, seed: u64) -> Self {
        self.gp_params = self.gp_params.seed(seed);
        self
    }

    /// Set the likelihood noise variance tuning
    pub fn noise(mut self, noise: NoiseTuning<f64>) -> Self {
        self.gp_params = self.gp_params.noise(noise);
        self
    }

    /// Append a transform of the training outputs
    pub fn with_processor(mut self, processor: Box<dyn DataProcessor>) -> Self {
        self.processors.push(processor);
        self
    }

    /// Fit kernel hyperparameters and noise variance to the ensemble.
    /// Calling it again re-trains from the initial kernel.
    pub fn train(&mut self) -> Result<()> {
        let mut data = self.outputs.clone();
        for processor in self.processors.iter_mut() {
            data = processor.process(&data)?;
        }
        let dataset = Dataset::new(self.params.clone(), data);
        debug!(
            "Training emulator on {} members with {} cells",
            self.params.nrows(),
            self.outputs.ncols()
        );
        let gp = self
            .gp_params
            .clone()
            .kernel(self.kernel.clone())
            .fit(&dataset)?;
        info!(
            "Emulator trained: {} (noise variance {:.3e}, log likelihood {:.4})",
            gp.kernel(),
            gp.noise_variance(),
            gp.likelihood()
        );
        self.gp = Some(gp);
        Ok(())
    }

    /// Whether [Emulator::train] succeeded
    pub fn is_trained(&self) -> bool {
        self.gp.is_some()
    }

    /// The trained gaussian process
    pub fn gp(&self) -> Result<&GaussianProcess<f64>> {
        self.gp.as_ref().ok_or(EmuError::NotTrained)
    }

    /// Fitted kernel when trained, initial kernel otherwise
    pub fn kernel(&self) -> &Kernel<f64> {
        self.gp.as_ref().map(|gp| gp.kernel()).unwrap_or(&self.kernel)
    }

    /// Training parameters
    pub fn training_params(&self) -> &Array2<f64> {
        &self.params
    }

    /// Predicted (mean, variance) of shape (n_samples, n_cells)
    pub fn predict_raw(
        &self,
        x: &ArrayBase<impl Data<Elem = f64>, Ix2>,
    ) -> Result<(Array2<f64>, Array2<f64>)> {
        let gp = self.gp()?;
        let (mean, var) = gp.predict_valvar(x)?;
        Ok(self
            .processors
            .iter()
            .rev()
            .fold((mean, var), |(m, v), p| p.unprocess(m, v)))
    }

    /// Predicted mean and variance grids named `"Emulated <name>"` and
    /// `"Variance in emulated <name>"`, with the ensemble units.
    ///
    /// A single row gives member shaped grids, several rows add a leading sample axis.
    pub fn predict(
        &self,
        x: &ArrayBase<impl Data<Elem = f64>, Ix2>,
    ) -> Result<(LabeledGrid, LabeledGrid)> {
        let (mean, var) = self.predict_raw(x)?;
        Ok((
            self.template.from_member_rows(&mean)?.prefixed(MEAN_PREFIX),
            self.template
                .from_member_rows(&var)?
                .prefixed(VARIANCE_PREFIX),
        ))
    }

    /// Mean and standard deviation (population) of the predicted means over the rows of
    /// `sample_params`, predicted [DEFAULT_BATCH_SIZE] rows at a time.
    pub fn batch_stats(
        &self,
        sample_params: &ArrayBase<impl Data<Elem = f64>, Ix2>,
    ) -> Result<(LabeledGrid, LabeledGrid)> {
        self.batch_stats_with_batch_size(sample_params, DEFAULT_BATCH_SIZE)
    }

    /// Same as [Emulator::batch_stats] predicting `batch_size` rows at a time
    pub fn batch_stats_with_batch_size(
        &self,
        sample_params: &ArrayBase<impl Data<Elem = f64>, Ix2>,
        batch_size: usize,
    ) -> Result<(LabeledGrid, LabeledGrid)> {
        if sample_params.nrows() == 0 {
            return Err(EmuError::InvalidArgument(
                "batch_stats requires at least one sample".to_string(),
            ));
        }
        let n_cells = self.outputs.ncols();
        let mut mean = Array1::<f64>::zeros(n_cells);
        let mut m2 = Array1::<f64>::zeros(n_cells);
        let mut count = 0.;
        for batch in sample_params.axis_chunks_iter(Axis(0), batch_size.max(1)) {
            let (pred, _) = self.predict_raw(&batch)?;
            for row in pred.rows() {
                count += 1.;
                Zip::from(&mut mean)
                    .and(&mut m2)
                    .and(&row)
                    .for_each(|m, s, y| {
                        let delta = y - *m;
                        *m += delta / count;
                        *s += delta * (y - *m);
                    });
            }
        }
        let std = m2.mapv(|v| (v / count).sqrt());
        Ok((
            self.template
                .from_member_rows(&mean.insert_axis(Axis(0)))?
                .prefixed("Mean of emulated "),
            self.template
                .from_member_rows(&std.insert_axis(Axis(0)))?
                .prefixed("Std. dev. of emulated "),
        ))
    }
}

impl Surrogate for Emulator {
    fn predict_raw(&self, x: &ArrayView2<f64>) -> Result<(Array2<f64>, Array2<f64>)> {
        Emulator::predict_raw(self, x)
    }

    fn n_params(&self) -> usize {
        self.params.ncols()
    }

    fn n_cells(&self) -> usize {
        self.outputs.ncols()
    }

    /// Range of the training parameters
    fn param_bounds(&self) -> Array2<f64> {
        let mut bounds = Array2::zeros((self.params.ncols(), 2));
        Zip::from(bounds.rows_mut())
            .and(self.params.columns())
            .for_each(|mut b, col| {
                let lo = col.fold(f64::INFINITY, |acc, v| acc.min(*v));
                let hi = col.fold(f64::NEG_INFINITY, |acc, v| acc.max(*v));
                if hi > lo {
                    b[0] = lo;
                    b[1] = hi;
                } else {
                    b[0] = lo - 0.5;
                    b[1] = lo + 0.5;
                }
            });
        bounds
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::grid::Coord;
    use crate::processors::Normalise;
    use crate::sampling::{random_params, split_rows, uniform_params};
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array2};
    use paste::paste;

    pub(crate) const N_CELLS: usize = 4;

    /// Smooth simulator producing a 1D field of [N_CELLS] cells
    pub(crate) fn simulate(params: &Array2<f64>) -> Array2<f64> {
        Array2::from_shape_fn((params.nrows(), N_CELLS), |(i, k)| {
            let (a, b) = (params[[i, 0]], params[[i, 1]]);
            a * a + 2. * b + 0.25 * k as f64 * a
        })
    }

    pub(crate) fn ensemble(params: &Array2<f64>) -> LabeledGrid {
        LabeledGrid::new(simulate(params).into_dyn())
            .with_name("Simple 1D")
            .with_units("kg m-2")
            .with_coord(1, Coord::new("x", array![0., 1., 2., 3.]))
            .unwrap()
    }

    fn trained(kernel: KernelSpec) -> (Emulator, Array2<f64>) {
        let (params, test) = split_rows(&uniform_params(2, 6), &[10, 12]).unwrap();
        let mut emu = Emulator::new(&params, &ensemble(&params), kernel).unwrap();
        emu.train().expect("training");
        (emu, test)
    }

    #[test]
    fn test_predict_raw() {
        let (emu, test) = trained(KernelSpec::default());
        let (mean, var) = emu.predict_raw(&test.slice(ndarray::s![0..1, ..])).unwrap();
        assert_eq!((1, N_CELLS), mean.dim());
        assert_eq!((1, N_CELLS), var.dim());
        let expected = simulate(&test.slice(ndarray::s![0..1, ..]).to_owned());
        assert_abs_diff_eq!(mean, expected, epsilon = 2e-2);
        assert!(var.iter().all(|v| *v >= 0.));
    }

    #[test]
    fn test_predict_interface() {
        let (emu, test) = trained(
            KernelSpec::named(&["Bias", "Polynomial", "Linear", "RBF"], "+").unwrap(),
        );
        let (mean, var) = emu.predict(&test.slice(ndarray::s![0..1, ..])).unwrap();
        assert_eq!(&[N_CELLS], mean.shape());
        assert_eq!("Emulated Simple 1D", mean.name());
        assert_eq!("Variance in emulated Simple 1D", var.name());
        assert_eq!("kg m-2", mean.units());
        assert_eq!("kg m-2", var.units());
        assert_eq!("x", mean.coord(0).unwrap().name);

        let (mean, var) = emu.predict(&test).unwrap();
        assert_eq!(&[2, N_CELLS], mean.shape());
        assert_eq!(&[2, N_CELLS], var.shape());
        let expected = simulate(&test);
        assert_abs_diff_eq!(
            mean.flatten_members().unwrap(),
            expected,
            epsilon = 5e-2
        );
    }

    #[test]
    fn test_unnamed_ensemble() {
        let params = uniform_params(2, 4);
        let ens = LabeledGrid::new(simulate(&params).into_dyn());
        let mut emu = Emulator::new(&params, &ens, KernelSpec::named(&["RBF"], "+").unwrap())
            .unwrap()
            .n_start(2);
        emu.train().unwrap();
        let (mean, var) = emu.predict(&array![[0.3, 0.3], [0.6, 0.1]]).unwrap();
        assert_eq!("Emulated data", mean.name());
        assert_eq!("Variance in emulated data", var.name());
        assert_eq!("", mean.units());
    }

    #[test]
    fn test_empty_name_falls_back() {
        let params = uniform_params(2, 4);
        let ens = LabeledGrid::new(simulate(&params).into_dyn()).with_name("");
        let mut emu = Emulator::new(&params, &ens, KernelSpec::named(&["RBF"], "+").unwrap())
            .unwrap()
            .n_start(2);
        emu.train().unwrap();
        let (mean, var) = emu.predict(&array![[0.3, 0.3]]).unwrap();
        assert_eq!("Emulated data", mean.name());
        assert_eq!("Variance in emulated data", var.name());
    }

    /// 3 parameters driving a (2, 3) lat/lon field
    fn simulate_2d(params: &Array2<f64>) -> ndarray::Array3<f64> {
        ndarray::Array3::from_shape_fn((params.nrows(), 2, 3), |(i, j, k)| {
            let (a, b, c) = (params[[i, 0]], params[[i, 1]], params[[i, 2]]);
            a + 0.5 * b * j as f64 + c * c * (k as f64 + 1.)
        })
    }

    #[test]
    fn test_predict_2d_field() {
        let params = uniform_params(3, 4);
        let ens = LabeledGrid::new(simulate_2d(&params).into_dyn())
            .with_name("Simple 2D")
            .with_units("K")
            .with_coord(1, Coord::new("lat", array![-45., 45.]))
            .unwrap()
            .with_coord(2, Coord::new("lon", array![0., 120., 240.]))
            .unwrap();
        let mut emu = Emulator::new(&params, &ens, KernelSpec::default())
            .unwrap()
            .n_start(3);
        emu.train().expect("training");
        assert_eq!(6, emu.n_cells());

        let x = array![[0.2, 0.4, 0.6]];
        let (mean, var) = emu.predict(&x).unwrap();
        assert_eq!(&[2, 3], mean.shape());
        assert_eq!(&[2, 3], var.shape());
        assert_eq!("Emulated Simple 2D", mean.name());
        assert_eq!("K", mean.units());
        assert_eq!("K", var.units());
        assert_eq!("lat", mean.coord(0).unwrap().name);
        assert_eq!(array![0., 120., 240.], mean.coord(1).unwrap().points);
        let expected = simulate_2d(&x).index_axis(Axis(0), 0).to_owned().into_dyn();
        assert_abs_diff_eq!(mean.data(), &expected, epsilon = 5e-2);

        let x = array![[0.2, 0.4, 0.6], [0.7, 0.1, 0.3]];
        let (mean, _) = emu.predict(&x).unwrap();
        assert_eq!(&[2, 2, 3], mean.shape());
        assert!(mean.coord(0).is_none());
        assert_eq!("lat", mean.coord(1).unwrap().name);
        assert_eq!("lon", mean.coord(2).unwrap().name);
        assert_abs_diff_eq!(mean.data(), &simulate_2d(&x).into_dyn(), epsilon = 5e-2);
    }

    #[test]
    fn test_custom_kernel_dimension_mismatch() {
        let params = uniform_params(2, 3);
        let kernel = Kernel::stationary(
            gpemu_gp::kernels::StationaryKind::SquaredExponential,
            1.0,
            array![0.5, 0.5, 0.5],
        );
        assert!(matches!(
            Emulator::new(&params, &ensemble(&params), KernelSpec::from(kernel)),
            Err(EmuError::InvalidArgument(_))
        ));
        let kernel = Kernel::linear(array![1.0, 1.0]) + Kernel::white(0.1);
        assert!(Emulator::new(&params, &ensemble(&params), KernelSpec::from(kernel)).is_ok());
    }

    macro_rules! test_named_kernel {
        ($name:ident, $tol:expr) => {
            paste! {
                #[test]
                fn [<test_emulator_ $name:lower _kernel>]() {
                    let (params, test) = split_rows(&uniform_params(2, 6), &[10, 12]).unwrap();
                    let spec = KernelSpec::named(&[stringify!($name)], "+").unwrap();
                    let mut emu = Emulator::new(&params, &ensemble(&params), spec)
                        .unwrap()
                        .n_start(3);
                    emu.train().expect("training");
                    let (mean, var) = emu.predict_raw(&test).unwrap();
                    assert_abs_diff_eq!(mean, simulate(&test), epsilon = $tol);
                    assert!(var.iter().all(|v| v.is_finite() && *v >= 0.));
                }
            }
        };
    }

    test_named_kernel!(RBF, 5e-2);
    test_named_kernel!(Matern32, 1e-1);
    test_named_kernel!(Matern52, 1e-1);
    test_named_kernel!(RationalQuadratic, 1e-1);
    test_named_kernel!(Polynomial, 5e-2);

    #[test]
    fn test_batch_stats() {
        let (emu, _) = trained(KernelSpec::default());
        let sample_params = random_params(2, 25, 0);
        let (mean, std) = emu.batch_stats_with_batch_size(&sample_params, 10).unwrap();
        assert_eq!("Mean of emulated Simple 1D", mean.name());
        assert_eq!("Std. dev. of emulated Simple 1D", std.name());
        assert_eq!(&[N_CELLS], std.shape());

        let expected = simulate(&sample_params);
        let expected_mean = expected.mean_axis(Axis(0)).unwrap();
        let expected_std = expected.std_axis(Axis(0), 0.);
        for k in 0..N_CELLS {
            assert_abs_diff_eq!(mean.data()[[k]], expected_mean[k], epsilon = 0.1 * expected_mean[k]);
            assert_abs_diff_eq!(std.data()[[k]], expected_std[k], epsilon = 0.2 * expected_std[k]);
        }

        // a single default sized batch gives the same statistics
        let (mean_one, std_one) = emu.batch_stats(&sample_params).unwrap();
        assert_abs_diff_eq!(mean_one.data(), mean.data(), epsilon = 1e-10);
        assert_abs_diff_eq!(std_one.data(), std.data(), epsilon = 1e-10);
    }

    #[test]
    fn test_not_trained_and_bad_inputs() {
        let params = uniform_params(2, 3);
        let emu = Emulator::new(&params, &ensemble(&params), KernelSpec::default()).unwrap();
        assert!(!emu.is_trained());
        assert!(matches!(
            emu.predict_raw(&array![[0.5, 0.5]]),
            Err(EmuError::NotTrained)
        ));
        assert!(matches!(
            emu.predict(&array![[0.5, 0.5]]),
            Err(EmuError::NotTrained)
        ));

        let other = uniform_params(2, 2);
        assert!(matches!(
            Emulator::new(&other, &ensemble(&params), KernelSpec::default()),
            Err(EmuError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_from_config_and_retrain() {
        let params = uniform_params(2, 5);
        let config: EmulatorConfig = serde_json::from_value(serde_json::json!({
            "kernel": ["RBF", "Linear"],
            "n_start": 2,
            "processors": ["Normalise"]
        }))
        .unwrap();
        let mut emu = Emulator::from_config(&params, &ensemble(&params), &config).unwrap();
        assert_eq!("RBF + Linear", emu.kernel().to_string());
        emu.train().unwrap();
        let (first, _) = emu.predict_raw(&array![[0.25, 0.75]]).unwrap();
        emu.train().unwrap();
        let (second, _) = emu.predict_raw(&array![[0.25, 0.75]]).unwrap();
        assert_abs_diff_eq!(first, second, epsilon = 1e-9);
        assert_abs_diff_eq!(first, simulate(&array![[0.25, 0.75]]), epsilon = 5e-2);

        let bad = EmulatorConfig {
            kernel: serde_json::json!(5),
            ..EmulatorConfig::default()
        };
        assert!(Emulator::from_config(&params, &ensemble(&params), &bad).is_err());

        let emu = Emulator::new(&params, &ensemble(&params), KernelSpec::default())
            .unwrap()
            .with_processor(Box::new(Normalise::new()));
        assert_eq!(array![[0., 1.], [0., 1.]], emu.param_bounds());
    }
}
