//! MCMC calibration of the emulator parameters against an observation.

use crate::errors::{EmuError, Result};
use crate::grid::LabeledGrid;
use crate::implausibility::{observed_cells, target_log_likelihood};
use crate::surrogate::Surrogate;
use crate::uncertainty::Uncertainties;

use env_logger::{Builder, Env};
use gpemu_mcmc::{
    sample_chain, ChainParams, LogDensity, McmcKernel, SimpleStepSizeAdaptation,
    TransitionKernel, Trace, Uniform,
};
use log::{info, warn};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, Zip};
use ndarray_rand::rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use serde::{Deserialize, Serialize};

/// Environment variable controlling the log level (default "info")
pub const GPEMU_LOG: &str = "GPEMU_LOG";

pub(crate) fn init_logging() {
    let env = Env::new().filter_or(GPEMU_LOG, "info");
    let mut builder = Builder::from_env(env);
    let builder = builder.target(env_logger::Target::Stdout);
    builder.try_init().ok();
}

/// Log density of the parameters given an observation: uniform prior plus the
/// gaussian log likelihood of the emulator implausibility.
///
/// The emulator prediction, hence `diff` and the total standard deviation,
/// is recomputed at every evaluated state.
pub struct CalibrationTarget<'a, S: Surrogate + ?Sized> {
    model: &'a S,
    obs: Array1<f64>,
    obs_var: Array1<f64>,
    prior: Uniform,
    include_emulator_variance: bool,
}

impl<'a, S: Surrogate + ?Sized> CalibrationTarget<'a, S> {
    /// Constructor, `prior` dimension has to match the model parameters
    pub fn new(
        model: &'a S,
        obs: &LabeledGrid,
        uncertainties: &Uncertainties,
        prior: Uniform,
        include_emulator_variance: bool,
    ) -> Result<Self> {
        if prior.dim() != model.n_params() {
            return Err(EmuError::InvalidArgument(format!(
                "Prior of dimension {} for a model with {} parameters",
                prior.dim(),
                model.n_params()
            )));
        }
        let obs = observed_cells(model, obs)?;
        let obs_var = uncertainties.total_variance(&obs)?;
        Ok(CalibrationTarget {
            model,
            obs,
            obs_var,
            prior,
            include_emulator_variance,
        })
    }

    /// Prior of the parameters
    pub fn prior(&self) -> &Uniform {
        &self.prior
    }

    /// Discrepancy `mean - obs` and total standard deviation, both (n, cells),
    /// at the (n, d) parameters `x`
    pub fn diff_and_std(&self, x: &ArrayView2<f64>) -> Result<(Array2<f64>, Array2<f64>)> {
        let (mean, var) = self.model.predict_raw(x)?;
        let diff = mean - &self.obs;
        let mut tot_std = Array2::zeros(var.dim());
        Zip::from(tot_std.rows_mut())
            .and(var.rows())
            .for_each(|mut s, v| {
                Zip::from(&mut s)
                    .and(&v)
                    .and(&self.obs_var)
                    .for_each(|s, v, ov| {
                        let var = if self.include_emulator_variance {
                            v + ov
                        } else {
                            *ov
                        };
                        *s = var.sqrt();
                    })
            });
        Ok((diff, tot_std))
    }
}

impl<S: Surrogate + ?Sized> LogDensity for CalibrationTarget<'_, S> {
    fn dim(&self) -> usize {
        self.prior.dim()
    }

    fn log_prob(&self, x: &ArrayView1<f64>) -> f64 {
        let prior_log_prob = self.prior.log_prob(x);
        if !prior_log_prob.is_finite() {
            return prior_log_prob;
        }
        let x = x.view().insert_axis(Axis(0));
        let log_prob = self
            .diff_and_std(&x)
            .and_then(|(diff, tot_std)| target_log_likelihood(&self.prior, &x, &diff, &tot_std));
        match log_prob {
            Ok(lp) => lp[0],
            Err(err) => {
                warn!("Log likelihood evaluation failed at {x}: {err}");
                f64::NAN
            }
        }
    }
}

/// MCMC sampler configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Transition kernel with its initial step size
    pub kernel: McmcKernel,
    /// Number of discarded transitions before collecting samples
    pub num_burnin_steps: usize,
    /// Number of discarded transitions between two samples
    pub num_steps_between_results: usize,
    /// Fraction of the burn-in during which the step size is adapted (0 disables adaptation)
    pub adaptation_fraction: f64,
    /// Acceptance probability aimed at by the step size adaptation
    pub target_accept_prob: f64,
    /// Chain start, the middle of the prior box when not given
    pub initial_state: Option<Array1<f64>>,
    /// (d, 2) uniform prior bounds, the model parameter bounds when not given
    pub bounds: Option<Array2<f64>>,
    /// Whether the emulator variance adds to the total variance
    pub include_emulator_variance: bool,
    /// Random generator seed
    pub seed: Option<u64>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        SamplerConfig {
            kernel: McmcKernel::default(),
            num_burnin_steps: 1000,
            num_steps_between_results: 0,
            adaptation_fraction: 0.8,
            target_accept_prob: 0.3,
            initial_state: None,
            bounds: None,
            include_emulator_variance: true,
            seed: None,
        }
    }
}

impl SamplerConfig {
    /// Set the transition kernel
    pub fn kernel(mut self, kernel: McmcKernel) -> Self {
        self.kernel = kernel;
        self
    }

    /// Set the number of burn-in transitions
    pub fn num_burnin_steps(mut self, num_burnin_steps: usize) -> Self {
        self.num_burnin_steps = num_burnin_steps;
        self
    }

    /// Set the thinning
    pub fn num_steps_between_results(mut self, num_steps_between_results: usize) -> Self {
        self.num_steps_between_results = num_steps_between_results;
        self
    }

    /// Set the fraction of the burn-in used for step size adaptation
    pub fn adaptation_fraction(mut self, adaptation_fraction: f64) -> Self {
        self.adaptation_fraction = adaptation_fraction;
        self
    }

    /// Set the acceptance probability aimed at by the adaptation
    pub fn target_accept_prob(mut self, target_accept_prob: f64) -> Self {
        self.target_accept_prob = target_accept_prob;
        self
    }

    /// Set the chain start
    pub fn initial_state(mut self, initial_state: Array1<f64>) -> Self {
        self.initial_state = Some(initial_state);
        self
    }

    /// Set the prior bounds
    pub fn bounds(mut self, bounds: Array2<f64>) -> Self {
        self.bounds = Some(bounds);
        self
    }

    /// Set whether the emulator variance adds to the total variance
    pub fn include_emulator_variance(mut self, include: bool) -> Self {
        self.include_emulator_variance = include;
        self
    }

    /// Set the random generator seed
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validate the configuration values
    pub fn check(self) -> Result<ValidSamplerConfig> {
        if !(0. ..=1.).contains(&self.adaptation_fraction) {
            return Err(EmuError::InvalidArgument(format!(
                "adaptation_fraction should be in [0, 1], got {}",
                self.adaptation_fraction
            )));
        }
        if !(self.target_accept_prob > 0. && self.target_accept_prob < 1.) {
            return Err(EmuError::InvalidArgument(format!(
                "target_accept_prob should be in ]0, 1[, got {}",
                self.target_accept_prob
            )));
        }
        let step_size = self.kernel.step_size();
        if !(step_size.is_finite() && step_size > 0.) {
            return Err(EmuError::InvalidArgument(format!(
                "Kernel step size should be positive, got {step_size}"
            )));
        }
        if let Some(bounds) = &self.bounds {
            Uniform::from_bounds(bounds)?;
        }
        Ok(ValidSamplerConfig(self))
    }
}

/// A checked [SamplerConfig]
#[derive(Clone, Debug, PartialEq)]
pub struct ValidSamplerConfig(SamplerConfig);

impl ValidSamplerConfig {
    /// The checked configuration
    pub fn config(&self) -> &SamplerConfig {
        &self.0
    }
}

/// Draws parameters consistent with an observation using a Markov chain
/// targeting [CalibrationTarget].
pub struct Sampler<'a, S: Surrogate + ?Sized> {
    model: &'a S,
    obs: LabeledGrid,
    uncertainties: Uncertainties,
    config: ValidSamplerConfig,
}

impl<'a, S: Surrogate + ?Sized> Sampler<'a, S> {
    /// Sampler of the `model` parameters given the observation `obs` (shaped as one
    /// ensemble member) and its uncertainties
    pub fn new(
        model: &'a S,
        obs: &LabeledGrid,
        uncertainties: Uncertainties,
        config: SamplerConfig,
    ) -> Result<Self> {
        init_logging();
        let config = config.check()?;
        observed_cells(model, obs)?;
        uncertainties.total_variance(&obs.flatten())?;
        if let Some(x0) = &config.config().initial_state {
            if x0.len() != model.n_params() {
                return Err(EmuError::InvalidArgument(format!(
                    "Initial state {x0} does not match {} parameters",
                    model.n_params()
                )));
            }
        }
        Ok(Sampler {
            model,
            obs: obs.clone(),
            uncertainties,
            config,
        })
    }

    /// Target log density of the chain
    pub fn target(&self) -> Result<CalibrationTarget<'a, S>> {
        let config = self.config.config();
        let bounds = config
            .bounds
            .clone()
            .unwrap_or_else(|| self.model.param_bounds());
        CalibrationTarget::new(
            self.model,
            &self.obs,
            &self.uncertainties,
            Uniform::from_bounds(&bounds)?,
            config.include_emulator_variance,
        )
    }

    /// `n_samples` parameter vectors as a (n_samples, d) matrix
    pub fn sample(&self, n_samples: usize) -> Result<Array2<f64>> {
        Ok(self.sample_with_trace(n_samples)?.states)
    }

    /// `n_samples` chain states with their log densities and acceptance flags
    pub fn sample_with_trace(&self, n_samples: usize) -> Result<Trace> {
        let config = self.config.config();
        let target = self.target()?;
        let initial_state = config
            .initial_state
            .clone()
            .unwrap_or_else(|| target.prior().midpoint());

        let num_adaptation_steps =
            (config.adaptation_fraction * config.num_burnin_steps as f64) as usize;
        let adaptation = if num_adaptation_steps > 0 {
            Some(
                SimpleStepSizeAdaptation::new(num_adaptation_steps)
                    .target_accept_prob(config.target_accept_prob),
            )
        } else {
            None
        };
        let params = ChainParams::new(n_samples)
            .num_burnin_steps(config.num_burnin_steps)
            .num_steps_between_results(config.num_steps_between_results)
            .adaptation(adaptation);

        let mut kernel = config.kernel.clone();
        let mut rng = match config.seed {
            Some(seed) => Xoshiro256Plus::seed_from_u64(seed),
            None => Xoshiro256Plus::from_entropy(),
        };
        info!(
            "MCMC sampling of {n_samples} states with {kernel} from {initial_state} ({} burn-in steps)",
            config.num_burnin_steps
        );
        Ok(sample_chain(
            &params,
            &mut kernel,
            &initial_state,
            &target,
            &mut rng,
        )?)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::emulator::tests::{ensemble, simulate};
    use crate::emulator::Emulator;
    use crate::kernel_spec::KernelSpec;
    use crate::sampling::uniform_params;
    use crate::uncertainty::Uncertainty;
    use approx::assert_abs_diff_eq;
    use gpemu_mcmc::{HamiltonianMonteCarlo, RandomWalkMetropolis};
    use ndarray::{array, Array};

    /// Exact model of `a^2 + 2b` with no predictive variance
    pub(crate) struct Polynomial;

    pub(crate) fn polynomial(x: &ArrayView2<f64>) -> Array1<f64> {
        x.rows().into_iter().map(|r| r[0] * r[0] + 2. * r[1]).collect()
    }

    impl Surrogate for Polynomial {
        fn predict_raw(&self, x: &ArrayView2<f64>) -> Result<(Array2<f64>, Array2<f64>)> {
            let mean = polynomial(x).insert_axis(Axis(1));
            let var = Array2::zeros(mean.dim());
            Ok((mean, var))
        }

        fn n_params(&self) -> usize {
            2
        }

        fn n_cells(&self) -> usize {
            1
        }
    }

    fn obs(value: f64) -> LabeledGrid {
        LabeledGrid::new(array![value].into_dyn())
    }

    #[test]
    fn test_calibration_target() {
        let uncertainties = Uncertainties::default().observational(Uncertainty::absolute(1.));
        let prior = Uniform::new(array![0., 0.], array![1., 1.]).unwrap();
        let target =
            CalibrationTarget::new(&Polynomial, &obs(1.5), &uncertainties, prior, true).unwrap();
        // f(0.5, 0.5) = 1.25, one cell at -0.25 sigma
        let expected = -0.5 * 0.25 * 0.25 - 0.5 * (2. * std::f64::consts::PI).ln();
        assert_abs_diff_eq!(
            target.log_prob(&array![0.5, 0.5].view()),
            expected,
            epsilon = 1e-12
        );
        assert_eq!(
            f64::NEG_INFINITY,
            target.log_prob(&array![2., 1.].view())
        );

        let prior = Uniform::new(array![0.], array![1.]).unwrap();
        assert!(CalibrationTarget::new(&Polynomial, &obs(1.5), &uncertainties, prior, true).is_err());
    }

    #[test]
    fn test_sample_polynomial() {
        let uncertainties = Uncertainties::default().observational(Uncertainty::absolute(0.1));
        let sampler = Sampler::new(
            &Polynomial,
            &obs(2.),
            uncertainties,
            SamplerConfig::default().seed(42),
        )
        .unwrap();
        let samples = sampler.sample(100).unwrap();
        assert_eq!((100, 2), samples.dim());
        assert!(samples.iter().all(|v| (0. ..=1.).contains(v)));
        let mean = polynomial(&samples.view()).mean().unwrap();
        assert_abs_diff_eq!(mean, 2., epsilon = 0.2);
    }

    #[test]
    fn test_sample_with_hmc() {
        let uncertainties = Uncertainties::default().observational(Uncertainty::absolute(0.2));
        let config = SamplerConfig::default()
            .kernel(McmcKernel::Hamiltonian(HamiltonianMonteCarlo::new(0.02, 5)))
            .num_burnin_steps(300)
            .target_accept_prob(0.75)
            .seed(0);
        let sampler = Sampler::new(&Polynomial, &obs(1.), uncertainties, config).unwrap();
        let trace = sampler.sample_with_trace(200).unwrap();
        assert_eq!((200, 2), trace.states.dim());
        assert!(trace.acceptance_rate() > 0.3);
        let mean = polynomial(&trace.states.view()).mean().unwrap();
        assert_abs_diff_eq!(mean, 1., epsilon = 0.2);
    }

    #[test]
    fn test_sample_emulator() {
        let params = uniform_params(2, 5);
        let ens = LabeledGrid::new(polynomial(&params.view()).into_dyn());
        let mut emu = Emulator::new(&params, &ens, KernelSpec::default()).unwrap();
        emu.train().unwrap();

        let uncertainties = Uncertainties::default().observational(Uncertainty::absolute(0.1));
        let sampler =
            Sampler::new(&emu, &obs(2.), uncertainties, SamplerConfig::default().seed(42))
                .unwrap();
        let samples = sampler.sample(100).unwrap();
        assert_eq!((100, 2), samples.dim());
        let mean = polynomial(&samples.view()).mean().unwrap();
        assert_abs_diff_eq!(mean, 2., epsilon = 0.2);
    }

    #[test]
    fn test_sample_field_with_relative_uncertainty() {
        let params = uniform_params(2, 5);
        let ens = ensemble(&params);
        let mut emu = Emulator::new(&params, &ens, KernelSpec::default())
            .unwrap()
            .n_start(3);
        emu.train().unwrap();

        // observation one standard deviation away from a training member
        let outputs = simulate(&params);
        let obs_std = outputs.std_axis(Axis(0), 0.);
        let obs_data = &outputs.row(10) + &obs_std;
        let obs = ens
            .member(10)
            .unwrap()
            .copy_with_data(obs_data.clone().into_dyn())
            .unwrap();
        let uncertainties = Uncertainties::default()
            .observational(Uncertainty::Relative(&obs_std / &obs_data))
            .interannual(Uncertainty::absolute(0.));

        let config = SamplerConfig::default().num_burnin_steps(200).seed(1);
        let sampler = Sampler::new(&emu, &obs, uncertainties, config).unwrap();
        let samples = sampler.sample(100).unwrap();
        assert_eq!((100, 2), samples.dim());
    }

    #[test]
    fn test_bad_configs() {
        let u = Uncertainties::default();
        let bad = [
            SamplerConfig::default().adaptation_fraction(1.5),
            SamplerConfig::default().target_accept_prob(1.),
            SamplerConfig::default().kernel(McmcKernel::RandomWalk(RandomWalkMetropolis::new(0.))),
            SamplerConfig::default().bounds(array![[1., 0.], [0., 1.]]),
            SamplerConfig::default().initial_state(array![0.5]),
        ];
        for config in bad {
            assert!(Sampler::new(&Polynomial, &obs(2.), u.clone(), config).is_err());
        }
        assert!(Sampler::new(&Polynomial, &obs(2.), u.clone(), SamplerConfig::default()).is_ok());
        assert!(Sampler::new(
            &Polynomial,
            &LabeledGrid::new(Array::zeros(3).into_dyn()),
            u,
            SamplerConfig::default()
        )
        .is_err());
    }

    #[test]
    fn test_config_json() {
        let config: SamplerConfig = serde_json::from_str(
            r#"{"kernel": {"Hamiltonian": {"step_size": 0.1, "num_leapfrog_steps": 3}},
                "num_burnin_steps": 10, "seed": 3}"#,
        )
        .unwrap();
        assert_eq!(10, config.num_burnin_steps);
        assert_eq!(Some(3), config.seed);
        assert_eq!(0.1, config.kernel.step_size());
        assert!(config.include_emulator_variance);
        let json = serde_json::to_string(&config).unwrap();
        let back: SamplerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}
