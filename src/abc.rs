//! Approximate Bayesian computation by rejection of implausible parameters.

use crate::errors::{EmuError, Result};
use crate::grid::LabeledGrid;
use crate::implausibility::{constrain, implausibility, observed_cells};
use crate::sampler::init_logging;
use crate::surrogate::Surrogate;
use crate::uncertainty::Uncertainties;

use gpemu_doe::{RandomUniform, SamplingMethod};
use gpemu_mcmc::Uniform;
use log::info;
use ndarray::{Array2, Axis};
use ndarray_rand::rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;

/// Default number of parameter rows evaluated at once
pub const ABC_BATCH_SIZE: usize = 1000;

/// Accepted parameters of a rejection sampling
#[derive(Clone, Debug)]
pub struct AbcResult {
    /// (n_accepted, d) plausible parameters
    pub samples: Array2<f64>,
    /// Number of drawn parameters
    pub n_drawn: usize,
}

impl AbcResult {
    /// Number of accepted parameters
    pub fn n_accepted(&self) -> usize {
        self.samples.nrows()
    }

    /// Ratio of accepted parameters
    pub fn acceptance_rate(&self) -> f64 {
        if self.n_drawn == 0 {
            0.
        } else {
            self.n_accepted() as f64 / self.n_drawn as f64
        }
    }
}

/// Rejection sampler keeping uniformly drawn parameters whose implausibility
/// against the observation is low enough.
pub struct AbcSampler<'a, S: Surrogate + ?Sized> {
    model: &'a S,
    obs: LabeledGrid,
    uncertainties: Uncertainties,
    bounds: Array2<f64>,
    include_emulator_variance: bool,
    batch_size: usize,
    seed: u64,
}

impl<'a, S: Surrogate + ?Sized> AbcSampler<'a, S> {
    /// Sampler drawing within the model parameter bounds
    pub fn new(model: &'a S, obs: &LabeledGrid, uncertainties: Uncertainties) -> Result<Self> {
        init_logging();
        observed_cells(model, obs)?;
        uncertainties.total_variance(&obs.flatten())?;
        Ok(AbcSampler {
            model,
            obs: obs.clone(),
            uncertainties,
            bounds: model.param_bounds(),
            include_emulator_variance: true,
            batch_size: ABC_BATCH_SIZE,
            seed: 42,
        })
    }

    /// Set the (d, 2) bounds of the drawn parameters
    pub fn bounds(mut self, bounds: Array2<f64>) -> Result<Self> {
        Uniform::from_bounds(&bounds)?;
        if bounds.nrows() != self.model.n_params() {
            return Err(EmuError::InvalidArgument(format!(
                "Expected bounds for {} parameters, got {}",
                self.model.n_params(),
                bounds.nrows()
            )));
        }
        self.bounds = bounds;
        Ok(self)
    }

    /// Set whether the emulator variance adds to the total variance
    pub fn include_emulator_variance(mut self, include: bool) -> Self {
        self.include_emulator_variance = include;
        self
    }

    /// Set the number of parameters evaluated at once
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Set the random generator seed
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Draw `n_samples` parameters and keep those for which the fraction of cells with an
    /// implausibility above `threshold` is at most `tolerance`
    pub fn sample(&self, n_samples: usize, threshold: f64, tolerance: f64) -> Result<AbcResult> {
        let drawn = RandomUniform::new(&self.bounds)
            .with_rng(Xoshiro256Plus::seed_from_u64(self.seed))
            .sample(n_samples);
        let mut accepted: Vec<usize> = Vec::new();
        for (b, batch) in drawn
            .axis_chunks_iter(Axis(0), self.batch_size)
            .enumerate()
        {
            let imp = implausibility(
                self.model,
                &self.obs,
                &batch,
                &self.uncertainties,
                self.include_emulator_variance,
            )?;
            accepted.extend(
                constrain(&imp, threshold, tolerance)
                    .iter()
                    .enumerate()
                    .filter(|(_, ok)| **ok)
                    .map(|(i, _)| b * self.batch_size + i),
            );
        }
        let result = AbcResult {
            samples: drawn.select(Axis(0), &accepted),
            n_drawn: n_samples,
        };
        info!(
            "ABC sampling accepted {} / {} parameters",
            result.n_accepted(),
            n_samples
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::tests::{polynomial, Polynomial};
    use crate::uncertainty::Uncertainty;
    use ndarray::array;

    #[test]
    fn test_abc_polynomial() {
        let obs = LabeledGrid::new(array![2.].into_dyn());
        let uncertainties = Uncertainties::default().observational(Uncertainty::absolute(0.1));
        let abc = AbcSampler::new(&Polynomial, &obs, uncertainties)
            .unwrap()
            .batch_size(128);
        let res = abc.sample(2000, 3., 0.).unwrap();
        assert_eq!(2000, res.n_drawn);
        assert!(res.n_accepted() > 0 && res.n_accepted() < 2000);
        assert!(polynomial(&res.samples.view())
            .iter()
            .all(|f| (f - 2.).abs() <= 0.3 + 1e-12));
        assert!(res.acceptance_rate() < 1.);
    }

    #[test]
    fn test_abc_bad_bounds() {
        let obs = LabeledGrid::new(array![2.].into_dyn());
        let abc = AbcSampler::new(&Polynomial, &obs, Uncertainties::default()).unwrap();
        assert!(abc.bounds(array![[0., 1.]]).is_err());
    }
}
