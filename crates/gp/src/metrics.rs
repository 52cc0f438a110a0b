//! A module for metrics to evaluate Gaussian Process models performances
//! It implements the Q2 predictive coefficient from the following paper:
//! Marrel, Amandine, and Bertrand Iooss.
//! "Probabilistic surrogate modeling by Gaussian process: A review on recent insights in estimation and validation."
//! Reliability Engineering & System Safety 247 (2024): 110094.

use linfa::dataset::Dataset;
use linfa::{traits::Fit, Float, ParamGuard};
use ndarray::{Array2, Axis};

use crate::{GaussianProcess, GpError, GpParams, Result};

/// A trait for Q2 predictive coefficient cross validation score
pub trait PredictScore<F: Float> {
    /// Return the training data (xt, yt)
    fn training_data(&self) -> &(Array2<F>, Array2<F>);

    /// Return the model parameters
    fn params(&self) -> GpParams<F>;

    /// Compute quality metric Q2 with kfold cross validation,
    /// all outputs being pooled together
    fn q2_score(&self, kfold: usize) -> Result<F> {
        let (xt, yt) = self.training_data();
        if kfold < 2 || kfold > xt.nrows() {
            return Err(GpError::InvalidValueError(format!(
                "Number of folds should be in [2, {}], got {kfold}",
                xt.nrows()
            )));
        }
        let dataset = Dataset::new(xt.to_owned(), yt.to_owned());
        let yt_mean = yt
            .mean_axis(Axis(0))
            .ok_or_else(|| GpError::InvalidValueError("Empty training data".to_string()))?;
        // Predictive Residual Sum of Squares
        let mut press = F::zero();
        // Total Sum of Squares
        let mut tss = F::zero();
        for (train, valid) in dataset.fold(kfold).into_iter() {
            let model: GaussianProcess<F> = self.params().check()?.fit(&train)?;
            let pred = model.predict(valid.records())?;
            press += (valid.targets() - &pred).mapv(|v| v * v).sum();
            tss += (valid.targets() - &yt_mean).mapv(|v| v * v).sum();
        }
        Ok(F::one() - press / tss)
    }

    /// Q2 predictive coefficient with Leave-One-Out Cross-Validation
    fn looq2_score(&self) -> Result<F> {
        self.q2_score(self.training_data().0.nrows())
    }
}

impl<F: Float> PredictScore<F> for GaussianProcess<F> {
    fn training_data(&self) -> &(Array2<F>, Array2<F>) {
        &self.training_data
    }

    fn params(&self) -> GpParams<F> {
        GpParams::from(self.params.clone())
    }
}
