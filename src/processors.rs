//! Reversible transforms of the training outputs.
//!
//! Processors are applied in order to the (n_members, n_cells) training values before
//! fitting and undone in reverse order on predicted means and variances.

use crate::errors::{EmuError, Result};
use ndarray::{Array1, Array2, Axis, Zip};
use ndarray_stats::QuantileExt;
use serde::{Deserialize, Serialize};

/// A reversible transform of the training outputs
pub trait DataProcessor: std::fmt::Debug + Send + Sync {
    /// Transform the training values, fitting any internal state
    fn process(&mut self, data: &Array2<f64>) -> Result<Array2<f64>>;

    /// Map predicted (mean, variance) back to the original space
    fn unprocess(&self, mean: Array2<f64>, var: Array2<f64>) -> (Array2<f64>, Array2<f64>);
}

/// `ln(x + constant)` transform for positive skewed data.
///
/// Predictions are mapped back assuming a log-normal distribution.
#[derive(Clone, Debug, PartialEq)]
pub struct Log {
    constant: f64,
}

impl Log {
    /// Constructor given the offset added before taking the log
    pub fn new(constant: f64) -> Self {
        Log { constant }
    }
}

impl Default for Log {
    fn default() -> Self {
        Log { constant: 0. }
    }
}

impl DataProcessor for Log {
    fn process(&mut self, data: &Array2<f64>) -> Result<Array2<f64>> {
        if data.iter().any(|v| v + self.constant <= 0.) {
            return Err(EmuError::InvalidArgument(format!(
                "Log transform requires data > {}",
                -self.constant
            )));
        }
        Ok(data.mapv(|v| (v + self.constant).ln()))
    }

    fn unprocess(&self, mean: Array2<f64>, var: Array2<f64>) -> (Array2<f64>, Array2<f64>) {
        let mut new_mean = Array2::zeros(mean.dim());
        let mut new_var = Array2::zeros(var.dim());
        Zip::from(&mut new_mean)
            .and(&mut new_var)
            .and(&mean)
            .and(&var)
            .for_each(|nm, nv, m, v| {
                *nm = (m + 0.5 * v).exp() - self.constant;
                *nv = v.exp_m1() * (2. * m + v).exp();
            });
        (new_mean, new_var)
    }
}

/// Per cell min/max scaling to `[0, 1]`
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Normalise {
    min: Option<Array1<f64>>,
    range: Option<Array1<f64>>,
}

impl Normalise {
    /// Unfitted normalisation
    pub fn new() -> Self {
        Self::default()
    }
}

impl DataProcessor for Normalise {
    fn process(&mut self, data: &Array2<f64>) -> Result<Array2<f64>> {
        let mut min = Array1::zeros(data.ncols());
        let mut range = Array1::ones(data.ncols());
        for (j, col) in data.axis_iter(Axis(1)).enumerate() {
            let lo = *col
                .min()
                .map_err(|e| EmuError::InvalidArgument(format!("Cannot normalise: {e}")))?;
            let hi = *col
                .max()
                .map_err(|e| EmuError::InvalidArgument(format!("Cannot normalise: {e}")))?;
            min[j] = lo;
            // constant cells are only shifted
            if hi > lo {
                range[j] = hi - lo;
            }
        }
        let res = (data - &min) / &range;
        self.min = Some(min);
        self.range = Some(range);
        Ok(res)
    }

    fn unprocess(&self, mean: Array2<f64>, var: Array2<f64>) -> (Array2<f64>, Array2<f64>) {
        match (&self.min, &self.range) {
            (Some(min), Some(range)) => (mean * range + min, var * &range.mapv(|r| r * r)),
            _ => (mean, var),
        }
    }
}

/// Serializable choice of processor
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ProcessorSpec {
    /// See [Log]
    Log {
        /// Offset added before taking the log
        constant: f64,
    },
    /// See [Normalise]
    Normalise,
}

impl ProcessorSpec {
    /// Instantiate the processor
    pub fn build(&self) -> Box<dyn DataProcessor> {
        match self {
            ProcessorSpec::Log { constant } => Box::new(Log::new(*constant)),
            ProcessorSpec::Normalise => Box::new(Normalise::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_log_processor() {
        let data = array![[1., 10.], [2., 100.]];
        let mut log = Log::new(1.);
        let processed = log.process(&data).unwrap();
        assert_abs_diff_eq!(processed[[1, 1]], 101f64.ln(), epsilon = 1e-12);

        // zero variance gives back the transformed value
        let (mean, var) = log.unprocess(processed, Array2::zeros((2, 2)));
        assert_abs_diff_eq!(mean, data, epsilon = 1e-9);
        assert_abs_diff_eq!(var, Array2::zeros((2, 2)), epsilon = 1e-12);

        let (_, var) = log.unprocess(array![[0.]], array![[1.]]);
        assert_abs_diff_eq!(var[[0, 0]], (1f64.exp() - 1.) * 1f64.exp(), epsilon = 1e-12);

        assert!(Log::default().process(&array![[0.]]).is_err());
    }

    #[test]
    fn test_normalise_processor() {
        let data = array![[1., 5.], [3., 5.], [2., 5.]];
        let mut norm = Normalise::new();
        let processed = norm.process(&data).unwrap();
        assert_abs_diff_eq!(
            processed,
            array![[0., 0.], [1., 0.], [0.5, 0.]],
            epsilon = 1e-12
        );
        let (mean, var) = norm.unprocess(processed, array![[1., 1.], [1., 1.], [1., 1.]]);
        assert_abs_diff_eq!(mean, data, epsilon = 1e-12);
        assert_abs_diff_eq!(var.row(0).to_owned(), array![4., 1.], epsilon = 1e-12);
    }

    #[test]
    fn test_processor_spec() {
        let spec: ProcessorSpec = serde_json::from_str(r#"{"Log":{"constant":1.0}}"#).unwrap();
        assert_eq!(ProcessorSpec::Log { constant: 1. }, spec);
        let mut p = ProcessorSpec::Normalise.build();
        assert!(p.process(&array![[1.], [2.]]).is_ok());
    }
}
