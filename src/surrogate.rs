use crate::errors::Result;
use ndarray::{Array2, ArrayView2};

/// A trained model predicting flattened output fields with their variance
pub trait Surrogate {
    /// Predicted (mean, variance) both of shape (n_samples, n_cells)
    /// at the (n_samples, n_params) parameters `x`
    fn predict_raw(&self, x: &ArrayView2<f64>) -> Result<(Array2<f64>, Array2<f64>)>;

    /// Number of input parameters
    fn n_params(&self) -> usize;

    /// Number of output cells
    fn n_cells(&self) -> usize;

    /// (n_params, 2) bounds of the parameter space, `[0, 1]` for each parameter by default
    fn param_bounds(&self) -> Array2<f64> {
        let mut bounds = Array2::zeros((self.n_params(), 2));
        bounds.column_mut(1).fill(1.);
        bounds
    }
}
