use linfa::Float;
use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix2};
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};

/// A structure to store (n, ny) output data whitened column-wise
/// with the mean and standard deviation used to whiten it.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub(crate) struct NormalizedData<F: Float> {
    /// normalized data
    pub data: Array2<F>,
    /// mean vector computed from data
    pub mean: Array1<F>,
    /// standard deviation vector computed from data
    pub std: Array1<F>,
}

impl<F: Float> NormalizedData<F> {
    /// Constructor, requires at least two rows
    pub fn new(y: &ArrayBase<impl Data<Elem = F>, Ix2>) -> NormalizedData<F> {
        let (data, mean, std) = normalize(y);
        NormalizedData { data, mean, std }
    }

    /// Undo whitening of values predicted in normalized space
    pub fn denormalize(&self, y: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array2<F> {
        y * &self.std + &self.mean
    }

    /// Scale latent variances (n,) to each output column (n, ny)
    pub fn denormalize_var(&self, var: &Array1<F>) -> Array2<F> {
        let std2 = self.std.mapv(|v| v * v);
        var.to_owned().insert_axis(Axis(1)) * &std2
    }
}

/// Column-wise whitening with unbiased std, constant columns keep a unit std
pub fn normalize<F: Float>(
    x: &ArrayBase<impl Data<Elem = F>, Ix2>,
) -> (Array2<F>, Array1<F>, Array1<F>) {
    let x_mean = x
        .mean_axis(Axis(0))
        .unwrap_or_else(|| Array1::zeros(x.ncols()));
    let mut x_std = x.std_axis(Axis(0), F::one());
    x_std.mapv_inplace(|v| if v == F::zero() { F::one() } else { v });
    let xnorm = (x - &x_mean) / &x_std;

    (xnorm, x_mean, x_std)
}

/// Returns true when at least two rows of `x` are equal
pub fn has_duplicate_rows<F: Float>(x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> bool {
    let n = x.nrows();
    (0..n).any(|i| ((i + 1)..n).any(|j| x.row(i) == x.row(j)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_normalized_matrix() {
        let y = array![[1., 2., 5.], [3., 4., 5.]];
        let ynorm = NormalizedData::new(&y);
        assert_eq!(array![2., 3., 5.], ynorm.mean);
        assert_eq!(array![f64::sqrt(2.), f64::sqrt(2.), 1.], ynorm.std);
        assert_abs_diff_eq!(ynorm.denormalize(&ynorm.data), y, epsilon = 1e-12);
    }

    #[test]
    fn test_denormalize_var() {
        let y = array![[0., 0.], [2., 4.]];
        let ynorm = NormalizedData::new(&y);
        let var = ynorm.denormalize_var(&array![1., 0.5]);
        assert_abs_diff_eq!(var, array![[2., 8.], [1., 4.]], epsilon = 1e-12);
    }

    #[test]
    fn test_duplicate_rows() {
        assert!(!has_duplicate_rows(&array![[0., 1.], [1., 0.], [1., 1.]]));
        assert!(has_duplicate_rows(&array![[0., 1.], [1., 0.], [0., 1.]]));
    }
}
