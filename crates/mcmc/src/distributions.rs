//! Log densities the chains sample from.

use crate::errors::{McmcError, Result};
use finitediff::FiniteDiff;
use ndarray::{Array1, Array2, ArrayBase, ArrayView1, Axis, Data, Ix2, Zip};

#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};

/// `ln(2π)`
pub const LN_2PI: f64 = 1.837_877_066_409_345_3;

/// An unnormalized log density over `dim()`-dimensional states.
///
/// Returning `-inf` means the state has zero probability, a `NaN` value is
/// considered as a rejection by the transition kernels.
pub trait LogDensity {
    /// Dimension of the states
    fn dim(&self) -> usize;

    /// Log density value at `x`
    fn log_prob(&self, x: &ArrayView1<f64>) -> f64;

    /// Log density values of the (n, dim) states given as rows of `x`
    fn log_prob_batch(&self, x: &ArrayBase<impl Data<Elem = f64>, Ix2>) -> Array1<f64>
    where
        Self: Sized,
    {
        let mut res = Array1::zeros(x.nrows());
        Zip::from(&mut res)
            .and(x.rows())
            .for_each(|r, xi| *r = self.log_prob(&xi));
        res
    }

    /// Gradient of the log density at `x`, by default computed with central finite differences
    fn grad_log_prob(&self, x: &ArrayView1<f64>) -> Array1<f64> {
        let f = |x: &Vec<f64>| -> f64 { self.log_prob(&ArrayView1::from(x)) };
        Array1::from(x.to_vec().central_diff(&f))
    }
}

impl<T: LogDensity + ?Sized> LogDensity for &T {
    fn dim(&self) -> usize {
        (**self).dim()
    }

    fn log_prob(&self, x: &ArrayView1<f64>) -> f64 {
        (**self).log_prob(x)
    }

    fn grad_log_prob(&self, x: &ArrayView1<f64>) -> Array1<f64> {
        (**self).grad_log_prob(x)
    }
}

/// Log density of the standard normal distribution at `z`
#[inline]
pub fn standard_normal_log_pdf(z: f64) -> f64 {
    -0.5 * z * z - 0.5 * LN_2PI
}

/// Independent uniform distributions over the closed box `[low, high]`
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct Uniform {
    low: Array1<f64>,
    high: Array1<f64>,
}

impl Uniform {
    /// Constructor, `low` and `high` must have the same length
    /// with finite `low < high` components.
    pub fn new(low: Array1<f64>, high: Array1<f64>) -> Result<Self> {
        if low.len() != high.len() {
            return Err(McmcError::DimensionError {
                expected: low.len(),
                got: high.len(),
            });
        }
        if low.is_empty() {
            return Err(McmcError::InvalidValueError(
                "Uniform distribution needs at least one dimension".to_string(),
            ));
        }
        let ok = Zip::from(&low)
            .and(&high)
            .fold(true, |acc, l, h| acc && l.is_finite() && h.is_finite() && l < h);
        if !ok {
            return Err(McmcError::InvalidValueError(format!(
                "Uniform bounds should be finite with low < high, got low={low}, high={high}"
            )));
        }
        Ok(Uniform { low, high })
    }

    /// Constructor from (dim, 2) bounds `[[low_1, high_1], ..., [low_d, high_d]]`
    pub fn from_bounds(bounds: &ArrayBase<impl Data<Elem = f64>, Ix2>) -> Result<Self> {
        if bounds.ncols() != 2 {
            return Err(McmcError::DimensionError {
                expected: 2,
                got: bounds.ncols(),
            });
        }
        Self::new(
            bounds.index_axis(Axis(1), 0).to_owned(),
            bounds.index_axis(Axis(1), 1).to_owned(),
        )
    }

    /// Lower bounds
    pub fn low(&self) -> &Array1<f64> {
        &self.low
    }

    /// Upper bounds
    pub fn high(&self) -> &Array1<f64> {
        &self.high
    }

    /// Center of the box
    pub fn midpoint(&self) -> Array1<f64> {
        (&self.low + &self.high) / 2.
    }

    /// (dim, 2) bounds
    pub fn bounds(&self) -> Array2<f64> {
        let mut b = Array2::zeros((self.low.len(), 2));
        b.column_mut(0).assign(&self.low);
        b.column_mut(1).assign(&self.high);
        b
    }

    /// Whether `x` lies within the closed box
    pub fn contains(&self, x: &ArrayView1<f64>) -> bool {
        x.len() == self.low.len()
            && Zip::from(x)
                .and(&self.low)
                .and(&self.high)
                .fold(true, |acc, v, l, h| acc && *l <= *v && *v <= *h)
    }
}

impl LogDensity for Uniform {
    fn dim(&self) -> usize {
        self.low.len()
    }

    fn log_prob(&self, x: &ArrayView1<f64>) -> f64 {
        if x.iter().any(|v| v.is_nan()) {
            f64::NAN
        } else if self.contains(x) {
            -Zip::from(&self.low)
                .and(&self.high)
                .fold(0., |acc, l, h| acc + (h - l).ln())
        } else {
            f64::NEG_INFINITY
        }
    }

    fn grad_log_prob(&self, x: &ArrayView1<f64>) -> Array1<f64> {
        Array1::zeros(x.len())
    }
}

/// Independent normal distributions
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct Normal {
    loc: Array1<f64>,
    scale: Array1<f64>,
}

impl Normal {
    /// Constructor, scales have to be positive
    pub fn new(loc: Array1<f64>, scale: Array1<f64>) -> Result<Self> {
        if loc.len() != scale.len() {
            return Err(McmcError::DimensionError {
                expected: loc.len(),
                got: scale.len(),
            });
        }
        if scale.iter().any(|s| !s.is_finite() || *s <= 0.) {
            return Err(McmcError::InvalidValueError(format!(
                "Normal scales should be positive, got {scale}"
            )));
        }
        Ok(Normal { loc, scale })
    }

    /// Means
    pub fn loc(&self) -> &Array1<f64> {
        &self.loc
    }

    /// Standard deviations
    pub fn scale(&self) -> &Array1<f64> {
        &self.scale
    }
}

impl LogDensity for Normal {
    fn dim(&self) -> usize {
        self.loc.len()
    }

    fn log_prob(&self, x: &ArrayView1<f64>) -> f64 {
        Zip::from(x)
            .and(&self.loc)
            .and(&self.scale)
            .fold(0., |acc, v, m, s| {
                acc + standard_normal_log_pdf((v - m) / s) - s.ln()
            })
    }

    fn grad_log_prob(&self, x: &ArrayView1<f64>) -> Array1<f64> {
        let mut g = Array1::zeros(x.len());
        Zip::from(&mut g)
            .and(x)
            .and(&self.loc)
            .and(&self.scale)
            .for_each(|g, v, m, s| *g = -(v - m) / (s * s));
        g
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_uniform_closed_box() {
        let prior = Uniform::new(array![0., 0.], array![1., 1.]).unwrap();
        assert_eq!(0., prior.log_prob(&array![0.5, 0.5].view()));
        assert_eq!(0., prior.log_prob(&array![1., 1.].view()));
        assert_eq!(0., prior.log_prob(&array![0., 1.].view()));
        assert_eq!(f64::NEG_INFINITY, prior.log_prob(&array![2., 1.].view()));
        assert_eq!(f64::NEG_INFINITY, prior.log_prob(&array![0.5, -1e-9].view()));
        assert!(prior.log_prob(&array![f64::NAN, 0.5].view()).is_nan());
        assert_eq!(array![0.5, 0.5], prior.midpoint());
    }

    #[test]
    fn test_uniform_density_value() {
        let prior = Uniform::from_bounds(&array![[0., 2.], [-1., 1.], [0., 0.5]]).unwrap();
        assert_eq!(3, prior.dim());
        assert_abs_diff_eq!(
            prior.log_prob(&array![1., 0., 0.25].view()),
            -(2. * 2. * 0.5f64).ln(),
            epsilon = 1e-12
        );
        let lp = prior.log_prob_batch(&array![[1., 0., 0.25], [3., 0., 0.]]);
        assert_eq!(f64::NEG_INFINITY, lp[1]);
    }

    #[test]
    fn test_uniform_bad_bounds() {
        assert!(matches!(
            Uniform::new(array![0.], array![1., 2.]),
            Err(McmcError::DimensionError { .. })
        ));
        assert!(matches!(
            Uniform::new(array![1.], array![1.]),
            Err(McmcError::InvalidValueError(_))
        ));
        assert!(Uniform::from_bounds(&array![[0., 1., 2.]]).is_err());
    }

    #[test]
    fn test_normal_log_prob() {
        let normal = Normal::new(array![0.], array![1.]).unwrap();
        assert_abs_diff_eq!(
            normal.log_prob(&array![0.].view()),
            (1. / (2. * std::f64::consts::PI).sqrt()).ln(),
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(
            normal.log_prob(&array![1.].view()),
            ((-0.5f64).exp() / (2. * std::f64::consts::PI).sqrt()).ln(),
            epsilon = 1e-12
        );
        assert!(Normal::new(array![0.], array![0.]).is_err());
    }

    #[test]
    fn test_finite_diff_gradient() {
        struct Quadratic;
        impl LogDensity for Quadratic {
            fn dim(&self) -> usize {
                2
            }
            fn log_prob(&self, x: &ArrayView1<f64>) -> f64 {
                -(x[0] * x[0] + 3. * x[1] * x[1])
            }
        }
        let g = Quadratic.grad_log_prob(&array![1., -2.].view());
        assert_abs_diff_eq!(g, array![-2., 12.], epsilon = 1e-5);

        let normal = Normal::new(array![1., 2.], array![0.5, 2.]).unwrap();
        let x = array![0., 0.];
        let f = |x: &Vec<f64>| -> f64 { normal.log_prob(&ArrayView1::from(x)) };
        let expected = Array1::from(x.to_vec().central_diff(&f));
        assert_abs_diff_eq!(normal.grad_log_prob(&x.view()), expected, epsilon = 1e-5);
    }
}
