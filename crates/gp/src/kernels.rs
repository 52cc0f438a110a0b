//! A module for covariance functions (kernels) used as GP priors.
//!
//! The following primitive kernels are implemented:
//! * bias (constant),
//! * linear and polynomial dot product kernels with one variance per input dimension,
//! * stationary kernels with one lengthscale per input dimension: squared exponential (RBF),
//!   exponential, matern 1/2, matern 3/2, matern 5/2 and cosine,
//! * rational quadratic,
//! * white noise.
//!
//! Kernels are combined with `+` and `*` into a [Kernel] expression:
//!
//! ```
//! use gpemu_gp::kernels::{Kernel, StationaryKind};
//! use ndarray::array;
//!
//! let k: Kernel<f64> = Kernel::stationary(StationaryKind::SquaredExponential, 1.0, array![0.5, 0.5])
//!     + Kernel::linear(array![1.0, 1.0]);
//! assert_eq!(k.to_string(), "RBF + Linear");
//! ```

use linfa::Float;
use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix2};
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul};

/// Bounds of variance hyperparameters
pub const VARIANCE_BOUNDS: (f64, f64) = (1e-6, 1e3);
/// Bounds of lengthscale hyperparameters
pub const LENGTHSCALE_BOUNDS: (f64, f64) = (1e-2, 1e2);
/// Bounds of shape hyperparameters (polynomial offset, rational quadratic alpha)
pub const SHAPE_BOUNDS: (f64, f64) = (1e-3, 1e2);

/// A trait for covariance functions `k(x, x')` usable in GP regression.
///
/// Hyperparameters are all positive reals, exposed as a flat vector so that
/// they can be optimized in log space.
pub trait Covariance<F: Float>: Clone + fmt::Display + Send + Sync {
    /// Covariance between each row of `x` (n, nx) and each row of `y` (m, nx)
    /// as a (n, m) matrix.
    fn cross(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
        y: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Array2<F>;

    /// Covariance matrix of the points `x` with themselves.
    /// Differs from `cross(x, x)` for kernels adding independent noise.
    fn gram(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array2<F> {
        self.cross(x, x)
    }

    /// Diagonal of the gram matrix
    fn diag(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array1<F>;

    /// Input dimensions implied by the per-dimension hyperparameters,
    /// empty when the kernel accepts any number of input components
    fn input_dims(&self) -> Vec<usize> {
        vec![]
    }

    /// Whether points with `dim` components can be fed to the kernel
    fn accepts_dim(&self, dim: usize) -> bool {
        self.input_dims().iter().all(|d| *d == dim)
    }

    /// Current hyperparameter values
    fn hyperparameters(&self) -> Vec<F>;

    /// Set hyperparameters from a slice ordered as [`Covariance::hyperparameters`]
    fn set_hyperparameters(&mut self, values: &[F]);

    /// Admissible (lower, upper) interval of each hyperparameter
    fn hyperparameter_bounds(&self) -> Vec<(F, F)>;

    /// Number of hyperparameters
    fn n_hyperparameters(&self) -> usize {
        self.hyperparameters().len()
    }
}

fn bounds<F: Float>(b: (f64, f64), n: usize) -> Vec<(F, F)> {
    vec![(F::cast(b.0), F::cast(b.1)); n]
}

/// Squared euclidean distances between rows of `x` and `y` scaled by `lengthscales`
fn scaled_sqdist<F: Float>(
    x: &ArrayBase<impl Data<Elem = F>, Ix2>,
    y: &ArrayBase<impl Data<Elem = F>, Ix2>,
    lengthscales: &Array1<F>,
) -> Array2<F> {
    let xs = x / lengthscales;
    let ys = y / lengthscales;
    let xx = xs.map_axis(Axis(1), |r| r.dot(&r));
    let yy = ys.map_axis(Axis(1), |r| r.dot(&r));
    let mut r2 = xs.dot(&ys.t()).mapv(|v| F::cast(-2.) * v);
    r2 += &xx.insert_axis(Axis(1));
    r2 += &yy.insert_axis(Axis(0));
    // rounding may give tiny negative values
    r2.mapv(|v| if v < F::zero() { F::zero() } else { v })
}

/// Constant covariance `k(x, x') = variance`
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct Bias<F: Float> {
    /// Kernel variance
    pub variance: F,
}

impl<F: Float> Default for Bias<F> {
    fn default() -> Self {
        Bias {
            variance: F::one(),
        }
    }
}

impl<F: Float> Covariance<F> for Bias<F> {
    fn cross(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
        y: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Array2<F> {
        Array2::from_elem((x.nrows(), y.nrows()), self.variance)
    }

    fn diag(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array1<F> {
        Array1::from_elem(x.nrows(), self.variance)
    }

    fn hyperparameters(&self) -> Vec<F> {
        vec![self.variance]
    }

    fn set_hyperparameters(&mut self, values: &[F]) {
        self.variance = values[0];
    }

    fn hyperparameter_bounds(&self) -> Vec<(F, F)> {
        bounds(VARIANCE_BOUNDS, 1)
    }
}

impl<F: Float> fmt::Display for Bias<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Bias")
    }
}

/// Linear covariance `k(x, x') = sum_j variance_j * x_j * x'_j`
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct Linear<F: Float> {
    /// One variance per input dimension
    pub variances: Array1<F>,
}

impl<F: Float> Linear<F> {
    fn dot(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
        y: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Array2<F> {
        (x * &self.variances).dot(&y.t())
    }

    fn dot_diag(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array1<F> {
        (x.mapv(|v| v * v) * &self.variances).sum_axis(Axis(1))
    }
}

impl<F: Float> Covariance<F> for Linear<F> {
    fn cross(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
        y: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Array2<F> {
        self.dot(x, y)
    }

    fn input_dims(&self) -> Vec<usize> {
        vec![self.variances.len()]
    }

    fn diag(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array1<F> {
        self.dot_diag(x)
    }

    fn hyperparameters(&self) -> Vec<F> {
        self.variances.to_vec()
    }

    fn set_hyperparameters(&mut self, values: &[F]) {
        self.variances = Array1::from_vec(values.to_vec());
    }

    fn hyperparameter_bounds(&self) -> Vec<(F, F)> {
        bounds(VARIANCE_BOUNDS, self.variances.len())
    }
}

impl<F: Float> fmt::Display for Linear<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Linear")
    }
}

/// Polynomial covariance `k(x, x') = (sum_j variance_j * x_j * x'_j + offset)^degree`
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct Polynomial<F: Float> {
    /// Linear part
    pub linear: Linear<F>,
    /// Constant added before exponentiation
    pub offset: F,
    /// Polynomial degree, not tuned
    pub degree: i32,
}

impl<F: Float> Covariance<F> for Polynomial<F> {
    fn cross(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
        y: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Array2<F> {
        self.linear
            .dot(x, y)
            .mapv(|v| (v + self.offset).powi(self.degree))
    }

    fn input_dims(&self) -> Vec<usize> {
        self.linear.input_dims()
    }

    fn diag(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array1<F> {
        self.linear
            .dot_diag(x)
            .mapv(|v| (v + self.offset).powi(self.degree))
    }

    fn hyperparameters(&self) -> Vec<F> {
        let mut params = self.linear.hyperparameters();
        params.push(self.offset);
        params
    }

    fn set_hyperparameters(&mut self, values: &[F]) {
        let n = self.linear.variances.len();
        self.linear.set_hyperparameters(&values[..n]);
        self.offset = values[n];
    }

    fn hyperparameter_bounds(&self) -> Vec<(F, F)> {
        let mut b = self.linear.hyperparameter_bounds();
        b.extend(bounds::<F>(SHAPE_BOUNDS, 1));
        b
    }
}

impl<F: Float> fmt::Display for Polynomial<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Polynomial(degree={})", self.degree)
    }
}

/// Profile of a stationary kernel as a function of the scaled distance `r`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub enum StationaryKind {
    /// `exp(-r^2 / 2)`
    SquaredExponential,
    /// `exp(-r / 2)`
    Exponential,
    /// `exp(-r)`
    Matern12,
    /// `(1 + sqrt(3) r) exp(-sqrt(3) r)`
    Matern32,
    /// `(1 + sqrt(5) r + 5/3 r^2) exp(-sqrt(5) r)`
    Matern52,
    /// `cos(2 pi sum_j (x_j - x'_j) / l_j)`
    Cosine,
}

impl StationaryKind {
    fn profile<F: Float>(&self, r2: F) -> F {
        match self {
            StationaryKind::SquaredExponential => F::exp(F::cast(-0.5) * r2),
            StationaryKind::Exponential => F::exp(F::cast(-0.5) * r2.sqrt()),
            StationaryKind::Matern12 => F::exp(-r2.sqrt()),
            StationaryKind::Matern32 => {
                let sr = F::cast(3.).sqrt() * r2.sqrt();
                (F::one() + sr) * F::exp(-sr)
            }
            StationaryKind::Matern52 => {
                let sr = F::cast(5.).sqrt() * r2.sqrt();
                (F::one() + sr + F::cast(5. / 3.) * r2) * F::exp(-sr)
            }
            // computed from signed distances, see Stationary::cross
            StationaryKind::Cosine => F::one(),
        }
    }
}

impl fmt::Display for StationaryKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            StationaryKind::SquaredExponential => "RBF",
            StationaryKind::Exponential => "Exponential",
            StationaryKind::Matern12 => "Matern12",
            StationaryKind::Matern32 => "Matern32",
            StationaryKind::Matern52 => "Matern52",
            StationaryKind::Cosine => "Cosine",
        };
        write!(f, "{s}")
    }
}

/// Stationary covariance `k(x, x') = variance * profile(|x - x'| / lengthscales)`
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct Stationary<F: Float> {
    /// Profile of the kernel
    pub kind: StationaryKind,
    /// Kernel variance
    pub variance: F,
    /// One lengthscale per input dimension
    pub lengthscales: Array1<F>,
}

impl<F: Float> Covariance<F> for Stationary<F> {
    fn cross(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
        y: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Array2<F> {
        if self.kind == StationaryKind::Cosine {
            let two_pi = F::cast(2. * std::f64::consts::PI);
            let sx = (x / &self.lengthscales).sum_axis(Axis(1));
            let sy = (y / &self.lengthscales).sum_axis(Axis(1));
            return Array2::from_shape_fn((x.nrows(), y.nrows()), |(i, j)| {
                self.variance * F::cos(two_pi * (sx[i] - sy[j]))
            });
        }
        scaled_sqdist(x, y, &self.lengthscales).mapv(|r2| self.variance * self.kind.profile(r2))
    }

    fn input_dims(&self) -> Vec<usize> {
        vec![self.lengthscales.len()]
    }

    fn diag(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array1<F> {
        Array1::from_elem(x.nrows(), self.variance)
    }

    fn hyperparameters(&self) -> Vec<F> {
        let mut params = vec![self.variance];
        params.extend(self.lengthscales.iter().copied());
        params
    }

    fn set_hyperparameters(&mut self, values: &[F]) {
        self.variance = values[0];
        self.lengthscales = Array1::from_vec(values[1..].to_vec());
    }

    fn hyperparameter_bounds(&self) -> Vec<(F, F)> {
        let mut b = bounds(VARIANCE_BOUNDS, 1);
        b.extend(bounds::<F>(LENGTHSCALE_BOUNDS, self.lengthscales.len()));
        b
    }
}

impl<F: Float> fmt::Display for Stationary<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

/// Rational quadratic covariance `k(x, x') = variance * (1 + r^2 / (2 alpha))^(-alpha)`
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct RationalQuadratic<F: Float> {
    /// Kernel variance
    pub variance: F,
    /// One lengthscale per input dimension
    pub lengthscales: Array1<F>,
    /// Scale mixture parameter
    pub alpha: F,
}

impl<F: Float> Covariance<F> for RationalQuadratic<F> {
    fn cross(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
        y: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Array2<F> {
        let two = F::cast(2.);
        scaled_sqdist(x, y, &self.lengthscales)
            .mapv(|r2| self.variance * (F::one() + r2 / (two * self.alpha)).powf(-self.alpha))
    }

    fn input_dims(&self) -> Vec<usize> {
        vec![self.lengthscales.len()]
    }

    fn diag(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array1<F> {
        Array1::from_elem(x.nrows(), self.variance)
    }

    fn hyperparameters(&self) -> Vec<F> {
        let mut params = vec![self.variance];
        params.extend(self.lengthscales.iter().copied());
        params.push(self.alpha);
        params
    }

    fn set_hyperparameters(&mut self, values: &[F]) {
        let n = values.len();
        self.variance = values[0];
        self.lengthscales = Array1::from_vec(values[1..n - 1].to_vec());
        self.alpha = values[n - 1];
    }

    fn hyperparameter_bounds(&self) -> Vec<(F, F)> {
        let mut b = bounds(VARIANCE_BOUNDS, 1);
        b.extend(bounds::<F>(LENGTHSCALE_BOUNDS, self.lengthscales.len()));
        b.extend(bounds::<F>(SHAPE_BOUNDS, 1));
        b
    }
}

impl<F: Float> fmt::Display for RationalQuadratic<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "RationalQuadratic")
    }
}

/// White noise: `variance` on the diagonal of the gram matrix, zero elsewhere
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct White<F: Float> {
    /// Noise variance
    pub variance: F,
}

impl<F: Float> Covariance<F> for White<F> {
    fn cross(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
        y: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Array2<F> {
        Array2::zeros((x.nrows(), y.nrows()))
    }

    fn gram(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array2<F> {
        Array2::eye(x.nrows()).mapv(|v: F| v * self.variance)
    }

    fn diag(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array1<F> {
        Array1::from_elem(x.nrows(), self.variance)
    }

    fn hyperparameters(&self) -> Vec<F> {
        vec![self.variance]
    }

    fn set_hyperparameters(&mut self, values: &[F]) {
        self.variance = values[0];
    }

    fn hyperparameter_bounds(&self) -> Vec<(F, F)> {
        bounds(VARIANCE_BOUNDS, 1)
    }
}

impl<F: Float> fmt::Display for White<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "White")
    }
}

/// A covariance expression: a primitive kernel or a sum/product of kernels
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub enum Kernel<F: Float> {
    /// Constant kernel
    Bias(Bias<F>),
    /// Linear kernel
    Linear(Linear<F>),
    /// Polynomial kernel
    Polynomial(Polynomial<F>),
    /// Stationary kernel
    Stationary(Stationary<F>),
    /// Rational quadratic kernel
    RationalQuadratic(RationalQuadratic<F>),
    /// White noise kernel
    White(White<F>),
    /// Sum of kernels
    Sum(Vec<Kernel<F>>),
    /// Product of kernels
    Product(Vec<Kernel<F>>),
}

impl<F: Float> Kernel<F> {
    /// Constant kernel with unit variance
    pub fn bias() -> Self {
        Kernel::Bias(Bias::default())
    }

    /// Linear kernel given one variance per input dimension
    pub fn linear(variances: Array1<F>) -> Self {
        Kernel::Linear(Linear { variances })
    }

    /// Polynomial kernel given one variance per input dimension, offset and degree
    pub fn polynomial(variances: Array1<F>, offset: F, degree: i32) -> Self {
        Kernel::Polynomial(Polynomial {
            linear: Linear { variances },
            offset,
            degree,
        })
    }

    /// Stationary kernel given its profile, variance and one lengthscale per input dimension
    pub fn stationary(kind: StationaryKind, variance: F, lengthscales: Array1<F>) -> Self {
        Kernel::Stationary(Stationary {
            kind,
            variance,
            lengthscales,
        })
    }

    /// Rational quadratic kernel
    pub fn rational_quadratic(variance: F, lengthscales: Array1<F>, alpha: F) -> Self {
        Kernel::RationalQuadratic(RationalQuadratic {
            variance,
            lengthscales,
            alpha,
        })
    }

    /// White noise kernel
    pub fn white(variance: F) -> Self {
        Kernel::White(White { variance })
    }

    fn set_children(children: &mut [Kernel<F>], values: &[F]) {
        let mut offset = 0;
        for k in children.iter_mut() {
            let n = k.n_hyperparameters();
            k.set_hyperparameters(&values[offset..offset + n]);
            offset += n;
        }
    }
}

impl<F: Float> Covariance<F> for Kernel<F> {
    fn cross(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
        y: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Array2<F> {
        match self {
            Kernel::Bias(k) => k.cross(x, y),
            Kernel::Linear(k) => k.cross(x, y),
            Kernel::Polynomial(k) => k.cross(x, y),
            Kernel::Stationary(k) => k.cross(x, y),
            Kernel::RationalQuadratic(k) => k.cross(x, y),
            Kernel::White(k) => k.cross(x, y),
            Kernel::Sum(ks) => ks.iter().fold(
                Array2::zeros((x.nrows(), y.nrows())),
                |acc, k| acc + k.cross(x, y),
            ),
            Kernel::Product(ks) => ks.iter().fold(
                Array2::ones((x.nrows(), y.nrows())),
                |acc, k| acc * k.cross(x, y),
            ),
        }
    }

    fn gram(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array2<F> {
        let n = x.nrows();
        match self {
            Kernel::White(k) => k.gram(x),
            Kernel::Sum(ks) => ks
                .iter()
                .fold(Array2::zeros((n, n)), |acc, k| acc + k.gram(x)),
            Kernel::Product(ks) => ks
                .iter()
                .fold(Array2::ones((n, n)), |acc, k| acc * k.gram(x)),
            k => k.cross(x, x),
        }
    }

    fn input_dims(&self) -> Vec<usize> {
        match self {
            Kernel::Linear(k) => k.input_dims(),
            Kernel::Polynomial(k) => k.input_dims(),
            Kernel::Stationary(k) => k.input_dims(),
            Kernel::RationalQuadratic(k) => k.input_dims(),
            Kernel::Bias(_) | Kernel::White(_) => vec![],
            Kernel::Sum(ks) | Kernel::Product(ks) => {
                ks.iter().flat_map(|k| k.input_dims()).collect()
            }
        }
    }

    fn diag(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array1<F> {
        match self {
            Kernel::Bias(k) => k.diag(x),
            Kernel::Linear(k) => k.diag(x),
            Kernel::Polynomial(k) => k.diag(x),
            Kernel::Stationary(k) => k.diag(x),
            Kernel::RationalQuadratic(k) => k.diag(x),
            Kernel::White(k) => k.diag(x),
            Kernel::Sum(ks) => ks
                .iter()
                .fold(Array1::zeros(x.nrows()), |acc, k| acc + k.diag(x)),
            Kernel::Product(ks) => ks
                .iter()
                .fold(Array1::ones(x.nrows()), |acc, k| acc * k.diag(x)),
        }
    }

    fn hyperparameters(&self) -> Vec<F> {
        match self {
            Kernel::Bias(k) => k.hyperparameters(),
            Kernel::Linear(k) => k.hyperparameters(),
            Kernel::Polynomial(k) => k.hyperparameters(),
            Kernel::Stationary(k) => k.hyperparameters(),
            Kernel::RationalQuadratic(k) => k.hyperparameters(),
            Kernel::White(k) => k.hyperparameters(),
            Kernel::Sum(ks) | Kernel::Product(ks) => {
                ks.iter().flat_map(|k| k.hyperparameters()).collect()
            }
        }
    }

    fn set_hyperparameters(&mut self, values: &[F]) {
        match self {
            Kernel::Bias(k) => k.set_hyperparameters(values),
            Kernel::Linear(k) => k.set_hyperparameters(values),
            Kernel::Polynomial(k) => k.set_hyperparameters(values),
            Kernel::Stationary(k) => k.set_hyperparameters(values),
            Kernel::RationalQuadratic(k) => k.set_hyperparameters(values),
            Kernel::White(k) => k.set_hyperparameters(values),
            Kernel::Sum(ks) | Kernel::Product(ks) => Kernel::set_children(ks, values),
        }
    }

    fn hyperparameter_bounds(&self) -> Vec<(F, F)> {
        match self {
            Kernel::Bias(k) => k.hyperparameter_bounds(),
            Kernel::Linear(k) => k.hyperparameter_bounds(),
            Kernel::Polynomial(k) => k.hyperparameter_bounds(),
            Kernel::Stationary(k) => k.hyperparameter_bounds(),
            Kernel::RationalQuadratic(k) => k.hyperparameter_bounds(),
            Kernel::White(k) => k.hyperparameter_bounds(),
            Kernel::Sum(ks) | Kernel::Product(ks) => {
                ks.iter().flat_map(|k| k.hyperparameter_bounds()).collect()
            }
        }
    }
}

impl<F: Float> fmt::Display for Kernel<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Kernel::Bias(k) => write!(f, "{k}"),
            Kernel::Linear(k) => write!(f, "{k}"),
            Kernel::Polynomial(k) => write!(f, "{k}"),
            Kernel::Stationary(k) => write!(f, "{k}"),
            Kernel::RationalQuadratic(k) => write!(f, "{k}"),
            Kernel::White(k) => write!(f, "{k}"),
            Kernel::Sum(ks) => {
                let terms: Vec<String> = ks.iter().map(|k| k.to_string()).collect();
                write!(f, "{}", terms.join(" + "))
            }
            Kernel::Product(ks) => {
                let factors: Vec<String> = ks
                    .iter()
                    .map(|k| match k {
                        Kernel::Sum(_) => format!("({k})"),
                        k => k.to_string(),
                    })
                    .collect();
                write!(f, "{}", factors.join(" * "))
            }
        }
    }
}

impl<F: Float> Add for Kernel<F> {
    type Output = Kernel<F>;

    fn add(self, rhs: Kernel<F>) -> Kernel<F> {
        let mut terms = match self {
            Kernel::Sum(ks) => ks,
            k => vec![k],
        };
        match rhs {
            Kernel::Sum(ks) => terms.extend(ks),
            k => terms.push(k),
        }
        Kernel::Sum(terms)
    }
}

impl<F: Float> Mul for Kernel<F> {
    type Output = Kernel<F>;

    fn mul(self, rhs: Kernel<F>) -> Kernel<F> {
        let mut factors = match self {
            Kernel::Product(ks) => ks,
            k => vec![k],
        };
        match rhs {
            Kernel::Product(ks) => factors.extend(ks),
            k => factors.push(k),
        }
        Kernel::Product(factors)
    }
}
