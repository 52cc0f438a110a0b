use crate::SamplingMethod;
use linfa::Float;
use ndarray::{Array1, Array2, ArrayBase, Data, Ix2};

#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};

/// A regular grid design: each parameter takes `n_levels` evenly spaced values
/// between its bounds (both included) and the design is the cartesian product
/// of those levels, the first parameter varying the slowest.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct UniformGrid<F: Float> {
    /// The ith row is the [lower_bound, upper_bound] of the ith parameter
    xlimits: Array2<F>,
    /// Number of levels per parameter
    n_levels: usize,
}

impl<F: Float> UniformGrid<F> {
    /// Constructor given a (nx, 2) matrix \[\[lower bound, upper bound\], ...\]
    /// and the number of levels per parameter.
    ///
    /// ```
    /// use gpemu_doe::UniformGrid;
    /// use ndarray::arr2;
    ///
    /// let doe = UniformGrid::new(&arr2(&[[0.0, 1.0], [5.0, 10.0]]), 5);
    /// ```
    ///
    /// **Panics** if xlimits number of columns is different from 2.
    pub fn new(xlimits: &ArrayBase<impl Data<Elem = F>, Ix2>, n_levels: usize) -> Self {
        if xlimits.ncols() != 2 {
            panic!("xlimits must have 2 columns (lower, upper)");
        }
        UniformGrid {
            xlimits: xlimits.to_owned(),
            n_levels,
        }
    }

    /// Number of points of the full grid, i.e. `n_levels^nx`
    pub fn n_points(&self) -> usize {
        self.n_levels.pow(self.xlimits.nrows() as u32)
    }

    /// The whole grid
    pub fn all(&self) -> Array2<F> {
        self.sample(self.n_points())
    }

    fn levels(&self) -> Array1<F> {
        match self.n_levels {
            0 => Array1::zeros(0),
            1 => Array1::from_elem(1, F::cast(0.5)),
            n => Array1::from_shape_fn(n, |i| F::cast(i) / F::cast(n - 1)),
        }
    }
}

impl<F: Float> SamplingMethod<F> for UniformGrid<F> {
    fn sampling_space(&self) -> &Array2<F> {
        &self.xlimits
    }

    /// Returns the first `ns` points of the grid (at most `n_levels^nx`)
    fn normalized_sample(&self, ns: usize) -> Array2<F> {
        let nx = self.xlimits.nrows();
        let levels = self.levels();
        let n = ns.min(self.n_points());
        Array2::from_shape_fn((n, nx), |(i, j)| {
            // mixed radix decomposition of the row index, last parameter fastest
            let stride = self.n_levels.pow((nx - 1 - j) as u32);
            levels[(i / stride) % self.n_levels]
        })
    }
}
