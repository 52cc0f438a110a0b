use std::sync::{Arc, RwLock};

use crate::SamplingMethod;
use linfa::Float;
use ndarray::{Array, Array2, ArrayBase, Data, Ix2};
use ndarray_rand::{RandomExt, rand::Rng, rand::SeedableRng, rand_distr::Uniform};
use rand_xoshiro::Xoshiro256Plus;

#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};

type RngRef<R> = Arc<RwLock<R>>;

/// Independent uniform draws of each parameter within its bounds.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct RandomUniform<F: Float, R: Rng> {
    /// Sampling space definition as a (nx, 2) matrix
    xlimits: Array2<F>,
    /// Random generator, shared so that `sample(&self)` advances it
    rng: RngRef<R>,
}

impl<F: Float> RandomUniform<F, Xoshiro256Plus> {
    /// Constructor given a (nx, 2) matrix \[\[lower bound, upper bound\], ...\]
    ///
    /// ```
    /// use gpemu_doe::RandomUniform;
    /// use ndarray::arr2;
    ///
    /// let doe = RandomUniform::new(&arr2(&[[0.0, 1.0], [5.0, 10.0]]));
    /// ```
    pub fn new(xlimits: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Self {
        Self::new_with_rng(xlimits, Xoshiro256Plus::from_entropy())
    }
}

impl<F: Float, R: Rng> RandomUniform<F, R> {
    /// Constructor with a given random generator for reproducibility
    ///
    /// **Panics** if xlimits number of columns is different from 2.
    pub fn new_with_rng(xlimits: &ArrayBase<impl Data<Elem = F>, Ix2>, rng: R) -> Self {
        if xlimits.ncols() != 2 {
            panic!("xlimits must have 2 columns (lower, upper)");
        }
        RandomUniform {
            xlimits: xlimits.to_owned(),
            rng: Arc::new(RwLock::new(rng)),
        }
    }

    /// Set random generator
    pub fn with_rng<R2: Rng>(self, rng: R2) -> RandomUniform<F, R2> {
        RandomUniform {
            xlimits: self.xlimits,
            rng: Arc::new(RwLock::new(rng)),
        }
    }
}

impl<F: Float, R: Rng> SamplingMethod<F> for RandomUniform<F, R> {
    fn sampling_space(&self) -> &Array2<F> {
        &self.xlimits
    }

    fn normalized_sample(&self, ns: usize) -> Array2<F> {
        let nx = self.xlimits.nrows();
        let unit = Uniform::new(0., 1.);
        let draws = match self.rng.write() {
            Ok(mut rng) => Array::random_using((ns, nx), unit, &mut *rng),
            // a poisoned lock still holds a usable generator
            Err(poisoned) => Array::random_using((ns, nx), unit, &mut *poisoned.into_inner()),
        };
        draws.mapv(|v| F::cast(v))
    }
}
