/*!
Parameter sampling designs used to build simulator ensembles and to draw
candidate parameters for emulator-based calibration.

A design is generated within a sample space `xlimits` given as a 2D ndarray `(nx, 2)`,
holding the lower and upper bound of each of the `nx` parameters.

Example:
```
use gpemu_doe::{RandomUniform, SamplingMethod, UniformGrid};
use ndarray::arr2;
use ndarray_rand::rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;

// Sample space is [5., 10.] x [0., 1.]
let xlimits = arr2(&[[5., 10.], [0., 1.]]);
// Three evenly spaced levels per parameter, i.e. a 3x3 grid
let grid = UniformGrid::new(&xlimits, 3).sample(9);
// or uniform random draws with a seeded generator for reproducibility
let samples = RandomUniform::new(&xlimits)
    .with_rng(Xoshiro256Plus::seed_from_u64(42))
    .sample(5);
```
*/
#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
mod random;
mod traits;
mod uniform_grid;

pub use random::*;
pub use traits::*;
pub use uniform_grid::*;
