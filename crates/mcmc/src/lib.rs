/*!
Markov chain Monte Carlo sampling of unnormalized log densities.

The crate is organized around three pieces:
* a target density implementing [LogDensity] (priors such as [Uniform] are densities too),
* a [TransitionKernel] moving a [ChainState] one step forward:
  [RandomWalkMetropolis] or [HamiltonianMonteCarlo], optionally with its step size tuned
  during burn-in by a [SimpleStepSizeAdaptation],
* the [sample_chain] driver running burn-in then collecting `num_results` states into a [Trace].

Example:
```
use gpemu_mcmc::{sample_chain, ChainParams, LogDensity, RandomWalkMetropolis, Uniform};
use ndarray::array;
use ndarray_rand::rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;

let prior = Uniform::new(array![0., 0.], array![1., 1.]).unwrap();
let mut kernel = RandomWalkMetropolis::new(0.1);
let mut rng = Xoshiro256Plus::seed_from_u64(42);
let trace = sample_chain(
    &ChainParams::new(100).num_burnin_steps(50),
    &mut kernel,
    &array![0.5, 0.5],
    &prior,
    &mut rng,
)
.unwrap();
assert_eq!((100, 2), trace.states.dim());
```
*/
#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
mod distributions;
mod driver;
mod errors;
mod kernels;

pub use distributions::*;
pub use driver::*;
pub use errors::*;
pub use kernels::*;
