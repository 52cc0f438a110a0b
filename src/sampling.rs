//! Helpers to build parameter designs on the unit hypercube.

use crate::errors::{EmuError, Result};
use gpemu_doe::{RandomUniform, SamplingMethod, UniformGrid};
use ndarray::{Array2, ArrayBase, Axis, Data, Ix2};
use ndarray_rand::rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;

/// Default number of levels per dimension of a uniform design
pub const DEFAULT_N_LEVELS: usize = 5;

fn unit_limits(n_params: usize) -> Array2<f64> {
    let mut xlimits = Array2::zeros((n_params, 2));
    xlimits.column_mut(1).fill(1.);
    xlimits
}

/// Full grid of `n_levels^n_params` points evenly spaced in `[0, 1]^n_params`,
/// bounds included, the first parameter varying slowest.
pub fn uniform_params(n_params: usize, n_levels: usize) -> Array2<f64> {
    UniformGrid::new(&unit_limits(n_params), n_levels).all()
}

/// `n_samples` points drawn uniformly in `[0, 1]^n_params`
pub fn random_params(n_params: usize, n_samples: usize, seed: u64) -> Array2<f64> {
    RandomUniform::new(&unit_limits(n_params))
        .with_rng(Xoshiro256Plus::seed_from_u64(seed))
        .sample(n_samples)
}

/// Pop the rows at `indices` out of `params`.
/// Returns the remaining rows and the popped ones, both in their original order.
pub fn split_rows(
    params: &ArrayBase<impl Data<Elem = f64>, Ix2>,
    indices: &[usize],
) -> Result<(Array2<f64>, Array2<f64>)> {
    if let Some(i) = indices.iter().find(|i| **i >= params.nrows()) {
        return Err(EmuError::InvalidArgument(format!(
            "Row index {i} out of design of {} rows",
            params.nrows()
        )));
    }
    let (popped, remaining): (Vec<usize>, Vec<usize>) =
        (0..params.nrows()).partition(|i| indices.contains(i));
    Ok((
        params.select(Axis(0), &remaining),
        params.select(Axis(0), &popped),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_uniform_params() {
        let params = uniform_params(2, 6);
        assert_eq!((36, 2), params.dim());
        assert!(params.iter().all(|v| (0. ..=1.).contains(v)));
        assert_eq!(array![0., 0.], params.row(0));
        assert_eq!(array![0., 0.2], params.row(1));
        assert_eq!(array![1., 1.], params.row(35));
    }

    #[test]
    fn test_random_params() {
        let params = random_params(3, 25, 42);
        assert_eq!((25, 3), params.dim());
        assert!(params.iter().all(|v| (0. ..1.).contains(v)));
        assert_eq!(params, random_params(3, 25, 42));
    }

    #[test]
    fn test_split_rows() {
        let params = uniform_params(2, 6);
        let (remaining, popped) = split_rows(&params, &[10, 12]).unwrap();
        assert_eq!((34, 2), remaining.dim());
        assert_eq!(params.row(10), popped.row(0));
        assert_eq!(params.row(12), popped.row(1));
        assert_eq!(params.row(11), remaining.row(10));
        assert!(split_rows(&params, &[36]).is_err());
    }
}
