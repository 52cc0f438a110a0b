use gpemu_doe::{RandomUniform, SamplingMethod};
use ndarray::{arr1, s, Array1, Array2, Zip};
use ndarray_rand::rand::SeedableRng;
use num_traits::ToPrimitive;
use rand_xoshiro::Xoshiro256Plus;

use linfa::prelude::Float;

pub(crate) struct CobylaParams {
    pub rhobeg: f64,
    pub ftol_rel: f64,
    pub maxeval: usize,
}

impl Default for CobylaParams {
    fn default() -> Self {
        CobylaParams {
            rhobeg: 0.5,
            ftol_rel: 1e-4,
            maxeval: 200,
        }
    }
}

/// Build the starting points of the hyperparameters optimization in log10 space.
///
/// The first row is the given initial guess clipped to the bounds, the `n_start`
/// following rows are drawn uniformly within the bounds.
pub(crate) fn prepare_multistart<F: Float>(
    n_start: usize,
    params0: &Array1<F>,
    bounds: &[(F, F)],
    seed: u64,
) -> (Array2<f64>, Vec<(f64, f64)>) {
    let bounds: Vec<(f64, f64)> = bounds
        .iter()
        .map(|(lo, up)| (into_f64(lo).log10(), into_f64(up).log10()))
        .collect();

    let mut starts = Array2::zeros((n_start + 1, params0.len()));
    Zip::from(starts.row_mut(0))
        .and(params0)
        .and(&bounds)
        .for_each(|s, p, (lo, up)| *s = into_f64(p).log10().clamp(*lo, *up));

    if n_start > 0 {
        let mut xlimits: Array2<f64> = Array2::zeros((bounds.len(), 2));
        Zip::from(xlimits.rows_mut())
            .and(&bounds)
            .for_each(|mut row, limits| row.assign(&arr1(&[limits.0, limits.1])));
        let seeds = RandomUniform::new(&xlimits)
            .with_rng(Xoshiro256Plus::seed_from_u64(seed))
            .sample(n_start);
        starts.slice_mut(s![1.., ..]).assign(&seeds);
    }
    (starts, bounds)
}

/// Optimize gp hyper parameters given an initial guess and bounds with cobyla
pub(crate) fn optimize_params<ObjF>(
    objfn: ObjF,
    param0: &Array1<f64>,
    bounds: &[(f64, f64)],
    cobyla: CobylaParams,
) -> (f64, Array1<f64>)
where
    ObjF: Fn(&[f64], Option<&mut [f64]>, &mut ()) -> f64,
{
    use cobyla::{minimize, Func, StopTols};

    let cons: Vec<&dyn Func<()>> = vec![];
    let param0 = param0.to_vec();

    match minimize(
        |x, u| objfn(x, None, u),
        &param0,
        bounds,
        &cons,
        (),
        cobyla.maxeval,
        cobyla::RhoBeg::All(cobyla.rhobeg),
        Some(StopTols {
            ftol_rel: cobyla.ftol_rel,
            ..StopTols::default()
        }),
    ) {
        Ok((_, x_opt, fval)) => {
            let fval = if f64::is_nan(fval) {
                f64::INFINITY
            } else {
                fval
            };
            (fval, arr1(&x_opt))
        }
        Err((status, x_opt, _)) => {
            log::warn!("Cobyla optimizer failed in GP hyperparameters tuning, status={status:?}");
            (f64::INFINITY, arr1(&x_opt))
        }
    }
}

#[inline(always)]
pub(crate) fn into_f64<F: Float>(v: &F) -> f64 {
    v.to_f64().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_prepare_multistart() {
        let (starts, bounds) =
            prepare_multistart(5, &array![1e-3, 10.], &[(1e-2, 1e2), (1e-2, 1e2)], 42);
        assert_eq!((6, 2), starts.dim());
        for (lo, up) in bounds.iter() {
            assert_abs_diff_eq!(*lo, -2., epsilon = 1e-12);
            assert_abs_diff_eq!(*up, 2., epsilon = 1e-12);
        }
        // first start is the initial guess clipped to the bounds
        assert_abs_diff_eq!(array![-2., 1.], starts.row(0).to_owned(), epsilon = 1e-12);
        assert!(starts.iter().all(|v| (-2. - 1e-12..=2. + 1e-12).contains(v)));
    }

    #[test]
    fn test_optimize_quadratic() {
        let objfn = |x: &[f64], _g: Option<&mut [f64]>, _u: &mut ()| -> f64 {
            (x[0] - 0.5).powi(2) + (x[1] + 0.25).powi(2)
        };
        let (fmin, xopt) = optimize_params(
            objfn,
            &array![0., 0.],
            &[(-1., 1.), (-1., 1.)],
            CobylaParams::default(),
        );
        assert!(fmin < 1e-3);
        assert_abs_diff_eq!(xopt, array![0.5, -0.25], epsilon = 5e-2);
    }
}
