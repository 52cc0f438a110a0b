//! Implausibility of parameters given an observation and the log likelihood
//! targeted by the calibration samplers.

use crate::errors::{EmuError, Result};
use crate::grid::LabeledGrid;
use crate::surrogate::Surrogate;
use crate::uncertainty::Uncertainties;
use gpemu_mcmc::{standard_normal_log_pdf, LogDensity};
use ndarray::{
    Array1, Array2, ArrayBase, ArrayView2, Axis, Data, Dimension, Ix0, Ix1, Ix2, Zip,
};

/// View 0-d, (cells,) or (rows, cells) values as a 2D array
fn as_rows<'a>(
    a: &'a ArrayBase<impl Data<Elem = f64>, impl Dimension>,
    what: &str,
) -> Result<ArrayView2<'a, f64>> {
    let v = a.view().into_dyn();
    match v.ndim() {
        0 => Ok(v
            .into_dimensionality::<Ix0>()?
            .insert_axis(Axis(0))
            .insert_axis(Axis(0))),
        1 => Ok(v.into_dimensionality::<Ix1>()?.insert_axis(Axis(0))),
        2 => Ok(v.into_dimensionality::<Ix2>()?),
        n => Err(EmuError::InvalidArgument(format!(
            "{what} should have at most 2 dimensions, got {n}"
        ))),
    }
}

/// Log probability of the (n, d) parameters `x`: prior log density plus the sum over
/// output cells of the standard normal log density of `diff / tot_std`.
///
/// `diff` and `tot_std` are broadcast to (n, cells) from 0-d, (cells,) or (n, cells)
/// shapes. Values are neither clamped nor checked: parameters outside the prior support
/// give `-inf` and NaN inputs give NaN.
pub fn target_log_likelihood<P: LogDensity + ?Sized>(
    prior: &P,
    x: &ArrayBase<impl Data<Elem = f64>, Ix2>,
    diff: &ArrayBase<impl Data<Elem = f64>, impl Dimension>,
    tot_std: &ArrayBase<impl Data<Elem = f64>, impl Dimension>,
) -> Result<Array1<f64>> {
    let diff = as_rows(diff, "diff")?;
    let tot_std = as_rows(tot_std, "tot_std")?;
    let shape = (x.nrows(), diff.ncols().max(tot_std.ncols()));
    let incompatible = || {
        EmuError::InvalidArgument(format!(
            "Cannot broadcast diff {:?} and tot_std {:?} to {shape:?}",
            diff.shape(),
            tot_std.shape()
        ))
    };
    let diff = diff.broadcast(shape).ok_or_else(incompatible)?;
    let tot_std = tot_std.broadcast(shape).ok_or_else(incompatible)?;

    let mut log_prob = Array1::zeros(x.nrows());
    Zip::from(&mut log_prob)
        .and(x.rows())
        .and(diff.rows())
        .and(tot_std.rows())
        .for_each(|lp, xi, d, s| {
            let data_ll = Zip::from(&d)
                .and(&s)
                .fold(0., |acc, d, s| acc + standard_normal_log_pdf(d / s));
            *lp = prior.log_prob(&xi) + data_ll;
        });
    Ok(log_prob)
}

/// Implausibility `|mean - obs| / sqrt(var_emulator + total uncertainty variance)`
/// of shape (n, cells) at the (n, d) parameters `x`.
pub fn implausibility<S: Surrogate + ?Sized>(
    model: &S,
    obs: &LabeledGrid,
    x: &ArrayBase<impl Data<Elem = f64>, Ix2>,
    uncertainties: &Uncertainties,
    include_emulator_variance: bool,
) -> Result<Array2<f64>> {
    let obs = observed_cells(model, obs)?;
    let obs_var = uncertainties.total_variance(&obs)?;
    let (mean, var) = model.predict_raw(&x.view())?;
    let mut imp = Array2::zeros(mean.dim());
    Zip::from(imp.rows_mut())
        .and(mean.rows())
        .and(var.rows())
        .for_each(|mut imp, m, v| {
            Zip::from(&mut imp)
                .and(&m)
                .and(&v)
                .and(&obs)
                .and(&obs_var)
                .for_each(|i, m, v, o, ov| {
                    let var = if include_emulator_variance { v + ov } else { *ov };
                    *i = (m - o).abs() / var.sqrt();
                });
        });
    Ok(imp)
}

/// Flattened observation values, checked against the model outputs
pub(crate) fn observed_cells<S: Surrogate + ?Sized>(
    model: &S,
    obs: &LabeledGrid,
) -> Result<Array1<f64>> {
    let obs = obs.flatten();
    if obs.len() != model.n_cells() {
        return Err(EmuError::InvalidArgument(format!(
            "Observation has {} cells, emulator predicts {}",
            obs.len(),
            model.n_cells()
        )));
    }
    Ok(obs)
}

/// Plausible rows of an (n, cells) implausibility: the fraction of cells whose
/// implausibility exceeds `threshold` is at most `tolerance`.
pub fn constrain(
    implausibility: &ArrayBase<impl Data<Elem = f64>, Ix2>,
    threshold: f64,
    tolerance: f64,
) -> Array1<bool> {
    let n_cells = implausibility.ncols().max(1) as f64;
    implausibility
        .rows()
        .into_iter()
        .map(|row| {
            let n_above = row.iter().filter(|v| **v > threshold).count() as f64;
            n_above / n_cells <= tolerance
        })
        .collect()
}
