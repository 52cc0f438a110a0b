//! Predictive performance of an emulator on held out simulator runs.

use crate::errors::{EmuError, Result};
use crate::grid::LabeledGrid;
use crate::surrogate::Surrogate;
use ndarray::{ArrayBase, Data, Ix2, Zip};

/// Half width of the 95% gaussian predictive interval in standard deviations
const Z_95: f64 = 1.959_963_984_540_054;

/// Validation statistics over all cells of all test members
#[derive(Clone, Debug, PartialEq)]
pub struct ValidationStats {
    /// Root mean squared error
    pub rmse: f64,
    /// Mean absolute error
    pub mae: f64,
    /// Fraction of values lying within the 95% predictive interval
    pub coverage: f64,
}

/// Compare predictions at `test_params` with the `test_ensemble` members
pub fn validation_stats<S: Surrogate + ?Sized>(
    model: &S,
    test_params: &ArrayBase<impl Data<Elem = f64>, Ix2>,
    test_ensemble: &LabeledGrid,
) -> Result<ValidationStats> {
    let expected = test_ensemble.flatten_members()?;
    if expected.nrows() != test_params.nrows() || expected.is_empty() {
        return Err(EmuError::InvalidArgument(format!(
            "Got {} test parameters for {} test members",
            test_params.nrows(),
            expected.nrows()
        )));
    }
    let (mean, var) = model.predict_raw(&test_params.view())?;
    if mean.dim() != expected.dim() {
        return Err(EmuError::InvalidArgument(format!(
            "Predictions of shape {:?} do not match test data {:?}",
            mean.dim(),
            expected.dim()
        )));
    }
    let (sq, abs, inside) = Zip::from(&mean).and(&var).and(&expected).fold(
        (0., 0., 0usize),
        |(sq, abs, inside), m, v, y| {
            let err = y - m;
            let covered = err.abs() <= Z_95 * v.sqrt();
            (sq + err * err, abs + err.abs(), inside + covered as usize)
        },
    );
    let n = expected.len() as f64;
    Ok(ValidationStats {
        rmse: (sq / n).sqrt(),
        mae: abs / n,
        coverage: inside as f64 / n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emulator::tests::{ensemble, simulate};
    use crate::emulator::Emulator;
    use crate::kernel_spec::KernelSpec;
    use crate::sampling::{random_params, uniform_params};
    use ndarray::array;

    #[test]
    fn test_validation_stats() {
        let params = uniform_params(2, 5);
        let mut emu = Emulator::new(&params, &ensemble(&params), KernelSpec::default())
            .unwrap()
            .n_start(3);
        emu.train().unwrap();

        let test_params = random_params(2, 10, 7);
        let stats = validation_stats(&emu, &test_params, &ensemble(&test_params)).unwrap();
        assert!(stats.rmse < 1e-1);
        assert!(stats.mae <= stats.rmse);
        assert!((0. ..=1.).contains(&stats.coverage));

        let shifted = LabeledGrid::new((simulate(&test_params) + 10.).into_dyn());
        let stats = validation_stats(&emu, &test_params, &shifted).unwrap();
        assert!(stats.rmse > 9.);
        assert_eq!(0., stats.coverage);

        assert!(validation_stats(&emu, &array![[0.5, 0.5]], &ensemble(&test_params)).is_err());
    }
}
