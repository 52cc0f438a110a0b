//! Observational uncertainty terms combined in quadrature.

use crate::errors::{EmuError, Result};
use ndarray::{Array1, ArrayBase, Data, Ix1, Zip};
use serde::{Deserialize, Serialize};

/// Standard deviation of one uncertainty source, either one scalar or one value per cell
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Uncertainty {
    /// Given in output units
    Absolute(Array1<f64>),
    /// Given as a fraction of the observed value in each cell
    Relative(Array1<f64>),
}

impl Default for Uncertainty {
    fn default() -> Self {
        Uncertainty::Absolute(Array1::zeros(1))
    }
}

impl Uncertainty {
    /// Same absolute uncertainty for every cell
    pub fn absolute(value: f64) -> Self {
        Uncertainty::Absolute(Array1::from_elem(1, value))
    }

    /// Same relative uncertainty for every cell
    pub fn relative(value: f64) -> Self {
        Uncertainty::Relative(Array1::from_elem(1, value))
    }

    fn values(&self) -> &Array1<f64> {
        match self {
            Uncertainty::Absolute(v) | Uncertainty::Relative(v) => v,
        }
    }

    /// Standard deviation per cell of the flattened observation `obs`
    pub fn std(&self, obs: &ArrayBase<impl Data<Elem = f64>, Ix1>) -> Result<Array1<f64>> {
        let values = self.values();
        let n_cells = obs.len();
        let values = match values.len() {
            1 => Array1::from_elem(n_cells, values[0]),
            n if n == n_cells => values.to_owned(),
            n => {
                return Err(EmuError::InvalidArgument(format!(
                    "Uncertainty with {n} values does not match observation with {n_cells} cells"
                )))
            }
        };
        if values.iter().any(|v| *v < 0. || v.is_nan()) {
            return Err(EmuError::InvalidArgument(format!(
                "Uncertainty values should be non negative, got {values}"
            )));
        }
        Ok(match self {
            Uncertainty::Absolute(_) => values,
            Uncertainty::Relative(_) => values * &obs.mapv(f64::abs),
        })
    }
}

/// The four independent uncertainty sources of an observation, zero by default
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Uncertainties {
    /// Observational
    pub observational: Uncertainty,
    /// Inter-annual variability
    pub interannual: Uncertainty,
    /// Representativeness
    pub representativeness: Uncertainty,
    /// Structural (model) uncertainty
    pub structural: Uncertainty,
}

impl Uncertainties {
    /// Set the observational uncertainty
    pub fn observational(mut self, u: Uncertainty) -> Self {
        self.observational = u;
        self
    }

    /// Set the inter-annual uncertainty
    pub fn interannual(mut self, u: Uncertainty) -> Self {
        self.interannual = u;
        self
    }

    /// Set the representativeness uncertainty
    pub fn representativeness(mut self, u: Uncertainty) -> Self {
        self.representativeness = u;
        self
    }

    /// Set the structural uncertainty
    pub fn structural(mut self, u: Uncertainty) -> Self {
        self.structural = u;
        self
    }

    /// Sum of the squared standard deviations per cell of the flattened observation
    pub fn total_variance(&self, obs: &ArrayBase<impl Data<Elem = f64>, Ix1>) -> Result<Array1<f64>> {
        let mut total = Array1::zeros(obs.len());
        for u in [
            &self.observational,
            &self.interannual,
            &self.representativeness,
            &self.structural,
        ] {
            let std = u.std(obs)?;
            Zip::from(&mut total).and(&std).for_each(|t, s| *t += s * s);
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_quadrature_sum() {
        let obs = array![2., -4.];
        let u = Uncertainties::default()
            .observational(Uncertainty::absolute(3.))
            .structural(Uncertainty::Absolute(array![4., 0.]));
        assert_abs_diff_eq!(u.total_variance(&obs).unwrap(), array![25., 9.], epsilon = 1e-12);
    }

    #[test]
    fn test_relative_uncertainty() {
        let obs = array![2., -4.];
        let u = Uncertainty::relative(0.5);
        assert_abs_diff_eq!(u.std(&obs).unwrap(), array![1., 2.], epsilon = 1e-12);
    }

    #[test]
    fn test_bad_uncertainties() {
        let obs = array![2., -4., 1.];
        assert!(Uncertainty::Absolute(array![1., 2.]).std(&obs).is_err());
        assert!(Uncertainty::absolute(-1.).std(&obs).is_err());
        assert_eq!(
            array![0., 0., 0.],
            Uncertainties::default().total_variance(&obs).unwrap()
        );
    }
}
