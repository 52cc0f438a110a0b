//! Covariance functions built from kernel names.

use crate::errors::{EmuError, Result};
use gpemu_gp::kernels::StationaryKind;
use gpemu_gp::Kernel;
use ndarray::Array1;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Primitive kernels which can be referred to by name
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KernelName {
    /// Constant kernel
    Bias,
    /// Linear kernel
    Linear,
    /// Polynomial kernel of degree 3
    Polynomial,
    /// Squared exponential kernel
    Rbf,
    /// White noise kernel
    White,
    /// Exponential kernel
    Exponential,
    /// Matern 1/2 kernel
    Matern12,
    /// Matern 3/2 kernel
    Matern32,
    /// Matern 5/2 kernel
    Matern52,
    /// Rational quadratic kernel
    RationalQuadratic,
    /// Cosine kernel
    Cosine,
}

impl KernelName {
    /// All recognized names
    pub const ALL: [KernelName; 11] = [
        KernelName::Bias,
        KernelName::Linear,
        KernelName::Polynomial,
        KernelName::Rbf,
        KernelName::White,
        KernelName::Exponential,
        KernelName::Matern12,
        KernelName::Matern32,
        KernelName::Matern52,
        KernelName::RationalQuadratic,
        KernelName::Cosine,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            KernelName::Bias => "Bias",
            KernelName::Linear => "Linear",
            KernelName::Polynomial => "Polynomial",
            KernelName::Rbf => "RBF",
            KernelName::White => "White",
            KernelName::Exponential => "Exponential",
            KernelName::Matern12 => "Matern12",
            KernelName::Matern32 => "Matern32",
            KernelName::Matern52 => "Matern52",
            KernelName::RationalQuadratic => "RationalQuadratic",
            KernelName::Cosine => "Cosine",
        }
    }

    /// Kernel with default hyperparameters for `n_params` input dimensions
    pub fn build(&self, n_params: usize) -> Kernel<f64> {
        let ones = Array1::ones(n_params);
        match self {
            KernelName::Bias => Kernel::bias(),
            KernelName::Linear => Kernel::linear(ones),
            KernelName::Polynomial => Kernel::polynomial(ones, 1., 3),
            KernelName::Rbf => {
                Kernel::stationary(StationaryKind::SquaredExponential, 1., ones * 0.5)
            }
            KernelName::White => Kernel::white(1.),
            KernelName::Exponential => {
                Kernel::stationary(StationaryKind::Exponential, 1., ones)
            }
            KernelName::Matern12 => Kernel::stationary(StationaryKind::Matern12, 1., ones),
            KernelName::Matern32 => Kernel::stationary(StationaryKind::Matern32, 1., ones),
            KernelName::Matern52 => Kernel::stationary(StationaryKind::Matern52, 1., ones),
            KernelName::RationalQuadratic => Kernel::rational_quadratic(1., ones, 1.),
            KernelName::Cosine => Kernel::stationary(StationaryKind::Cosine, 1., ones),
        }
    }
}

impl fmt::Display for KernelName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for KernelName {
    type Err = EmuError;

    fn from_str(s: &str) -> Result<Self> {
        KernelName::ALL
            .iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| {
                EmuError::InvalidArgument(format!(
                    "Unknown kernel name '{s}', expected one of {:?}",
                    KernelName::ALL.map(|k| k.as_str())
                ))
            })
    }
}

/// Combination of several named kernels
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KernelOp {
    /// Sum of kernels
    #[default]
    Add,
    /// Product of kernels
    Mul,
}

impl FromStr for KernelOp {
    type Err = EmuError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "+" | "add" => Ok(KernelOp::Add),
            "*" | "mul" => Ok(KernelOp::Mul),
            _ => Err(EmuError::InvalidArgument(format!(
                "Unknown kernel operator '{s}', expected '+' or '*'"
            ))),
        }
    }
}

impl fmt::Display for KernelOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            KernelOp::Add => write!(f, "+"),
            KernelOp::Mul => write!(f, "*"),
        }
    }
}

/// Kernel specification of an emulator
#[derive(Clone, Debug, Default, PartialEq)]
pub enum KernelSpec {
    /// `RBF + Linear + Polynomial`
    #[default]
    Default,
    /// Named kernels combined with the operator
    Named {
        /// Kernel names, not empty
        names: Vec<KernelName>,
        /// Combination operator
        op: KernelOp,
    },
    /// A covariance function given as is
    Custom(Kernel<f64>),
}

impl KernelSpec {
    /// Named kernels combined with `op` (`"+"` or `"*"`), names and operator are checked here.
    pub fn named<S: AsRef<str>>(names: &[S], op: &str) -> Result<Self> {
        if names.is_empty() {
            return Err(EmuError::InvalidArgument(
                "At least one kernel name is required".to_string(),
            ));
        }
        let names = names
            .iter()
            .map(|n| n.as_ref().parse())
            .collect::<Result<Vec<KernelName>>>()?;
        let op = op.parse()?;
        Ok(KernelSpec::Named { names, op })
    }

    /// Covariance function for `n_params` input dimensions
    pub fn build(&self, n_params: usize) -> Kernel<f64> {
        match self {
            KernelSpec::Default => {
                KernelName::Rbf.build(n_params)
                    + KernelName::Linear.build(n_params)
                    + KernelName::Polynomial.build(n_params)
            }
            KernelSpec::Named { names, op } => {
                let mut kernels = names.iter().map(|n| n.build(n_params));
                // names is never empty
                let first = kernels.next().unwrap_or_else(Kernel::bias);
                kernels.fold(first, |acc, k| match op {
                    KernelOp::Add => acc + k,
                    KernelOp::Mul => acc * k,
                })
            }
            KernelSpec::Custom(kernel) => kernel.clone(),
        }
    }
}

impl From<Kernel<f64>> for KernelSpec {
    fn from(kernel: Kernel<f64>) -> Self {
        KernelSpec::Custom(kernel)
    }
}

fn as_names(values: &[Value]) -> Result<Vec<&str>> {
    values
        .iter()
        .map(|v| {
            v.as_str().ok_or_else(|| {
                EmuError::InvalidArgument(format!("Kernel name should be a string, got {v}"))
            })
        })
        .collect()
}

/// Loosely typed kernel argument as found in a json configuration:
/// `null`, `"RBF"`, `["RBF", "White"]` or `{"names": ["RBF", "White"], "op": "*"}`.
impl TryFrom<&Value> for KernelSpec {
    type Error = EmuError;

    fn try_from(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(KernelSpec::Default),
            Value::String(name) => KernelSpec::named(&[name], "+"),
            Value::Array(values) => KernelSpec::named(as_names(values)?.as_slice(), "+"),
            Value::Object(map) => {
                let names = map
                    .get("names")
                    .and_then(|v| v.as_array())
                    .ok_or_else(|| {
                        EmuError::InvalidArgument(format!(
                            "Kernel object requires a 'names' list, got {value}"
                        ))
                    })?;
                let op = match map.get("op") {
                    None => "+",
                    Some(op) => op.as_str().ok_or_else(|| {
                        EmuError::InvalidArgument(format!(
                            "Kernel operator should be a string, got {op}"
                        ))
                    })?,
                };
                KernelSpec::named(as_names(names)?.as_slice(), op)
            }
            other => Err(EmuError::InvalidArgument(format!(
                "Kernel should be given as name(s), got {other}"
            ))),
        }
    }
}
