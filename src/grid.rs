//! Labeled n-dimensional grids carrying a name, physical units and coordinates.
//!
//! An ensemble is a grid whose first axis indexes the members (simulator runs),
//! an observation is a grid shaped like one member.

use crate::errors::{EmuError, Result};
use ndarray::{stack, Array1, Array2, ArrayD, ArrayViewD, Axis, IxDyn};

use serde::{Deserialize, Serialize};

/// Name used when a grid has no name
pub const DEFAULT_NAME: &str = "data";

/// Coordinate points along one axis of a grid
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    /// Coordinate name (e.g. "latitude")
    pub name: String,
    /// Coordinate values, one per index along the axis
    pub points: Array1<f64>,
}

impl Coord {
    /// Constructor
    pub fn new(name: &str, points: Array1<f64>) -> Self {
        Coord {
            name: name.to_string(),
            points,
        }
    }
}

/// A n-dimensional array of values with its metadata
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabeledGrid {
    data: ArrayD<f64>,
    name: Option<String>,
    units: String,
    coords: Vec<Option<Coord>>,
}

impl LabeledGrid {
    /// Unnamed grid without units nor coordinates
    pub fn new(data: ArrayD<f64>) -> Self {
        let coords = vec![None; data.ndim()];
        LabeledGrid {
            data,
            name: None,
            units: String::new(),
            coords,
        }
    }

    /// Set the grid name
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Set the grid units
    pub fn with_units(mut self, units: &str) -> Self {
        self.units = units.to_string();
        self
    }

    /// Attach a coordinate to the given axis
    pub fn with_coord(mut self, axis: usize, coord: Coord) -> Result<Self> {
        if axis >= self.data.ndim() || coord.points.len() != self.data.len_of(Axis(axis)) {
            return Err(EmuError::InvalidArgument(format!(
                "Coordinate {} with {} points does not fit axis {axis} of grid with shape {:?}",
                coord.name,
                coord.points.len(),
                self.data.shape()
            )));
        }
        self.coords[axis] = Some(coord);
        Ok(self)
    }

    /// Raw values
    pub fn data(&self) -> &ArrayD<f64> {
        &self.data
    }

    /// Grid name, `"data"` when the grid has no name or an empty one
    pub fn name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_NAME)
    }

    /// Grid name if any
    pub fn raw_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Physical units
    pub fn units(&self) -> &str {
        &self.units
    }

    /// Coordinates of the given axis if any
    pub fn coord(&self, axis: usize) -> Option<&Coord> {
        self.coords.get(axis).and_then(|c| c.as_ref())
    }

    /// Shape of the values
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// Number of members when the grid is an ensemble
    pub fn n_members(&self) -> usize {
        self.data.shape().first().copied().unwrap_or(1)
    }

    /// Number of cells of one member when the grid is an ensemble
    pub fn n_member_cells(&self) -> usize {
        self.data.shape().iter().skip(1).product()
    }

    /// Copy of the grid metadata holding `data` instead, shapes have to match
    pub fn copy_with_data(&self, data: ArrayD<f64>) -> Result<Self> {
        if data.shape() != self.data.shape() {
            return Err(EmuError::InvalidArgument(format!(
                "Expected data with shape {:?}, got {:?}",
                self.data.shape(),
                data.shape()
            )));
        }
        Ok(LabeledGrid {
            data,
            name: self.name.clone(),
            units: self.units.clone(),
            coords: self.coords.clone(),
        })
    }

    /// The `i`th member of an ensemble
    pub fn member(&self, i: usize) -> Result<Self> {
        if self.data.ndim() == 0 || i >= self.n_members() {
            return Err(EmuError::InvalidArgument(format!(
                "Member {i} out of ensemble of shape {:?}",
                self.data.shape()
            )));
        }
        Ok(LabeledGrid {
            data: self.data.index_axis(Axis(0), i).to_owned(),
            name: self.name.clone(),
            units: self.units.clone(),
            coords: self.coords[1..].to_vec(),
        })
    }

    /// Ensemble values as a (n_members, n_cells) matrix, cells in row-major order
    pub fn flatten_members(&self) -> Result<Array2<f64>> {
        if self.data.ndim() == 0 {
            return Err(EmuError::InvalidArgument(
                "A 0-dimensional grid is not an ensemble".to_string(),
            ));
        }
        let shape = (self.n_members(), self.n_member_cells());
        Ok(self
            .data
            .as_standard_layout()
            .into_owned()
            .into_shape(shape)?)
    }

    /// All values flattened in row-major order
    pub fn flatten(&self) -> Array1<f64> {
        self.data.iter().copied().collect()
    }

    /// Build grids with the metadata of `self` (a member template) from (n, n_cells) values.
    /// One row gives a member shaped grid, several rows add a leading sample axis.
    pub fn from_member_rows(&self, rows: &Array2<f64>) -> Result<Self> {
        let cells = self.data.len();
        if rows.ncols() != cells {
            return Err(EmuError::InvalidArgument(format!(
                "Expected {cells} values per row, got {}",
                rows.ncols()
            )));
        }
        let member_shape = self.data.shape().to_vec();
        if rows.nrows() == 1 {
            let data = rows
                .row(0)
                .to_owned()
                .into_shape(IxDyn(&member_shape))?;
            self.copy_with_data(data)
        } else {
            let mut shape = vec![rows.nrows()];
            shape.extend_from_slice(&member_shape);
            let data = rows
                .as_standard_layout()
                .into_owned()
                .into_shape(IxDyn(&shape))?;
            let mut coords = vec![None];
            coords.extend(self.coords.iter().cloned());
            Ok(LabeledGrid {
                data,
                name: self.name.clone(),
                units: self.units.clone(),
                coords,
            })
        }
    }

    /// Stack equally shaped grids along a new leading axis,
    /// metadata is taken from the first grid.
    pub fn concat_new_axis(grids: &[LabeledGrid]) -> Result<Self> {
        let first = grids.first().ok_or_else(|| {
            EmuError::InvalidArgument("Cannot concatenate an empty list of grids".to_string())
        })?;
        let views: Vec<ArrayViewD<f64>> = grids.iter().map(|g| g.data.view()).collect();
        let data = stack(Axis(0), &views)?;
        let mut coords = vec![None];
        coords.extend(first.coords.iter().cloned());
        Ok(LabeledGrid {
            data,
            name: first.name.clone(),
            units: first.units.clone(),
            coords,
        })
    }

    /// Rename the grid with a prefix applied to [LabeledGrid::name]
    pub(crate) fn prefixed(mut self, prefix: &str) -> Self {
        self.name = Some(format!("{prefix}{}", self.name()));
        self
    }
}

impl From<ArrayD<f64>> for LabeledGrid {
    fn from(data: ArrayD<f64>) -> Self {
        LabeledGrid::new(data)
    }
}
