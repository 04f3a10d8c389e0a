//! In-memory gridded datasets
//!
//! A [`Dataset`] is a set of named n-dimensional `f64` arrays that share
//! named dimensions. Coordinate variables (one dimension, named after it)
//! are kept apart from data variables so that resampling can swap the axes
//! without touching the data-variable table.

use ndarray::{Array1, ArrayD, IxDyn};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

pub mod validate;

pub use validate::{check_compatibility, detect_hemisphere, Hemisphere};

/// Attribute values after CF decoding. Numeric types are widened to `f64`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    Number(f64),
    Numbers(Vec<f64>),
    Text(String),
    Texts(Vec<String>),
}

impl AttrValue {
    /// Scalar numeric value, taking the first element of a numeric list.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Numbers(values) => values.first().copied(),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Texts(_) => None,
        }
    }

    pub fn as_f64_list(&self) -> Vec<f64> {
        match self {
            Self::Number(v) => vec![*v],
            Self::Numbers(values) => values.clone(),
            Self::Text(_) | Self::Texts(_) => Vec::new(),
        }
    }
}

impl std::fmt::Display for AttrValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{v}"),
            Self::Numbers(values) => {
                let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            Self::Text(s) => write!(f, "{s}"),
            Self::Texts(values) => write!(f, "[{}]", values.join(", ")),
        }
    }
}

pub type Attributes = BTreeMap<String, AttrValue>;

/// Errors raised when a dataset cannot be used as a resampling source or target.
#[derive(Debug, Error)]
pub enum GridError {
    #[error("dataset '{dataset}' has no '{axis}' dimension")]
    MissingAxis { dataset: String, axis: String },

    #[error("axis '{axis}' of dataset '{dataset}' is not strictly monotonic")]
    NotMonotonic { dataset: String, axis: String },

    #[error("variable '{variable}' has {dims} dimension names but data of rank {rank}")]
    RankMismatch { variable: String, dims: usize, rank: usize },

    #[error(
        "hemisphere mismatch: '{target}' is {target_hemisphere} but '{source_name}' is {source_hemisphere}"
    )]
    HemisphereMismatch {
        target: String,
        target_hemisphere: Hemisphere,
        source_name: String,
        source_hemisphere: Hemisphere,
    },

    #[error("'{source_name}' does not overlap '{target}' along the {axis} axis")]
    DisjointExtent { target: String, source_name: String, axis: String },
}

/// A named n-dimensional array with attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub dims: Vec<String>,
    pub data: ArrayD<f64>,
    pub attrs: Attributes,
}

impl Variable {
    pub fn new(dims: Vec<String>, data: ArrayD<f64>) -> Result<Self, GridError> {
        if dims.len() != data.ndim() {
            return Err(GridError::RankMismatch {
                variable: String::new(),
                dims: dims.len(),
                rank: data.ndim(),
            });
        }
        Ok(Self { dims, data, attrs: Attributes::new() })
    }

    /// One-dimensional variable over `dim`.
    pub fn from_axis(dim: &str, values: Vec<f64>) -> Self {
        Self {
            dims: vec![dim.to_string()],
            data: Array1::from(values).into_dyn(),
            attrs: Attributes::new(),
        }
    }

    pub fn with_attr(mut self, name: &str, value: AttrValue) -> Self {
        self.attrs.insert(name.to_string(), value);
        self
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn dim_index(&self, dim: &str) -> Option<usize> {
        self.dims.iter().position(|d| d == dim)
    }

    /// Count of finite cells.
    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|v| v.is_finite()).count()
    }

    /// Finite minimum and maximum, `None` when every cell is missing.
    pub fn finite_range(&self) -> Option<(f64, f64)> {
        finite_range(self.data.iter().copied())
    }
}

pub(crate) fn finite_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.filter(|v| v.is_finite()).fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// A collection of variables sharing named dimensions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    /// Label used in diagnostics, usually the source file name.
    pub name: String,
    pub dims: BTreeMap<String, usize>,
    pub coords: BTreeMap<String, Variable>,
    pub data_vars: BTreeMap<String, Variable>,
    pub attrs: Attributes,
}

impl Dataset {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    /// Add a coordinate variable, registering its dimension.
    pub fn with_coord(mut self, dim: &str, values: Vec<f64>) -> Self {
        self.dims.insert(dim.to_string(), values.len());
        self.coords.insert(dim.to_string(), Variable::from_axis(dim, values));
        self
    }

    /// Add a data variable, registering any dimensions it introduces.
    pub fn with_variable(mut self, name: &str, variable: Variable) -> Self {
        self.insert_variable(name, variable);
        self
    }

    pub fn with_attr(mut self, name: &str, value: AttrValue) -> Self {
        self.attrs.insert(name.to_string(), value);
        self
    }

    pub fn insert_variable(&mut self, name: &str, variable: Variable) {
        for (dim, len) in variable.dims.iter().zip(variable.shape()) {
            self.dims.entry(dim.clone()).or_insert(*len);
        }
        self.data_vars.insert(name.to_string(), variable);
    }

    /// Look up a variable by name, data variables first.
    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.data_vars.get(name).or_else(|| self.coords.get(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Names of every variable, coordinates first, each group sorted.
    pub fn variable_names(&self) -> Vec<&str> {
        self.coords.keys().chain(self.data_vars.keys()).map(String::as_str).collect()
    }

    /// Coordinate values along `dim`.
    ///
    /// Falls back to index positions when the dimension exists but carries
    /// no coordinate variable.
    pub fn axis(&self, dim: &str) -> Result<Vec<f64>, GridError> {
        if let Some(coord) = self.coords.get(dim) {
            return Ok(coord.data.iter().copied().collect());
        }
        let Some(&len) = self.dims.get(dim) else {
            return Err(GridError::MissingAxis {
                dataset: self.name.clone(),
                axis: dim.to_string(),
            });
        };
        tracing::warn!(
            "Dataset '{}' has no coordinate variable for '{}'; using index positions",
            self.name,
            dim
        );
        Ok((0..len).map(|i| i as f64).collect())
    }
}

/// Build an n-dimensional array from a flat row-major buffer.
pub fn array_from_vec(shape: &[usize], values: Vec<f64>) -> Option<ArrayD<f64>> {
    ArrayD::from_shape_vec(IxDyn(shape), values).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn with_variable_registers_dimensions() {
        let data = Array2::<f64>::zeros((3, 4)).into_dyn();
        let var = Variable::new(vec!["y".into(), "x".into()], data).expect("variable");
        let ds = Dataset::new("t").with_variable("ice", var);
        assert_eq!(ds.dims.get("y"), Some(&3));
        assert_eq!(ds.dims.get("x"), Some(&4));
        assert!(ds.contains("ice"));
    }

    #[test]
    fn variable_rejects_rank_mismatch() {
        let data = Array2::<f64>::zeros((3, 4)).into_dyn();
        let err = Variable::new(vec!["x".into()], data).unwrap_err();
        assert!(matches!(err, GridError::RankMismatch { dims: 1, rank: 2, .. }));
    }

    #[test]
    fn axis_falls_back_to_index_positions() {
        let data = Array2::<f64>::zeros((2, 3)).into_dyn();
        let var = Variable::new(vec!["y".into(), "x".into()], data).expect("variable");
        let ds = Dataset::new("t").with_variable("v", var);
        assert_eq!(ds.axis("x").expect("axis"), vec![0.0, 1.0, 2.0]);
        assert!(matches!(ds.axis("time"), Err(GridError::MissingAxis { .. })));
    }

    #[test]
    fn finite_range_skips_missing_cells() {
        let var = Variable::from_axis("x", vec![f64::NAN, 2.0, -1.0, f64::NAN]);
        assert_eq!(var.finite_range(), Some((-1.0, 2.0)));
        assert_eq!(var.valid_count(), 2);
        let empty = Variable::from_axis("x", vec![f64::NAN]);
        assert_eq!(empty.finite_range(), None);
    }

    #[test]
    fn attr_value_numeric_views() {
        assert_eq!(AttrValue::Numbers(vec![-90.0, 0.0]).as_f64(), Some(-90.0));
        assert_eq!(AttrValue::Text(" 70.5 ".into()).as_f64(), Some(70.5));
        assert_eq!(AttrValue::Texts(vec!["a".into()]).as_f64(), None);
        assert_eq!(AttrValue::Numbers(vec![1.0, 2.0]).to_string(), "[1, 2]");
    }
}
