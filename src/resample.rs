//! Resampling of a source grid onto the x/y axes of a target grid
//!
//! Only coordinate values are interpolated. Target points outside the
//! source's axis range come out as NaN; nothing is extrapolated.

use crate::domain::{GridConfig, InterpolationMethod};
use crate::grid::{Dataset, GridError, Variable};
use ndarray::{ArrayD, Dimension, IxDyn};
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Source cells contributing to one target coordinate along a single axis.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Stencil {
    lo: usize,
    hi: usize,
    /// Weight of `hi`; `lo` gets `1 - frac`.
    frac: f64,
}

impl Stencil {
    fn exact(index: usize) -> Self {
        Self { lo: index, hi: index, frac: 0.0 }
    }

    /// Contributing `(index, weight)` pairs. Zero-weight cells are left out so
    /// that a missing neighbour does not poison an exact hit.
    fn terms(&self) -> impl Iterator<Item = (usize, f64)> {
        [(self.lo, 1.0 - self.frac), (self.hi, self.frac)]
            .into_iter()
            .take(if self.lo == self.hi { 1 } else { 2 })
            .filter(|(_, w)| *w != 0.0)
    }
}

/// Per-target-point stencils for one axis; `None` marks an out-of-range point.
type AxisStencils = Vec<Option<Stencil>>;

/// Interpolate every variable of `source` that spans the x or y dimension onto
/// the coordinates of `target`'s x and y axes.
///
/// Variables without either axis and non-spatial coordinates are copied
/// unchanged. The result carries `target`'s x/y coordinate variables and
/// `source`'s attributes.
pub fn resample(source: &Dataset, target: &Dataset, config: &GridConfig) -> Result<Dataset, GridError> {
    let x_dim = config.x_dim.as_str();
    let y_dim = config.y_dim.as_str();
    tracing::info!(
        "Resampling '{}' onto '{}' ({} interpolation)",
        source.name,
        target.name,
        config.method
    );

    let target_x = target.axis(x_dim)?;
    let target_y = target.axis(y_dim)?;
    let source_x = source.axis(x_dim)?;
    let source_y = source.axis(y_dim)?;
    ensure_monotonic(&source.name, x_dim, &source_x)?;
    ensure_monotonic(&source.name, y_dim, &source_y)?;

    let x_stencils = stencils(&source_x, &target_x, config.method);
    let y_stencils = stencils(&source_y, &target_y, config.method);

    let data_vars: BTreeMap<String, Variable> = source
        .data_vars
        .par_iter()
        .map(|(name, var)| {
            let x_pos = var.dim_index(x_dim);
            let y_pos = var.dim_index(y_dim);
            if x_pos.is_none() && y_pos.is_none() {
                return (name.clone(), var.clone());
            }
            tracing::debug!("Interpolating '{}' {:?}", name, var.shape());
            let resampled = resample_variable(var, (x_pos, &x_stencils), (y_pos, &y_stencils));
            (name.clone(), resampled)
        })
        .collect();

    let mut coords: BTreeMap<String, Variable> = source
        .coords
        .iter()
        .filter(|(name, _)| name.as_str() != x_dim && name.as_str() != y_dim)
        .map(|(name, var)| (name.clone(), var.clone()))
        .collect();
    for dim in [x_dim, y_dim] {
        let coord = match target.coords.get(dim) {
            Some(coord) => coord.clone(),
            None => Variable::from_axis(dim, target.axis(dim)?),
        };
        coords.insert(dim.to_string(), coord);
    }

    let mut dims = source.dims.clone();
    dims.insert(x_dim.to_string(), target_x.len());
    dims.insert(y_dim.to_string(), target_y.len());

    Ok(Dataset {
        name: source.name.clone(),
        dims,
        coords,
        data_vars,
        attrs: source.attrs.clone(),
    })
}

fn resample_variable(
    var: &Variable,
    x: (Option<usize>, &AxisStencils),
    y: (Option<usize>, &AxisStencils),
) -> Variable {
    let mut out_shape = var.shape().to_vec();
    for (pos, stencils) in [x, y] {
        if let Some(p) = pos {
            out_shape[p] = stencils.len();
        }
    }

    let data = ArrayD::from_shape_fn(IxDyn(&out_shape), |idx| {
        let mut src_idx = idx.slice().to_vec();
        sample(&var.data, &mut src_idx, x, y)
    });

    Variable { dims: var.dims.clone(), data, attrs: var.attrs.clone() }
}

/// Weighted sum of the source cells around one target point.
fn sample(
    data: &ArrayD<f64>,
    idx: &mut [usize],
    x: (Option<usize>, &AxisStencils),
    y: (Option<usize>, &AxisStencils),
) -> f64 {
    let x_terms = match axis_terms(idx, x) {
        Some(terms) => terms,
        None => return f64::NAN,
    };
    let y_terms = match axis_terms(idx, y) {
        Some(terms) => terms,
        None => return f64::NAN,
    };

    let mut total = 0.0;
    for &(yi, wy) in &y_terms {
        for &(xi, wx) in &x_terms {
            if let Some(p) = y.0 {
                idx[p] = yi;
            }
            if let Some(p) = x.0 {
                idx[p] = xi;
            }
            total += wy * wx * data[&idx[..]];
        }
    }
    total
}

/// Terms along one axis for the target index in `idx`. An absent axis
/// contributes a single unit weight at the existing index.
fn axis_terms(idx: &[usize], axis: (Option<usize>, &AxisStencils)) -> Option<Vec<(usize, f64)>> {
    match axis.0 {
        None => Some(vec![(0, 1.0)]),
        Some(p) => axis.1[idx[p]].map(|s| s.terms().collect()),
    }
}

fn stencils(source: &[f64], target: &[f64], method: InterpolationMethod) -> AxisStencils {
    target
        .iter()
        .map(|&v| match method {
            InterpolationMethod::Linear => linear_stencil(source, v),
            InterpolationMethod::Nearest => nearest_stencil(source, v),
        })
        .collect()
}

/// Bracketing cells for `v` on a strictly monotonic axis, ascending or descending.
fn linear_stencil(axis: &[f64], v: f64) -> Option<Stencil> {
    if !v.is_finite() || axis.is_empty() {
        return None;
    }
    let n = axis.len();
    if n == 1 {
        return (axis[0] == v).then(|| Stencil::exact(0));
    }

    let ascending = axis[1] > axis[0];
    let (min, max) = if ascending { (axis[0], axis[n - 1]) } else { (axis[n - 1], axis[0]) };
    if v < min || v > max {
        return None;
    }

    // Number of leading cells on or before `v`; at least one since `v` is in range.
    let count = if ascending {
        axis.partition_point(|&a| a <= v)
    } else {
        axis.partition_point(|&a| a >= v)
    };
    let lo = count - 1;
    if axis[lo] == v {
        return Some(Stencil::exact(lo));
    }
    let hi = lo + 1;
    let frac = (v - axis[lo]) / (axis[hi] - axis[lo]);
    Some(Stencil { lo, hi, frac })
}

fn nearest_stencil(axis: &[f64], v: f64) -> Option<Stencil> {
    let bracket = linear_stencil(axis, v)?;
    let index = if bracket.frac > 0.5 { bracket.hi } else { bracket.lo };
    Some(Stencil::exact(index))
}

fn ensure_monotonic(dataset: &str, axis: &str, values: &[f64]) -> Result<(), GridError> {
    let ascending = values.windows(2).all(|w| w[1] > w[0]);
    let descending = values.windows(2).all(|w| w[1] < w[0]);
    if ascending || descending {
        Ok(())
    } else {
        Err(GridError::NotMonotonic { dataset: dataset.to_string(), axis: axis.to_string() })
    }
}
