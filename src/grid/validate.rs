//! Compatibility checks run before a source grid is resampled onto the base grid.
//!
//! Resampling only interpolates coordinate values; it never reprojects. Two
//! polar-stereographic grids from opposite hemispheres share plausible-looking
//! x/y values while describing different places, so the hemisphere is checked
//! explicitly along with the axis extents.

use super::{Dataset, GridError};
use crate::domain::GridConfig;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hemisphere {
    North,
    South,
    Unknown,
}

impl fmt::Display for Hemisphere {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::North => write!(f, "northern hemisphere"),
            Self::South => write!(f, "southern hemisphere"),
            Self::Unknown => write!(f, "unknown hemisphere"),
        }
    }
}

/// Infer the hemisphere a dataset covers from its metadata.
///
/// A grid-mapping `latitude_of_projection_origin` wins over the global
/// `geospatial_lat_min`/`geospatial_lat_max` bounds.
pub fn detect_hemisphere(dataset: &Dataset) -> Hemisphere {
    let origin = dataset
        .data_vars
        .values()
        .chain(dataset.coords.values())
        .find_map(|var| var.attrs.get("latitude_of_projection_origin"))
        .and_then(|v| v.as_f64());
    if let Some(lat) = origin {
        if lat > 0.0 {
            return Hemisphere::North;
        }
        if lat < 0.0 {
            return Hemisphere::South;
        }
    }

    let lat_min = dataset.attrs.get("geospatial_lat_min").and_then(|v| v.as_f64());
    let lat_max = dataset.attrs.get("geospatial_lat_max").and_then(|v| v.as_f64());
    match (lat_min, lat_max) {
        (Some(lo), Some(hi)) if lo >= 0.0 && hi > 0.0 => Hemisphere::North,
        (Some(lo), Some(hi)) if hi <= 0.0 && lo < 0.0 => Hemisphere::South,
        _ => Hemisphere::Unknown,
    }
}

/// Verify that `source` can be meaningfully resampled onto `target`.
///
/// Mismatched hemispheres and axes that do not overlap at all are errors
/// unless `allow_hemisphere_mismatch` is set, in which case they are logged.
pub fn check_compatibility(
    target: &Dataset,
    source: &Dataset,
    config: &GridConfig,
) -> Result<(), GridError> {
    let target_hemisphere = detect_hemisphere(target);
    let source_hemisphere = detect_hemisphere(source);
    tracing::debug!(
        "Hemispheres: '{}' = {}, '{}' = {}",
        target.name,
        target_hemisphere,
        source.name,
        source_hemisphere
    );

    if target_hemisphere == Hemisphere::Unknown || source_hemisphere == Hemisphere::Unknown {
        tracing::warn!(
            "Cannot confirm that '{}' and '{}' cover the same hemisphere",
            target.name,
            source.name
        );
    } else if target_hemisphere != source_hemisphere {
        let err = GridError::HemisphereMismatch {
            target: target.name.clone(),
            target_hemisphere,
            source_name: source.name.clone(),
            source_hemisphere,
        };
        if !config.allow_hemisphere_mismatch {
            return Err(err);
        }
        tracing::warn!("{}", err);
    }

    let mut covered = 1.0;
    for axis in [&config.x_dim, &config.y_dim] {
        let target_axis = target.axis(axis)?;
        let source_axis = source.axis(axis)?;
        let fraction = overlap_fraction(&target_axis, &source_axis);
        if fraction == 0.0 {
            let err = GridError::DisjointExtent {
                target: target.name.clone(),
                source_name: source.name.clone(),
                axis: axis.clone(),
            };
            if !config.allow_hemisphere_mismatch {
                return Err(err);
            }
            tracing::warn!("{}", err);
        }
        covered *= fraction;
    }

    if covered < 1.0 {
        tracing::warn!(
            "'{}' covers {:.1}% of the '{}' grid; uncovered cells will be missing",
            source.name,
            covered * 100.0,
            target.name
        );
    }
    Ok(())
}

/// Fraction of `target` coordinates that fall within the span of `source`.
fn overlap_fraction(target: &[f64], source: &[f64]) -> f64 {
    if target.is_empty() {
        return 1.0;
    }
    let Some((lo, hi)) = super::finite_range(source.iter().copied()) else {
        return 0.0;
    };
    let inside = target.iter().filter(|&&v| v >= lo && v <= hi).count();
    inside as f64 / target.len() as f64
}
