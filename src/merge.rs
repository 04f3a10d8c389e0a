//! Dataset merging with an override conflict policy
//!
//! Inputs are folded in order. A coordinate, data variable or attribute that
//! appears in more than one input takes the value from the last input that
//! carries it. Values are never compared or averaged.

use crate::grid::Dataset;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MergeError {
    #[error("nothing to merge")]
    Empty,

    #[error(
        "dimension '{dim}' has size {expected} but variable '{variable}' from '{dataset}' has size {actual}"
    )]
    DimensionConflict { dim: String, expected: usize, actual: usize, variable: String, dataset: String },
}

/// Merge `datasets` in order; later inputs override earlier ones.
///
/// Fails when the surviving variables disagree on the length of a shared
/// dimension, since no single combined grid can hold them.
pub fn merge(datasets: &[&Dataset]) -> Result<Dataset, MergeError> {
    let Some(first) = datasets.first() else {
        return Err(MergeError::Empty);
    };

    let mut combined = Dataset::new(first.name.clone());
    // Tracks which input each surviving variable came from, for diagnostics.
    let mut origin: BTreeMap<String, String> = BTreeMap::new();

    for dataset in datasets {
        for (name, len) in &dataset.dims {
            combined.dims.insert(name.clone(), *len);
        }
        for (name, coord) in &dataset.coords {
            if combined.data_vars.remove(name).is_some() {
                tracing::debug!("Coordinate '{}' from '{}' replaces a data variable", name, dataset.name);
            }
            combined.coords.insert(name.clone(), coord.clone());
            origin.insert(name.clone(), dataset.name.clone());
        }
        for (name, var) in &dataset.data_vars {
            if combined.contains(name) {
                tracing::debug!("Variable '{}' overridden by '{}'", name, dataset.name);
            }
            combined.coords.remove(name);
            combined.data_vars.insert(name.clone(), var.clone());
            origin.insert(name.clone(), dataset.name.clone());
        }
        for (name, value) in &dataset.attrs {
            combined.attrs.insert(name.clone(), value.clone());
        }
    }

    check_dimensions(&combined, &origin)?;
    combined.name = datasets.iter().map(|d| d.name.as_str()).collect::<Vec<_>>().join(" + ");
    tracing::info!(
        "Merged {} datasets into {} variables",
        datasets.len(),
        combined.variable_names().len()
    );
    Ok(combined)
}

fn check_dimensions(combined: &Dataset, origin: &BTreeMap<String, String>) -> Result<(), MergeError> {
    for (name, var) in combined.coords.iter().chain(combined.data_vars.iter()) {
        for (dim, &actual) in var.dims.iter().zip(var.shape()) {
            let expected = combined.dims.get(dim).copied().unwrap_or(actual);
            if expected != actual {
                return Err(MergeError::DimensionConflict {
                    dim: dim.clone(),
                    expected,
                    actual,
                    variable: name.clone(),
                    dataset: origin.get(name).cloned().unwrap_or_default(),
                });
            }
        }
    }
    Ok(())
}
