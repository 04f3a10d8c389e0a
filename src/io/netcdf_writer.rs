//! NetCDF writer for in-memory datasets.
//!
//! Everything is written as `f64`. Missing cells stay NaN; no packing is applied.

use crate::grid::{AttrValue, Dataset, Variable};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("failed to create {}: {source}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: netcdf::Error,
    },

    #[error("failed to write '{item}' to {}: {source}", path.display())]
    Write {
        path: PathBuf,
        item: String,
        #[source]
        source: netcdf::Error,
    },
}

/// Write `dataset` to a new NetCDF file at `path`, replacing any existing file.
pub fn write_dataset(path: &Path, dataset: &Dataset) -> Result<(), SaveError> {
    let mut file = netcdf::create(path)
        .map_err(|source| SaveError::Create { path: path.to_path_buf(), source })?;
    let fail = |item: &str| {
        let path = path.to_path_buf();
        let item = item.to_string();
        move |source| SaveError::Write { path, item, source }
    };

    for (name, len) in &dataset.dims {
        file.add_dimension(name, *len).map_err(fail(name.as_str()))?;
    }
    for (name, value) in &dataset.attrs {
        file.add_attribute(name, to_netcdf(value)).map_err(fail(name.as_str()))?;
    }

    for (name, variable) in dataset.coords.iter().chain(dataset.data_vars.iter()) {
        write_variable(&mut file, name, variable).map_err(fail(name.as_str()))?;
    }

    tracing::info!("Wrote {} ({} variables)", path.display(), dataset.variable_names().len());
    Ok(())
}

fn write_variable(
    file: &mut netcdf::FileMut,
    name: &str,
    variable: &Variable,
) -> Result<(), netcdf::Error> {
    let dims: Vec<&str> = variable.dims.iter().map(String::as_str).collect();
    let mut nc_var = file.add_variable::<f64>(name, &dims)?;
    for (attr, value) in &variable.attrs {
        nc_var.put_attribute(attr, to_netcdf(value))?;
    }
    let values: Vec<f64> = variable.data.iter().copied().collect();
    nc_var.put_values(&values, ..)?;
    Ok(())
}

fn to_netcdf(value: &AttrValue) -> netcdf::AttributeValue {
    match value {
        AttrValue::Number(v) => netcdf::AttributeValue::Double(*v),
        AttrValue::Numbers(values) => netcdf::AttributeValue::Doubles(values.clone()),
        AttrValue::Text(s) => netcdf::AttributeValue::Str(s.clone()),
        AttrValue::Texts(values) => netcdf::AttributeValue::Str(values.join(", ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::open_dataset;
    use crate::test_utils::{field_3d, grid};
    use tempfile::TempDir;

    #[test]
    fn written_dataset_reads_back() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("combined.nc");
        let ds = grid("combined", vec![0.0, 1.0], vec![5.0, 4.0, 3.0])
            .with_variable("F16_ICECON", field_3d(1, 3, 2, |_, y, x| if x == 1 { f64::NAN } else { y as f64 }))
            .with_attr("title", AttrValue::Text("merged".into()));

        write_dataset(&path, &ds).expect("write");
        let back = open_dataset(&path).expect("read");

        assert_eq!(back.dims, ds.dims);
        assert_eq!(back.attrs.get("title"), Some(&AttrValue::Text("merged".into())));
        let ice = back.data_vars.get("F16_ICECON").expect("ice");
        assert_eq!(ice.dims, vec!["time", "y", "x"]);
        assert_eq!(ice.data[[0, 2, 0]], 2.0);
        assert!(ice.data[[0, 2, 1]].is_nan());
        assert_eq!(back.axis("y").expect("y"), vec![5.0, 4.0, 3.0]);
    }
}
