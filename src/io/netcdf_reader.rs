//! NetCDF reader with CF decoding.
//!
//! Values are read as `f64`. Cells equal to `_FillValue` or `missing_value`
//! become NaN, then `scale_factor` and `add_offset` are applied. The encoding
//! attributes are dropped from the decoded variable so that merged datasets
//! do not carry stale packing parameters.

use crate::grid::{array_from_vec, AttrValue, Attributes, Dataset, Variable};
use std::path::{Path, PathBuf};
use thiserror::Error;

const ENCODING_ATTRS: [&str; 4] = ["_FillValue", "missing_value", "scale_factor", "add_offset"];

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: netcdf::Error,
    },

    #[error("variable '{variable}' in {} has {len} values, expected shape {shape:?}", path.display())]
    Shape { path: PathBuf, variable: String, len: usize, shape: Vec<usize> },
}

/// Open a NetCDF file and decode every numeric variable into a [`Dataset`].
pub fn open_dataset(path: &Path) -> Result<Dataset, LoadError> {
    let file = netcdf::open(path)
        .map_err(|source| LoadError::Open { path: path.to_path_buf(), source })?;

    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("dataset").to_string();
    let mut dataset = Dataset::new(name);

    for dim in file.dimensions() {
        dataset.dims.insert(dim.name(), dim.len());
    }
    dataset.attrs = read_attributes(file.attributes());

    for var in file.variables() {
        let var_name = var.name();
        let dims: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
        let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();

        let raw: Vec<f64> = match var.get_values::<f64, _>(..) {
            Ok(values) => values,
            Err(err) => {
                // Character and string variables cannot be read as numbers.
                tracing::debug!("Skipping non-numeric variable '{}': {}", var_name, err);
                continue;
            }
        };

        let mut attrs = read_attributes(var.attributes());
        let values = decode_values(raw, &attrs);
        for key in ENCODING_ATTRS {
            attrs.remove(key);
        }

        let len = values.len();
        let data = array_from_vec(&shape, values).ok_or_else(|| LoadError::Shape {
            path: path.to_path_buf(),
            variable: var_name.clone(),
            len,
            shape: shape.clone(),
        })?;
        let variable = Variable { dims: dims.clone(), data, attrs };

        if dims.len() == 1 && dims[0] == var_name {
            dataset.coords.insert(var_name, variable);
        } else {
            dataset.data_vars.insert(var_name, variable);
        }
    }

    tracing::info!(
        "Loaded {} ({} dims, {} coords, {} data variables)",
        path.display(),
        dataset.dims.len(),
        dataset.coords.len(),
        dataset.data_vars.len()
    );
    Ok(dataset)
}

/// Apply CF masking and unpacking to raw stored values.
pub(crate) fn decode_values(raw: Vec<f64>, attrs: &Attributes) -> Vec<f64> {
    let mut missing: Vec<f64> = Vec::new();
    for key in ["_FillValue", "missing_value"] {
        if let Some(value) = attrs.get(key) {
            missing.extend(value.as_f64_list());
        }
    }
    let scale = attrs.get("scale_factor").and_then(AttrValue::as_f64).unwrap_or(1.0);
    let offset = attrs.get("add_offset").and_then(AttrValue::as_f64).unwrap_or(0.0);

    raw.into_iter()
        .map(|v| {
            if v.is_nan() || missing.iter().any(|m| *m == v) {
                f64::NAN
            } else {
                v * scale + offset
            }
        })
        .collect()
}

fn read_attributes<'a>(attributes: impl Iterator<Item = netcdf::Attribute<'a>>) -> Attributes {
    let mut out = Attributes::new();
    for attr in attributes {
        match attr.value() {
            Ok(value) => {
                if let Some(decoded) = convert_attribute(value) {
                    out.insert(attr.name().to_string(), decoded);
                }
            }
            Err(err) => tracing::debug!("Skipping unreadable attribute '{}': {}", attr.name(), err),
        }
    }
    out
}

fn convert_attribute(value: netcdf::AttributeValue) -> Option<AttrValue> {
    use netcdf::AttributeValue as A;

    fn many<T: Into<f64>>(values: Vec<T>) -> AttrValue {
        AttrValue::Numbers(values.into_iter().map(Into::into).collect())
    }

    let converted = match value {
        A::Uchar(v) => AttrValue::Number(v.into()),
        A::Schar(v) => AttrValue::Number(v.into()),
        A::Ushort(v) => AttrValue::Number(v.into()),
        A::Short(v) => AttrValue::Number(v.into()),
        A::Uint(v) => AttrValue::Number(v.into()),
        A::Int(v) => AttrValue::Number(v.into()),
        A::Ulonglong(v) => AttrValue::Number(v as f64),
        A::Longlong(v) => AttrValue::Number(v as f64),
        A::Float(v) => AttrValue::Number(v.into()),
        A::Double(v) => AttrValue::Number(v),
        A::Uchars(v) => many(v),
        A::Schars(v) => many(v),
        A::Ushorts(v) => many(v),
        A::Shorts(v) => many(v),
        A::Uints(v) => many(v),
        A::Ints(v) => many(v),
        A::Ulonglongs(v) => AttrValue::Numbers(v.into_iter().map(|x| x as f64).collect()),
        A::Longlongs(v) => AttrValue::Numbers(v.into_iter().map(|x| x as f64).collect()),
        A::Floats(v) => many(v),
        A::Doubles(v) => AttrValue::Numbers(v),
        A::Str(s) => AttrValue::Text(s),
        A::Strs(v) => AttrValue::Texts(v),
        #[allow(unreachable_patterns)]
        _ => return None,
    };
    Some(converted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{detect_hemisphere, Hemisphere};
    use crate::io::write_dataset;
    use crate::test_utils::{field_2d, grid, with_hemisphere};
    use tempfile::TempDir;

    #[test]
    fn decode_masks_fill_then_unpacks() {
        let mut attrs = Attributes::new();
        attrs.insert("_FillValue".into(), AttrValue::Number(255.0));
        attrs.insert("scale_factor".into(), AttrValue::Number(0.004));
        attrs.insert("add_offset".into(), AttrValue::Number(0.0));
        let out = decode_values(vec![0.0, 250.0, 255.0], &attrs);
        assert_eq!(out[0], 0.0);
        approx::assert_relative_eq!(out[1], 1.0);
        assert!(out[2].is_nan());
    }

    #[test]
    fn decode_masks_every_missing_value_then_offsets() {
        let mut attrs = Attributes::new();
        attrs.insert("missing_value".into(), AttrValue::Numbers(vec![-1.0, -2.0]));
        attrs.insert("add_offset".into(), AttrValue::Number(10.0));
        let out = decode_values(vec![-1.0, -2.0, 3.0], &attrs);
        assert!(out[0].is_nan());
        assert!(out[1].is_nan());
        assert_eq!(out[2], 13.0);
    }

    #[test]
    fn decode_without_encoding_is_identity() {
        let out = decode_values(vec![1.5, -2.0], &Attributes::new());
        assert_eq!(out, vec![1.5, -2.0]);
    }

    #[test]
    fn open_dataset_reads_coords_and_variables() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("grid.nc");
        let thickness = field_2d(2, 3, |y, x| (y * 10 + x) as f64)
            .with_attr("units", AttrValue::Text("m".into()));
        let source = grid("source", vec![0.0, 1.0, 2.0], vec![10.0, 20.0]);
        let grid = with_hemisphere(source, Hemisphere::South)
            .with_variable("sea_ice_thickness", thickness);
        write_dataset(&path, &grid).expect("write nc");

        let ds = open_dataset(&path).expect("open");
        assert_eq!(ds.name, "grid.nc");
        assert_eq!(ds.dims.get("x"), Some(&3));
        assert_eq!(ds.dims.get("y"), Some(&2));
        assert!(ds.coords.contains_key("x"));
        assert!(ds.coords.contains_key("y"));

        let thickness = ds.data_vars.get("sea_ice_thickness").expect("thickness");
        assert_eq!(thickness.dims, vec!["y".to_string(), "x".to_string()]);
        assert_eq!(thickness.shape(), &[2, 3]);
        assert_eq!(thickness.data[[1, 2]], 12.0);
        assert_eq!(thickness.attrs.get("units"), Some(&AttrValue::Text("m".into())));
        assert_eq!(detect_hemisphere(&ds), Hemisphere::South);
    }

    #[test]
    fn open_dataset_masks_fill_cells() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("fill.nc");
        let ice = field_2d(2, 2, |y, x| if y == 0 && x == 0 { -999.0 } else { 0.5 })
            .with_attr("_FillValue", AttrValue::Number(-999.0))
            .with_attr("scale_factor", AttrValue::Number(2.0));
        let grid = grid("fill", vec![0.0, 1.0], vec![0.0, 1.0]).with_variable("ice", ice);
        write_dataset(&path, &grid).expect("write nc");

        let ds = open_dataset(&path).expect("open");
        let ice = ds.data_vars.get("ice").expect("ice");
        assert!(ice.data[[0, 0]].is_nan());
        assert_eq!(ice.data[[1, 1]], 1.0);
        assert!(!ice.attrs.contains_key("_FillValue"));
        assert!(!ice.attrs.contains_key("scale_factor"));
    }

    #[test]
    fn open_dataset_skips_string_variables() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("labels.nc");
        let grid = grid("labels", vec![0.0, 1.0], vec![0.0, 1.0])
            .with_variable("ice", field_2d(2, 2, |_, _| 0.5));
        write_dataset(&path, &grid).expect("write nc");
        {
            let mut file = netcdf::append(&path).expect("append");
            file.add_variable_with_type("station", &["x"], &netcdf::types::NcVariableType::String)
                .expect("string variable");
        }

        let ds = open_dataset(&path).expect("open");
        assert!(!ds.contains("station"));
        assert!(ds.data_vars.contains_key("ice"));
        assert_eq!(ds.dims.get("x"), Some(&2));
    }

    #[test]
    fn open_dataset_reports_missing_file() {
        let tmp = TempDir::new().expect("tmp");
        let err = open_dataset(&tmp.path().join("absent.nc")).unwrap_err();
        assert!(matches!(err, LoadError::Open { .. }));
        assert!(err.to_string().contains("absent.nc"));
    }
}
