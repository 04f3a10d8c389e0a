#[cfg(test)]
pub use utils::*;

#[cfg(test)]
mod utils {
    use crate::grid::{AttrValue, Dataset, Hemisphere, Variable};
    use ndarray::{Array2, Array3};

    /// Evenly spaced coordinates `0, 1, .., n - 1`.
    pub fn axis(n: usize) -> Vec<f64> {
        (0..n).map(|i| i as f64).collect()
    }

    /// Dataset with only `x` and `y` coordinates.
    pub fn grid(name: &str, x: Vec<f64>, y: Vec<f64>) -> Dataset {
        Dataset::new(name).with_coord("x", x).with_coord("y", y)
    }

    /// Tag a dataset with global latitude bounds for one hemisphere.
    pub fn with_hemisphere(dataset: Dataset, hemisphere: Hemisphere) -> Dataset {
        let (lo, hi) = match hemisphere {
            Hemisphere::North => (30.98, 90.0),
            Hemisphere::South => (-90.0, -39.23),
            Hemisphere::Unknown => return dataset,
        };
        dataset
            .with_attr("geospatial_lat_min", AttrValue::Number(lo))
            .with_attr("geospatial_lat_max", AttrValue::Number(hi))
    }

    /// `(y, x)` field filled from `f(y, x)`.
    pub fn field_2d(ny: usize, nx: usize, f: impl Fn(usize, usize) -> f64) -> Variable {
        let data = Array2::from_shape_fn((ny, nx), |(y, x)| f(y, x)).into_dyn();
        Variable::new(vec!["y".into(), "x".into()], data).expect("2-D field")
    }

    /// `(time, y, x)` field filled from `f(t, y, x)`.
    pub fn field_3d(nt: usize, ny: usize, nx: usize, f: impl Fn(usize, usize, usize) -> f64) -> Variable {
        let data = Array3::from_shape_fn((nt, ny, nx), |(t, y, x)| f(t, y, x)).into_dyn();
        Variable::new(vec!["time".into(), "y".into(), "x".into()], data).expect("3-D field")
    }
}
