//! Dataset loading and saving

pub mod netcdf_reader;
pub mod netcdf_writer;

pub use netcdf_reader::{open_dataset, LoadError};
pub use netcdf_writer::write_dataset;
