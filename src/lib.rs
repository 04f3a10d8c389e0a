//! seaice-merge: align sea-ice grids onto a common grid, merge and plot them
//!
//! The pipeline loads a base grid plus a concentration and a thickness
//! product, resamples both products onto the base grid's x/y axes, merges
//! all three with later inputs overriding earlier ones, then reports on and
//! plots the combined dataset.

pub mod cli;
pub mod config;
pub mod domain;
pub mod grid;
pub mod io;
pub mod merge;
pub mod pipeline;
pub mod render;
pub mod resample;

mod test_utils;
