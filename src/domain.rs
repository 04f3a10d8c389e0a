//! Core configuration types shared by the pipeline stages.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

pub const REPORT_SCHEMA_VERSION: &str = "1.0.0";

/// Interpolation used when a source grid is resampled onto the base grid axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationMethod {
    #[default]
    Linear,
    Nearest,
}

impl fmt::Display for InterpolationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear => write!(f, "linear"),
            Self::Nearest => write!(f, "nearest"),
        }
    }
}

impl std::str::FromStr for InterpolationMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(Self::Linear),
            "nearest" => Ok(Self::Nearest),
            other => Err(format!("Invalid interpolation method: {other} (expected linear or nearest)")),
        }
    }
}

/// Named sequential colormaps available to plot panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColormapName {
    #[serde(alias = "Blues")]
    Blues,
    #[serde(alias = "Greens")]
    Greens,
    #[serde(alias = "Greys")]
    Greys,
    #[serde(alias = "Reds")]
    Reds,
}

/// Paths of the three input datasets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputPaths {
    /// Base grid; its x/y axes are the resampling target.
    pub base: PathBuf,
    /// Second sea-ice concentration product.
    pub concentration: PathBuf,
    /// Sea-ice thickness product.
    pub thickness: PathBuf,
}

impl Default for InputPaths {
    fn default() -> Self {
        Self {
            base: PathBuf::from("NSIDC0081_SEAICE_PS_S25km_20240820_v2.0.nc"),
            concentration: PathBuf::from("NSIDC0081_SEAICE_PS_N25km_20240820_v2.0.nc"),
            thickness: PathBuf::from("RDEFT4_20240515.nc"),
        }
    }
}

/// Grid alignment settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Name of the horizontal axis dimension.
    pub x_dim: String,
    /// Name of the vertical axis dimension.
    pub y_dim: String,
    pub method: InterpolationMethod,
    /// Downgrade hemisphere and extent incompatibilities to warnings.
    pub allow_hemisphere_mismatch: bool,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            x_dim: "x".to_string(),
            y_dim: "y".to_string(),
            method: InterpolationMethod::Linear,
            allow_hemisphere_mismatch: false,
        }
    }
}

/// One panel of the output figure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelConfig {
    /// Variable in the combined dataset to draw.
    pub variable: String,
    pub title: String,
    pub colormap: ColormapName,
    pub colorbar_label: String,
    /// Index selected along the variable's leading dimension, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leading_index: Option<usize>,
}

/// Figure settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    pub enabled: bool,
    /// PNG file the figure is written to.
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    /// TrueType font used for labels. Discovered from common system
    /// locations when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<PathBuf>,
    /// Variables whose presence is reported before plotting.
    pub expected_variables: Vec<String>,
    pub panels: Vec<PanelConfig>,
}

impl PlotConfig {
    /// Variables named by the presence check: the expected list, then any
    /// panel variable not already in it.
    pub fn checked_variables(&self) -> Vec<String> {
        let mut names = self.expected_variables.clone();
        for panel in &self.panels {
            if !names.contains(&panel.variable) {
                names.push(panel.variable.clone());
            }
        }
        names
    }
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            output: PathBuf::from("sea_ice.png"),
            width: 1200,
            height: 600,
            font: None,
            expected_variables: vec![
                "F16_ICECON".to_string(),
                "sea_ice_thickness".to_string(),
                "ice_con".to_string(),
            ],
            panels: vec![
                PanelConfig {
                    variable: "F16_ICECON".to_string(),
                    title: "Sea Ice Concentration".to_string(),
                    colormap: ColormapName::Blues,
                    colorbar_label: "Concentration".to_string(),
                    leading_index: Some(0),
                },
                PanelConfig {
                    variable: "sea_ice_thickness".to_string(),
                    title: "Sea Ice Thickness".to_string(),
                    colormap: ColormapName::Greens,
                    colorbar_label: "Thickness (m)".to_string(),
                    leading_index: None,
                },
            ],
        }
    }
}

/// Full run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub inputs: InputPaths,
    pub grid: GridConfig,
    pub plot: PlotConfig,
    /// JSON report of the combined dataset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<PathBuf>,
    /// NetCDF copy of the combined dataset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_combined: Option<PathBuf>,
    pub include_timestamp: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            inputs: InputPaths::default(),
            grid: GridConfig::default(),
            plot: PlotConfig::default(),
            report: None,
            save_combined: None,
            include_timestamp: true,
        }
    }
}
