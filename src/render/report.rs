//! Console summaries and the JSON report of a combined dataset.

use crate::domain::{InputPaths, REPORT_SCHEMA_VERSION};
use crate::grid::{Dataset, Variable};
use anyhow::Result;
use chrono::Utc;
use console::style;
use serde_json::{json, Map, Value};
use std::fmt::Write as _;
use std::path::Path;

/// `{name: size, ...}` mapping of a dataset's dimensions.
pub fn format_dims(dataset: &Dataset) -> String {
    let parts: Vec<String> = dataset.dims.iter().map(|(name, len)| format!("{name}: {len}")).collect();
    format!("{{{}}}", parts.join(", "))
}

pub fn print_dimensions(label: &str, dataset: &Dataset) {
    println!("{}", style(format!("{label} dimensions:")).bold());
    println!("{}", format_dims(dataset));
}

pub fn print_dataset(label: &str, dataset: &Dataset) {
    println!("{}", style(format!("{label}:")).bold());
    print!("{}", format_dataset(dataset));
}

pub fn print_variables(label: &str, dataset: &Dataset) {
    println!("{}", style(format!("{label}:")).bold());
    print!("{}", format_variables(dataset));
}

/// Multi-line summary: dimensions, coordinates, data variables and attributes.
pub fn format_dataset(dataset: &Dataset) -> String {
    let mut out = String::new();
    let dims: Vec<String> = dataset.dims.iter().map(|(name, len)| format!("{name}: {len}")).collect();
    let _ = writeln!(out, "<Dataset '{}'>", dataset.name);
    let _ = writeln!(out, "Dimensions:  ({})", dims.join(", "));

    let width = dataset.variable_names().iter().map(|n| n.len()).max().unwrap_or(0);
    let _ = writeln!(out, "Coordinates:");
    for (name, var) in &dataset.coords {
        let marker = if dataset.dims.contains_key(name) { "*" } else { " " };
        let _ = writeln!(out, "  {marker} {name:<width$} {}", describe(var));
    }
    let _ = writeln!(out, "Data variables:");
    for (name, var) in &dataset.data_vars {
        let _ = writeln!(out, "    {name:<width$} {}", describe(var));
    }
    if !dataset.attrs.is_empty() {
        let _ = writeln!(out, "Attributes:");
        for (name, value) in &dataset.attrs {
            let _ = writeln!(out, "    {name}: {value}");
        }
    }
    out
}

/// One line per variable with its dimensions and shape.
pub fn format_variables(dataset: &Dataset) -> String {
    let mut out = String::new();
    for name in dataset.variable_names() {
        if let Some(var) = dataset.get(name) {
            let _ = writeln!(out, "  {name}: ({}) {:?}", var.dims.join(", "), var.shape());
        }
    }
    out
}

fn describe(var: &Variable) -> String {
    let range = match var.finite_range() {
        Some((lo, hi)) => format!("{} .. {}", trim_float(lo), trim_float(hi)),
        None => "all missing".to_string(),
    };
    format!("({}) float64 {:?} {}", var.dims.join(", "), var.shape(), range)
}

fn trim_float(v: f64) -> String {
    let rounded = (v * 1e4).round() / 1e4;
    rounded.to_string()
}

/// Write a JSON description of `combined` to `report_path`.
pub fn write_report(
    report_path: &Path,
    combined: &Dataset,
    inputs: &InputPaths,
    config: &Value,
    include_timestamp: bool,
) -> Result<()> {
    let variables: Map<String, Value> = combined
        .coords
        .iter()
        .chain(combined.data_vars.iter())
        .map(|(name, var)| (name.clone(), variable_entry(var)))
        .collect();

    let mut report = Map::new();
    report.insert("schema_version".to_string(), Value::String(REPORT_SCHEMA_VERSION.to_string()));
    if include_timestamp {
        report.insert(
            "generated_at".to_string(),
            Value::String(Utc::now().format("%Y-%m-%dT%H:%M:%S+00:00").to_string()),
        );
    }
    report.insert(
        "inputs".to_string(),
        json!({
            "base": inputs.base.display().to_string(),
            "concentration": inputs.concentration.display().to_string(),
            "thickness": inputs.thickness.display().to_string(),
        }),
    );
    report.insert("config".to_string(), config.clone());
    report.insert("dims".to_string(), serde_json::to_value(&combined.dims)?);
    report.insert("attributes".to_string(), serde_json::to_value(&combined.attrs)?);
    report.insert("variables".to_string(), Value::Object(variables));

    if let Some(parent) = report_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(report_path, serde_json::to_string_pretty(&Value::Object(report))?)?;
    Ok(())
}

fn variable_entry(var: &Variable) -> Value {
    let (min, max) = match var.finite_range() {
        Some((lo, hi)) => (json!(lo), json!(hi)),
        None => (Value::Null, Value::Null),
    };
    json!({
        "dims": var.dims,
        "shape": var.shape(),
        "valid_count": var.valid_count(),
        "min": min,
        "max": max,
    })
}
