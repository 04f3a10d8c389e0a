//! Output rendering (console summaries, JSON report, figures)

pub mod colormap;
pub mod plot;
pub mod report;

pub use plot::{plot, PlotError, PlotOutcome};
pub use report::write_report;
