//! kbench-stats — turns finished measurements into numbers and files.
//!
//! Everything here is a pure function over already-collected data or a
//! plain file write; nothing talks to the cluster.

pub mod aggregate;
pub mod footprint;
pub mod load;
pub mod report;

pub use aggregate::{Stats, Summary, summarize};
pub use footprint::{Constraint, Density, Footprint, measure_footprint, project_density};
pub use load::{LoadComparison, LoadProfile, LoadSummary};
pub use report::{
    RunDirectory, SampleSummary, format_footprint_report, format_trial_report, write_samples_csv,
};
