//! kbench-core — shared types for the transition-timing harness.
//!
//! Holds the data model every other crate speaks (managed resources,
//! instance snapshots, trials), the `kbench.toml` configuration, and
//! Kubernetes resource quantity parsing.

pub mod config;
pub mod quantity;
pub mod types;

pub use config::BenchConfig;
pub use quantity::{QuantityError, parse_cpu_millis, parse_memory_mib};
pub use types::*;
