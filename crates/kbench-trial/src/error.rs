//! Trial driver error types.
//!
//! Timeouts are not errors; they are recorded in the trial. Everything
//! here aborts the run.

use std::time::Duration;

use kbench_cluster::ClusterError;
use thiserror::Error;

/// Errors that end a measurement run.
#[derive(Debug, Error)]
pub enum TrialError {
    #[error("failed to {action}: {source}")]
    Trigger {
        action: &'static str,
        #[source]
        source: ClusterError,
    },

    #[error("control plane unreachable during {phase}: all {polls} reads failed")]
    Unreachable { phase: &'static str, polls: u32 },

    #[error("instances not ready within {0:?}")]
    NotReady(Duration),

    #[error("control plane error: {0}")]
    Cluster(#[from] ClusterError),
}

pub type TrialResult<T> = Result<T, TrialError>;
