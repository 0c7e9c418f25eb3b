//! Descriptive statistics over a finished trial set.
//!
//! Timeouts are counted, never folded into the numbers. With no completed
//! trial the statistics are absent rather than zero.

use serde::Serialize;

use kbench_core::{TransitionKind, TrialOutcome, TrialSet};

/// Numeric statistics over completed trials, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Stats {
    /// Unrounded mean; round only when displaying.
    pub mean_ms: f64,
    pub median_ms: f64,
    pub min_ms: u64,
    pub max_ms: u64,
}

/// Outcome of aggregating one trial set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub kind: TransitionKind,
    /// Every trial's outcome in run order.
    pub outcomes: Vec<TrialOutcome>,
    /// Completed trials.
    pub samples: usize,
    pub timeouts: usize,
    pub stats: Option<Stats>,
}

impl Summary {
    pub fn from_outcomes(kind: TransitionKind, outcomes: Vec<TrialOutcome>) -> Self {
        let mut values: Vec<u64> = outcomes.iter().filter_map(TrialOutcome::elapsed_ms).collect();
        let timeouts = outcomes.len() - values.len();
        values.sort_unstable();

        let stats = if values.is_empty() {
            None
        } else {
            let sum: u64 = values.iter().sum();
            let mid = values.len() / 2;
            let median_ms = if values.len() % 2 == 0 {
                (values[mid - 1] + values[mid]) as f64 / 2.0
            } else {
                values[mid] as f64
            };
            Some(Stats {
                mean_ms: sum as f64 / values.len() as f64,
                median_ms,
                min_ms: values[0],
                max_ms: values[values.len() - 1],
            })
        };

        Self {
            kind,
            samples: values.len(),
            timeouts,
            stats,
            outcomes,
        }
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }
}

/// Consume a trial set and compute its summary.
pub fn summarize(set: TrialSet) -> Summary {
    let kind = set.kind();
    let outcomes = set.into_trials().into_iter().map(|t| t.outcome).collect();
    Summary::from_outcomes(kind, outcomes)
}
