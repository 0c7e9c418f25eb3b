//! Shared types used across kbench crates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Control-plane kind that owns the replica count of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceKind {
    /// SpinKube `SpinApp` custom resource (Wasm substrate).
    SpinApp,
    /// Plain `apps/v1` Deployment (container substrate).
    Deployment,
}

impl ResourceKind {
    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::SpinApp => "SpinApp",
            ResourceKind::Deployment => "Deployment",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The object whose replica count the harness drives.
///
/// Built once by the detector and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedResource {
    pub kind: ResourceKind,
    pub name: String,
    pub namespace: String,
    /// Label selector matching the resource's instances, e.g. `app=api`.
    pub selector: String,
}

/// Tri-state value of an instance's `Ready` condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadyCondition {
    True,
    False,
    Unknown,
}

impl ReadyCondition {
    pub fn is_true(&self) -> bool {
        *self == ReadyCondition::True
    }
}

/// One running instance as seen by a single poll.
///
/// Snapshots are rebuilt on every poll and dropped after one comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    pub identity: String,
    pub ready: ReadyCondition,
    pub terminating: bool,
    pub observed_at_ms: u64,
}

impl Instance {
    /// Ready and not on its way out.
    pub fn is_serving(&self) -> bool {
        self.ready.is_true() && !self.terminating
    }
}

/// Resource requests declared by one instance's containers, as raw
/// quantity strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredInstance {
    pub identity: String,
    pub cpu_requests: Vec<String>,
    pub memory_requests: Vec<String>,
}

/// One request issued while an availability trial was in flight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RequestSample {
    /// Wall-clock send time, milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
    /// HTTP status, or 0 when no response arrived.
    pub status_code: u16,
    pub latency_ms: f64,
}

impl RequestSample {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// The two transitions the harness measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionKind {
    /// Scale 0 → 1 and wait for the first ready instance.
    ColdStart,
    /// Force-delete a serving instance and wait for a ready replacement.
    Availability,
}

impl TransitionKind {
    pub fn label(&self) -> &'static str {
        match self {
            TransitionKind::ColdStart => "cold-start",
            TransitionKind::Availability => "availability",
        }
    }
}

/// Result of a single trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrialOutcome {
    Completed { elapsed_ms: u64 },
    TimedOut,
}

impl TrialOutcome {
    pub fn elapsed_ms(&self) -> Option<u64> {
        match self {
            TrialOutcome::Completed { elapsed_ms } => Some(*elapsed_ms),
            TrialOutcome::TimedOut => None,
        }
    }
}

impl fmt::Display for TrialOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrialOutcome::Completed { elapsed_ms } => write!(f, "{elapsed_ms} ms"),
            TrialOutcome::TimedOut => f.write_str("timeout"),
        }
    }
}

/// One measured transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trial {
    /// 1-based position within the run.
    pub index: u32,
    pub triggered_at_ms: u64,
    pub completed_at_ms: Option<u64>,
    pub outcome: TrialOutcome,
}

impl Trial {
    pub fn completed(index: u32, triggered_at_ms: u64, completed_at_ms: u64) -> Self {
        Self {
            index,
            triggered_at_ms,
            completed_at_ms: Some(completed_at_ms),
            outcome: TrialOutcome::Completed {
                elapsed_ms: completed_at_ms.saturating_sub(triggered_at_ms),
            },
        }
    }

    pub fn timed_out(index: u32, triggered_at_ms: u64) -> Self {
        Self {
            index,
            triggered_at_ms,
            completed_at_ms: None,
            outcome: TrialOutcome::TimedOut,
        }
    }
}

/// Ordered trials of one run for one transition kind.
///
/// Holds exactly `expected` trials once the run finishes; `push` refuses
/// anything past that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialSet {
    kind: TransitionKind,
    expected: u32,
    trials: Vec<Trial>,
}

impl TrialSet {
    pub fn new(kind: TransitionKind, expected: u32) -> Self {
        Self {
            kind,
            expected,
            trials: Vec::with_capacity(expected as usize),
        }
    }

    /// Append the next trial. Returns `false` if the set is already full.
    pub fn push(&mut self, trial: Trial) -> bool {
        if self.is_complete() {
            return false;
        }
        self.trials.push(trial);
        true
    }

    pub fn kind(&self) -> TransitionKind {
        self.kind
    }

    pub fn expected(&self) -> u32 {
        self.expected
    }

    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.trials.len() >= self.expected as usize
    }

    pub fn trials(&self) -> &[Trial] {
        &self.trials
    }

    pub fn into_trials(self) -> Vec<Trial> {
        self.trials
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completed_trial_computes_elapsed() {
        let trial = Trial::completed(1, 1_000, 1_250);
        assert_eq!(trial.outcome, TrialOutcome::Completed { elapsed_ms: 250 });
        assert_eq!(trial.outcome.elapsed_ms(), Some(250));
    }

    #[test]
    fn timed_out_trial_has_no_elapsed() {
        let trial = Trial::timed_out(2, 1_000);
        assert_eq!(trial.completed_at_ms, None);
        assert_eq!(trial.outcome.elapsed_ms(), None);
        assert_eq!(trial.outcome.to_string(), "timeout");
    }

    #[test]
    fn trial_set_refuses_overflow() {
        let mut set = TrialSet::new(TransitionKind::ColdStart, 2);
        assert!(set.push(Trial::completed(1, 0, 10)));
        assert!(set.push(Trial::timed_out(2, 20)));
        assert!(set.is_complete());
        assert!(!set.push(Trial::completed(3, 30, 40)));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn serving_requires_ready_and_not_terminating() {
        let mut inst = Instance {
            identity: "api-0".to_string(),
            ready: ReadyCondition::True,
            terminating: false,
            observed_at_ms: 0,
        };
        assert!(inst.is_serving());

        inst.terminating = true;
        assert!(!inst.is_serving());

        inst.terminating = false;
        inst.ready = ReadyCondition::Unknown;
        assert!(!inst.is_serving());
    }
}
