//! Trial phases and the per-snapshot decisions that move between them.
//!
//! Each predicate looks at exactly one snapshot and keeps nothing. The
//! replacement check is the one that matters: a deleted instance can keep
//! reporting Ready while terminating, and a list call can briefly return
//! it again after deletion, so the victim's identity is never accepted.

use kbench_core::Instance;

/// Phases of a cold-start (0 → 1) trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColdStartPhase {
    ScalingDown,
    Drained,
    Triggered,
    WaitingReady,
    Done,
    TimedOut,
}

impl ColdStartPhase {
    pub fn label(&self) -> &'static str {
        match self {
            ColdStartPhase::ScalingDown => "scaling-down",
            ColdStartPhase::Drained => "drained",
            ColdStartPhase::Triggered => "triggered",
            ColdStartPhase::WaitingReady => "waiting-ready",
            ColdStartPhase::Done => "done",
            ColdStartPhase::TimedOut => "timed-out",
        }
    }
}

/// Phases of a forced-delete recovery trial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvailabilityPhase {
    Stabilizing,
    IdentifyVictim,
    Triggered { victim: String },
    WaitingReplacementReady { victim: String },
    Done,
    TimedOut,
}

impl AvailabilityPhase {
    pub fn label(&self) -> &'static str {
        match self {
            AvailabilityPhase::Stabilizing => "stabilizing",
            AvailabilityPhase::IdentifyVictim => "identify-victim",
            AvailabilityPhase::Triggered { .. } => "triggered",
            AvailabilityPhase::WaitingReplacementReady { .. } => "waiting-replacement-ready",
            AvailabilityPhase::Done => "done",
            AvailabilityPhase::TimedOut => "timed-out",
        }
    }
}

/// Scale-down finished: nothing left, terminating or not.
pub fn is_drained(snapshot: &[Instance]) -> bool {
    snapshot.is_empty()
}

/// Cold start finished: some instance is ready and not terminating.
pub fn cold_start_ready(snapshot: &[Instance]) -> bool {
    snapshot.iter().any(Instance::is_serving)
}

/// Safe to start an availability trial: no leftovers from the previous
/// one and at least one instance to kill.
pub fn is_stable(snapshot: &[Instance]) -> bool {
    !snapshot.iter().any(|i| i.terminating) && snapshot.iter().any(Instance::is_serving)
}

/// First instance not already on its way out.
pub fn pick_victim(snapshot: &[Instance]) -> Option<&Instance> {
    snapshot.iter().find(|i| !i.terminating)
}

/// A replacement for `victim` is serving.
pub fn replacement_ready(snapshot: &[Instance], victim: &str) -> bool {
    snapshot
        .iter()
        .any(|i| i.identity != victim && i.is_serving())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kbench_core::ReadyCondition;

    fn inst(identity: &str, ready: bool, terminating: bool) -> Instance {
        Instance {
            identity: identity.to_string(),
            ready: if ready {
                ReadyCondition::True
            } else {
                ReadyCondition::False
            },
            terminating,
            observed_at_ms: 0,
        }
    }

    #[test]
    fn drained_only_when_empty() {
        assert!(is_drained(&[]));
        assert!(!is_drained(&[inst("a", false, true)]));
    }

    #[test]
    fn cold_start_ignores_terminating_ready_instances() {
        assert!(!cold_start_ready(&[]));
        assert!(!cold_start_ready(&[inst("a", false, false)]));
        assert!(!cold_start_ready(&[inst("old", true, true)]));
        assert!(cold_start_ready(&[inst("old", true, true), inst("new", true, false)]));
    }

    #[test]
    fn stable_needs_no_terminating_and_one_serving() {
        assert!(is_stable(&[inst("a", true, false)]));
        assert!(!is_stable(&[inst("a", true, false), inst("b", true, true)]));
        assert!(!is_stable(&[inst("a", false, false)]));
        assert!(!is_stable(&[]));
    }

    #[test]
    fn victim_skips_terminating_instances() {
        let snapshot = [inst("dying", true, true), inst("live", true, false)];
        assert_eq!(pick_victim(&snapshot).unwrap().identity, "live");
        assert!(pick_victim(&[inst("dying", true, true)]).is_none());
    }

    #[test]
    fn replacement_never_accepts_the_victim() {
        // Stale victim still claiming Ready, with and without the deletion marker.
        assert!(!replacement_ready(&[inst("v", true, true)], "v"));
        assert!(!replacement_ready(&[inst("v", true, false)], "v"));
        assert!(!replacement_ready(&[inst("v", true, true), inst("w", false, false)], "v"));
        assert!(!replacement_ready(&[inst("w", true, true)], "v"));
        assert!(replacement_ready(&[inst("v", true, true), inst("w", true, false)], "v"));
    }

    #[test]
    fn phase_labels() {
        assert_eq!(ColdStartPhase::WaitingReady.label(), "waiting-ready");
        let phase = AvailabilityPhase::WaitingReplacementReady {
            victim: "v".to_string(),
        };
        assert_eq!(phase.label(), "waiting-replacement-ready");
    }
}
