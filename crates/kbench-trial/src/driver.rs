//! Trial driver: runs the cold-start and availability state machines.
//!
//! Each trial walks its phases once. Waiting phases are bounded poll
//! loops with a fixed interval; a poll whose read fails counts against
//! the budget like any other non-matching poll.

use std::time::Duration;

use tracing::{debug, info, warn};

use kbench_core::config::PollConfig;
use kbench_core::{Instance, TransitionKind, Trial, TrialSet};

use crate::clock::Clock;
use crate::error::{TrialError, TrialResult};
use crate::phase::{
    AvailabilityPhase, ColdStartPhase, cold_start_ready, is_drained, is_stable, pick_victim,
    replacement_ready,
};
use crate::target::TrialTarget;

/// Poll cadence and maximum number of reads for one waiting phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollBudget {
    pub interval: Duration,
    pub max_polls: u32,
}

impl PollBudget {
    pub fn new(interval: Duration, max_polls: u32) -> Self {
        Self {
            interval,
            max_polls,
        }
    }
}

/// Budgets for every waiting phase plus the pause between trials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialTiming {
    /// WaitingReady / WaitingReplacementReady.
    pub wait: PollBudget,
    pub drain: PollBudget,
    pub stabilize: PollBudget,
    pub trial_gap: Duration,
    pub ready_wait: Duration,
}

impl TrialTiming {
    pub fn from_config(poll: &PollConfig) -> Self {
        Self {
            wait: PollBudget::new(poll.interval(), poll.max_polls),
            drain: PollBudget::new(poll.drain_interval(), poll.drain_max_polls),
            stabilize: PollBudget::new(poll.stabilize_interval(), poll.stabilize_max_polls),
            trial_gap: poll.trial_gap(),
            ready_wait: poll.ready_wait(),
        }
    }
}

impl Default for TrialTiming {
    fn default() -> Self {
        Self::from_config(&PollConfig::default())
    }
}

/// How a bounded poll loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PollOutcome {
    Satisfied { at_ms: u64, polls: u32 },
    Exhausted { polls: u32, failed_reads: u32 },
}

/// Drives trials against one target. Trials never overlap.
pub struct TrialDriver<T, C> {
    target: T,
    clock: C,
    timing: TrialTiming,
}

impl<T: TrialTarget, C: Clock> TrialDriver<T, C> {
    pub fn new(target: T, clock: C, timing: TrialTiming) -> Self {
        Self {
            target,
            clock,
            timing,
        }
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn timing(&self) -> &TrialTiming {
        &self.timing
    }

    /// Run `runs` trials of `kind` back to back.
    ///
    /// The returned set always holds `runs` trials; timeouts are entries,
    /// not gaps. Only fatal errors cut the run short.
    pub async fn run_series(&self, kind: TransitionKind, runs: u32) -> TrialResult<TrialSet> {
        let mut set = TrialSet::new(kind, runs);
        if kind == TransitionKind::Availability {
            self.prepare_availability().await?;
        }

        for index in 1..=runs {
            let trial = match kind {
                TransitionKind::ColdStart => self.cold_start_trial(index).await?,
                TransitionKind::Availability => self.availability_trial(index).await?,
            };
            set.push(trial);
            if index < runs {
                self.pause_between_trials().await;
            }
        }

        Ok(set)
    }

    /// Ensure one ready instance exists before an availability series.
    pub async fn prepare_availability(&self) -> TrialResult<()> {
        self.target
            .set_replicas(1)
            .await
            .map_err(|source| TrialError::Trigger {
                action: "scale to one replica",
                source,
            })?;

        // `wait` fails outright on an empty selector, so an instance must
        // exist before waiting on its readiness.
        if let PollOutcome::Exhausted {
            polls,
            failed_reads,
        } = self
            .poll_until(self.timing.stabilize, |s| !s.is_empty())
            .await
        {
            if failed_reads == polls {
                return Err(TrialError::Unreachable {
                    phase: "scaling-up",
                    polls,
                });
            }
            return Err(TrialError::NotReady(self.timing.ready_wait));
        }

        if !self.target.wait_ready(self.timing.ready_wait).await? {
            return Err(TrialError::NotReady(self.timing.ready_wait));
        }
        info!("target ready for availability trials");
        Ok(())
    }

    pub async fn pause_between_trials(&self) {
        self.clock.sleep(self.timing.trial_gap).await;
    }

    /// Scale to zero, then time 0 → 1 until an instance is ready.
    pub async fn cold_start_trial(&self, index: u32) -> TrialResult<Trial> {
        let mut phase = ColdStartPhase::ScalingDown;
        debug!(trial = index, phase = phase.label(), "cold start");

        self.target
            .set_replicas(0)
            .await
            .map_err(|source| TrialError::Trigger {
                action: "scale to zero",
                source,
            })?;

        match self.poll_until(self.timing.drain, is_drained).await {
            PollOutcome::Satisfied { polls, .. } => {
                debug!(trial = index, polls, "instances drained");
            }
            PollOutcome::Exhausted {
                polls,
                failed_reads,
            } => {
                if failed_reads == polls {
                    return Err(TrialError::Unreachable {
                        phase: phase.label(),
                        polls,
                    });
                }
                warn!(
                    trial = index,
                    polls, "instances still present after scale-down budget, proceeding"
                );
            }
        }
        phase = ColdStartPhase::Drained;
        debug!(trial = index, phase = phase.label(), "cold start");

        let t0 = self.clock.now_ms();
        self.target
            .set_replicas(1)
            .await
            .map_err(|source| TrialError::Trigger {
                action: "scale to one replica",
                source,
            })?;
        phase = ColdStartPhase::Triggered;
        debug!(trial = index, phase = phase.label(), t0, "cold start");

        phase = ColdStartPhase::WaitingReady;
        let outcome = self.poll_until(self.timing.wait, cold_start_ready).await;
        let trial = match outcome {
            PollOutcome::Satisfied { at_ms, polls } => {
                phase = ColdStartPhase::Done;
                let trial = Trial::completed(index, t0, at_ms);
                info!(trial = index, polls, result = %trial.outcome, "cold start trial finished");
                trial
            }
            PollOutcome::Exhausted {
                polls,
                failed_reads,
            } => {
                if failed_reads == polls {
                    return Err(TrialError::Unreachable {
                        phase: phase.label(),
                        polls,
                    });
                }
                phase = ColdStartPhase::TimedOut;
                warn!(trial = index, polls, "cold start trial timed out");
                Trial::timed_out(index, t0)
            }
        };
        debug!(trial = index, phase = phase.label(), "cold start");
        Ok(trial)
    }

    /// Force-delete a serving instance and time until a different one is
    /// ready.
    pub async fn availability_trial(&self, index: u32) -> TrialResult<Trial> {
        let mut phase = AvailabilityPhase::Stabilizing;
        debug!(trial = index, phase = phase.label(), "availability");

        if let PollOutcome::Exhausted {
            polls,
            failed_reads,
        } = self.poll_until(self.timing.stabilize, is_stable).await
        {
            if failed_reads == polls {
                return Err(TrialError::Unreachable {
                    phase: phase.label(),
                    polls,
                });
            }
            warn!(
                trial = index,
                polls, "instances did not settle within budget, proceeding"
            );
        }

        phase = AvailabilityPhase::IdentifyVictim;
        debug!(trial = index, phase = phase.label(), "availability");
        let victim = match self.target.snapshot().await {
            Ok(snapshot) => pick_victim(&snapshot).map(|i| i.identity.clone()),
            Err(e) => {
                debug!(trial = index, error = %e, "victim snapshot failed");
                None
            }
        };
        let Some(victim) = victim else {
            warn!(trial = index, "no instance available to delete, recording timeout");
            return Ok(Trial::timed_out(index, self.clock.now_ms()));
        };

        let t0 = self.clock.now_ms();
        self.target
            .force_delete(&victim)
            .await
            .map_err(|source| TrialError::Trigger {
                action: "force-delete victim",
                source,
            })?;
        phase = AvailabilityPhase::Triggered {
            victim: victim.clone(),
        };
        debug!(trial = index, phase = phase.label(), %victim, t0, "availability");

        phase = AvailabilityPhase::WaitingReplacementReady {
            victim: victim.clone(),
        };
        let outcome = self
            .poll_until(self.timing.wait, |s| replacement_ready(s, &victim))
            .await;
        let trial = match outcome {
            PollOutcome::Satisfied { at_ms, polls } => {
                phase = AvailabilityPhase::Done;
                let trial = Trial::completed(index, t0, at_ms);
                info!(
                    trial = index,
                    %victim,
                    polls,
                    result = %trial.outcome,
                    "availability trial finished"
                );
                trial
            }
            PollOutcome::Exhausted {
                polls,
                failed_reads,
            } => {
                if failed_reads == polls {
                    return Err(TrialError::Unreachable {
                        phase: phase.label(),
                        polls,
                    });
                }
                phase = AvailabilityPhase::TimedOut;
                warn!(trial = index, %victim, polls, "availability trial timed out");
                Trial::timed_out(index, t0)
            }
        };
        debug!(trial = index, phase = phase.label(), "availability");
        Ok(trial)
    }

    /// Poll until `done` accepts a snapshot or the budget runs out.
    ///
    /// The completion time is read right after the accepting poll returns.
    /// Failed reads are absorbed as "no match this tick".
    async fn poll_until<F>(&self, budget: PollBudget, done: F) -> PollOutcome
    where
        F: Fn(&[Instance]) -> bool,
    {
        let mut failed_reads = 0;
        for poll in 1..=budget.max_polls {
            match self.target.snapshot().await {
                Ok(snapshot) => {
                    if done(&snapshot) {
                        return PollOutcome::Satisfied {
                            at_ms: self.clock.now_ms(),
                            polls: poll,
                        };
                    }
                }
                Err(e) => {
                    failed_reads += 1;
                    debug!(poll, error = %e, "snapshot failed, treating as no match");
                }
            }
            if poll < budget.max_polls {
                self.clock.sleep(budget.interval).await;
            }
        }
        PollOutcome::Exhausted {
            polls: budget.max_polls,
            failed_reads,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timing_from_default_config() {
        let timing = TrialTiming::default();
        assert_eq!(timing.wait, PollBudget::new(Duration::from_millis(100), 600));
        assert_eq!(timing.drain, PollBudget::new(Duration::from_millis(500), 120));
        assert_eq!(timing.stabilize.max_polls, 120);
        assert_eq!(timing.trial_gap, Duration::from_secs(2));
    }

    #[test]
    fn timing_follows_custom_interval() {
        let poll = PollConfig {
            interval_ms: 250,
            max_polls: 40,
            ..PollConfig::default()
        };
        let timing = TrialTiming::from_config(&poll);
        assert_eq!(timing.wait.interval, Duration::from_millis(250));
        assert_eq!(timing.wait.max_polls, 40);
    }
}
