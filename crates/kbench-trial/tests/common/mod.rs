//! Scripted trial target shared by the driver tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use kbench_cluster::{ClusterError, ClusterResult};
use kbench_core::{Instance, ReadyCondition};
use kbench_trial::{PollBudget, TrialTarget, TrialTiming};

/// One scripted answer to `snapshot()`.
#[derive(Debug, Clone)]
pub enum Read {
    Ok(Vec<Instance>),
    Fail,
}

/// Side effects the driver asked for, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SetReplicas(u32),
    ForceDelete(String),
    WaitReady,
}

/// Replays snapshots from a script; once it runs dry every read returns
/// `fallback`.
pub struct ScriptedTarget {
    script: Mutex<VecDeque<Read>>,
    fallback: Vec<Instance>,
    actions: Mutex<Vec<Action>>,
    reads: Mutex<u32>,
    ready: bool,
}

impl ScriptedTarget {
    pub fn new(script: Vec<Read>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: Vec::new(),
            actions: Mutex::new(Vec::new()),
            reads: Mutex::new(0),
            ready: true,
        }
    }

    pub fn with_fallback(mut self, fallback: Vec<Instance>) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn never_ready(mut self) -> Self {
        self.ready = false;
        self
    }

    pub fn actions(&self) -> Vec<Action> {
        self.actions.lock().unwrap().clone()
    }

    pub fn reads(&self) -> u32 {
        *self.reads.lock().unwrap()
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap().len()
    }
}

impl TrialTarget for ScriptedTarget {
    async fn snapshot(&self) -> ClusterResult<Vec<Instance>> {
        *self.reads.lock().unwrap() += 1;
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Read::Ok(instances)) => Ok(instances),
            Some(Read::Fail) => Err(ClusterError::CommandFailed {
                command: "kubectl get pods".to_string(),
                status: "exit status: 1".to_string(),
                stderr: "Unable to connect to the server".to_string(),
            }),
            None => Ok(self.fallback.clone()),
        }
    }

    async fn set_replicas(&self, replicas: u32) -> ClusterResult<()> {
        self.actions.lock().unwrap().push(Action::SetReplicas(replicas));
        Ok(())
    }

    async fn force_delete(&self, identity: &str) -> ClusterResult<()> {
        self.actions
            .lock()
            .unwrap()
            .push(Action::ForceDelete(identity.to_string()));
        Ok(())
    }

    async fn wait_ready(&self, _timeout: Duration) -> ClusterResult<bool> {
        self.actions.lock().unwrap().push(Action::WaitReady);
        Ok(self.ready)
    }
}

pub fn inst(identity: &str, ready: bool, terminating: bool) -> Instance {
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

pub fn ok(instances: Vec<Instance>) -> Read {
    Read::Ok(instances)
}

/// `n` reads of the same snapshot.
pub fn repeat(n: usize, instances: Vec<Instance>) -> Vec<Read> {
    vec![Read::Ok(instances); n]
}

/// Small budgets so scripts stay short: 10 ms interval, `max_polls` reads.
pub fn timing(max_polls: u32) -> TrialTiming {
    let budget = PollBudget::new(Duration::from_millis(10), max_polls);
    TrialTiming {
        wait: budget,
        drain: PollBudget::new(Duration::from_millis(50), 5),
        stabilize: PollBudget::new(Duration::from_millis(50), 5),
        trial_gap: Duration::from_millis(1000),
        ready_wait: Duration::from_secs(5),
    }
}
