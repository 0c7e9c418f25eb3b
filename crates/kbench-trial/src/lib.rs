//! kbench-trial — the transition-timing measurement engine.
//!
//! Drives a managed resource through scale/kill transitions and times how
//! long it takes to reach the target observable state.
//!
//! # State machines
//!
//! ```text
//! cold start    ScalingDown → Drained → Triggered → WaitingReady
//!                                                    → Done | TimedOut
//! availability  Stabilizing → IdentifyVictim → Triggered
//!                 → WaitingReplacementReady → Done | TimedOut
//! ```
//!
//! Every waiting phase is a bounded poll loop whose step is a pure
//! predicate over one snapshot (see [`phase`]). Time and sleeping come
//! from a [`Clock`], so tests run on a manual clock against a scripted
//! [`TrialTarget`].

pub mod clock;
pub mod driver;
pub mod error;
pub mod phase;
pub mod sampler;
pub mod target;

pub use clock::{Clock, ManualClock, TokioClock};
pub use driver::{PollBudget, TrialDriver, TrialTiming};
pub use error::{TrialError, TrialResult};
pub use sampler::TrafficSampler;
pub use target::{ClusterTarget, TrialTarget};
