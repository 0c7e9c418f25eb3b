//! kbench-cluster — everything that talks to the orchestrator.
//!
//! The harness never links a Kubernetes client; it drives `kubectl`
//! through the [`ControlPlane`] trait so trial logic can be exercised
//! against scripted fakes.
//!
//! # Components
//!
//! ```text
//! ControlPlane (trait)
//!   └── Kubectl            spawns kubectl, parses JSON output
//! detector::detect()       SpinApp or Deployment, fail-open
//! scale::set_replicas()    kind-specific merge patch, no convergence wait
//! poller::snapshot()       one list call → Vec<Instance>
//! probe::http_probe()      GET /healthz expecting 2xx
//! tunnel::Tunnel           scoped kubectl port-forward, killed on drop
//! ```

pub mod control_plane;
pub mod detector;
pub mod error;
pub mod poller;
pub mod probe;
pub mod scale;
pub mod tunnel;

pub use control_plane::{ControlPlane, DeleteOptions, Kubectl};
pub use detector::detect;
pub use error::{ClusterError, ClusterResult};
pub use poller::{declared_resources, parse_instances, snapshot};
pub use probe::{ProbeResult, http_probe, http_status};
pub use scale::{ReplicaPatch, set_replicas};
pub use tunnel::{Tunnel, TunnelSpec};
