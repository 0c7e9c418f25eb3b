//! Scoped `kubectl port-forward` tunnel.
//!
//! A `Tunnel` owns the port-forward child process. Dropping it kills the
//! child, so early returns, errors, and cancelled futures all release the
//! forward without any signal handling.

use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::control_plane::Kubectl;
use crate::error::{ClusterError, ClusterResult};
use crate::probe::{ProbeResult, http_probe};

/// What to forward and how to validate it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunnelSpec {
    pub namespace: String,
    pub service: String,
    pub local_port: u16,
    pub remote_port: u16,
    /// Path probed until it answers 2xx.
    pub health_path: String,
}

impl TunnelSpec {
    pub fn args(&self) -> Vec<String> {
        vec![
            "port-forward".to_string(),
            "-n".to_string(),
            self.namespace.clone(),
            format!("svc/{}", self.service),
            format!("{}:{}", self.local_port, self.remote_port),
        ]
    }

    pub fn local_address(&self) -> String {
        format!("127.0.0.1:{}", self.local_port)
    }
}

/// A live, validated port-forward.
#[derive(Debug)]
pub struct Tunnel {
    child: Option<Child>,
    address: String,
}

impl Tunnel {
    /// Start the port-forward and wait until the health path answers 2xx.
    ///
    /// Fails if the child exits early or the endpoint is not healthy
    /// within `ready_timeout`; the child is killed in both cases.
    pub async fn open(
        kubectl: &Kubectl,
        spec: &TunnelSpec,
        probe_timeout: Duration,
        ready_timeout: Duration,
    ) -> ClusterResult<Self> {
        let child = Command::new(kubectl.program())
            .args(spec.args())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ClusterError::Spawn {
                program: kubectl.program().to_string(),
                source,
            })?;

        let mut tunnel = Tunnel {
            child: Some(child),
            address: spec.local_address(),
        };

        let deadline = Instant::now() + ready_timeout;
        loop {
            if let Some(status) = tunnel.exited() {
                return Err(ClusterError::Tunnel(format!(
                    "port-forward to svc/{} exited early ({status})",
                    spec.service
                )));
            }

            match http_probe(&tunnel.address, &spec.health_path, probe_timeout).await {
                ProbeResult::Healthy => break,
                other => debug!(address = %tunnel.address, result = ?other, "tunnel not ready yet"),
            }

            if Instant::now() >= deadline {
                tunnel.close().await;
                return Err(ClusterError::Tunnel(format!(
                    "{}{} not healthy within {:?}",
                    spec.local_address(),
                    spec.health_path,
                    ready_timeout
                )));
            }
            tokio::time::sleep(Duration::from_millis(250)).await;
        }

        info!(
            service = %spec.service,
            address = %tunnel.address,
            "tunnel established"
        );
        Ok(tunnel)
    }

    /// Local `host:port` the service is reachable on.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Stop the port-forward and reap the child.
    pub async fn close(mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill().await {
                warn!(error = %e, "failed to stop port-forward");
            }
            debug!(address = %self.address, "tunnel closed");
        }
    }

    fn exited(&mut self) -> Option<std::process::ExitStatus> {
        self.child
            .as_mut()
            .and_then(|child| child.try_wait().ok().flatten())
    }
}

impl Drop for Tunnel {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.start_kill();
            debug!(address = %self.address, "tunnel released on drop");
        }
    }
}
