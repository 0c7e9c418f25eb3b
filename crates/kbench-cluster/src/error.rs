//! Control-plane error types.

use thiserror::Error;

/// Result type alias for control-plane operations.
pub type ClusterResult<T> = Result<T, ClusterError>;

/// Errors that can occur while talking to the cluster.
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("invalid JSON from control plane: {0}")]
    Json(#[from] serde_json::Error),

    #[error("tunnel error: {0}")]
    Tunnel(String),
}

impl ClusterError {
    /// Whether the failure was a "resource does not exist" answer rather
    /// than a transport or permission failure.
    pub fn is_not_found(&self) -> bool {
        match self {
            ClusterError::CommandFailed { stderr, .. } => {
                stderr.contains("NotFound")
                    || stderr.contains("not found")
                    || stderr.contains("doesn't have a resource type")
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(stderr: &str) -> ClusterError {
        ClusterError::CommandFailed {
            command: "kubectl get spinapp api".to_string(),
            status: "exit status: 1".to_string(),
            stderr: stderr.to_string(),
        }
    }

    #[test]
    fn not_found_is_recognised_from_stderr() {
        assert!(failed(r#"Error from server (NotFound): spinapps "api" not found"#).is_not_found());
        assert!(failed(r#"error: the server doesn't have a resource type "spinapp""#).is_not_found());
        assert!(failed(r#"Error from server (NotFound): pods "api-0" not found"#).is_not_found());
    }

    #[test]
    fn connection_refused_is_not_not_found() {
        assert!(!failed("The connection to the server localhost:8080 was refused").is_not_found());
        assert!(!ClusterError::Tunnel("closed".to_string()).is_not_found());
    }
}
