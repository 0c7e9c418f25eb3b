//! HTTP reachability probe.
//!
//! Issues a single GET over a fresh HTTP/1 connection. Used to validate a
//! tunnel before a trial and by the availability sampler.

use std::time::Duration;

use tracing::debug;

/// Result of a single health probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeResult {
    /// The endpoint returned 2xx.
    Healthy,
    /// The endpoint answered with a non-2xx status.
    Unhealthy,
    /// No response: connection refused, handshake failure, or timeout.
    Failed,
}

impl ProbeResult {
    pub fn from_status(status: Option<u16>) -> Self {
        match status {
            Some(code) if (200..300).contains(&code) => ProbeResult::Healthy,
            Some(_) => ProbeResult::Unhealthy,
            None => ProbeResult::Failed,
        }
    }
}

/// Probe `http://{address}{path}` and classify the answer.
pub async fn http_probe(address: &str, path: &str, timeout: Duration) -> ProbeResult {
    ProbeResult::from_status(http_status(address, path, timeout).await)
}

/// GET `http://{address}{path}` and return the response status code, or
/// `None` if no response arrived within `timeout`.
pub async fn http_status(address: &str, path: &str, timeout: Duration) -> Option<u16> {
    let uri = format!("http://{address}{path}");

    let result = tokio::time::timeout(timeout, async {
        let stream = match tokio::net::TcpStream::connect(address).await {
            Ok(s) => s,
            Err(e) => {
                debug!(error = %e, %uri, "probe connection failed");
                return None;
            }
        };

        let io = hyper_util::rt::TokioIo::new(stream);
        let (mut sender, conn) = match hyper::client::conn::http1::handshake(io).await {
            Ok(pair) => pair,
            Err(e) => {
                debug!(error = %e, %uri, "probe handshake failed");
                return None;
            }
        };

        tokio::spawn(async move {
            let _ = conn.await;
        });

        let req = match http::Request::builder()
            .method("GET")
            .uri(&uri)
            .header("host", address)
            .header("user-agent", "kbench/0.1")
            .body(http_body_util::Empty::<bytes::Bytes>::new())
        {
            Ok(req) => req,
            Err(e) => {
                debug!(error = %e, %uri, "probe request invalid");
                return None;
            }
        };

        match sender.send_request(req).await {
            Ok(resp) => Some(resp.status().as_u16()),
            Err(e) => {
                debug!(error = %e, %uri, "probe request failed");
                None
            }
        }
    })
    .await;

    match result {
        Ok(status) => status,
        Err(_) => {
            debug!(%uri, "probe timed out");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response on an ephemeral port.
    async fn serve_once(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });
        address
    }

    #[test]
    fn classification_from_status() {
        assert_eq!(ProbeResult::from_status(Some(200)), ProbeResult::Healthy);
        assert_eq!(ProbeResult::from_status(Some(204)), ProbeResult::Healthy);
        assert_eq!(ProbeResult::from_status(Some(503)), ProbeResult::Unhealthy);
        assert_eq!(ProbeResult::from_status(None), ProbeResult::Failed);
    }

    #[tokio::test]
    async fn closed_port_returns_failed() {
        let result = http_probe("127.0.0.1:1", "/healthz", Duration::from_millis(100)).await;
        assert_eq!(result, ProbeResult::Failed);
    }

    #[tokio::test]
    async fn ok_response_is_healthy() {
        let address =
            serve_once("HTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: close\r\n\r\nok").await;
        let result = http_probe(&address, "/healthz", Duration::from_secs(2)).await;
        assert_eq!(result, ProbeResult::Healthy);
    }

    #[tokio::test]
    async fn server_error_reports_status() {
        let address = serve_once(
            "HTTP/1.1 503 Service Unavailable\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
        )
        .await;
        let status = http_status(&address, "/healthz", Duration::from_secs(2)).await;
        assert_eq!(status, Some(503));
    }
}
