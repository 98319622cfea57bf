//! TCP connect probe.

use crate::probe::{Probe, ProbeError};
use async_trait::async_trait;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::debug;

/// Probes a socket address by opening (and immediately dropping) a TCP
/// connection.
pub struct TcpProbe {
    addr: SocketAddr,
}

impl TcpProbe {
    /// Create a new TCP probe.
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr }
    }
}

#[async_trait]
impl Probe for TcpProbe {
    async fn run(&self, _budget: Duration) -> Result<(), ProbeError> {
        let _stream = TcpStream::connect(self.addr)
            .await
            .map_err(|e| ProbeError::failure(format!("connection to {} failed: {e}", self.addr)))?;
        debug!(target = %self.addr, "TCP probe succeeded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_connect_to_listener_passes() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let probe = TcpProbe::new(addr);
        assert!(probe.run(Duration::from_secs(1)).await.is_ok());
    }

    #[tokio::test]
    async fn test_connect_to_closed_port_fails() {
        let probe = TcpProbe::new("127.0.0.1:1".parse().unwrap());
        let err = probe.run(Duration::from_secs(1)).await.unwrap_err();
        assert!(err.to_string().contains("127.0.0.1:1"));
    }
}
