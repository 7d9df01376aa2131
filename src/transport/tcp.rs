//! Newline-delimited JSON over a short-lived TCP connection

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::trace;

use super::Transport;
use crate::{RelayError, Result};

/// Opens a connection per record: connect, write one line, flush, close.
#[derive(Debug, Clone)]
pub struct TcpTransport {
    address: String,
}

impl TcpTransport {
    pub fn new(address: impl Into<String>) -> Self {
        Self { address: address.into() }
    }
}

#[async_trait::async_trait]
impl Transport for TcpTransport {
    async fn send(&mut self, payload: &[u8]) -> Result<()> {
        let mut stream = TcpStream::connect(&self.address).await.map_err(|e| {
            RelayError::transport_failed_with_source(&self.address, "connect failed", e)
        })?;
        stream.set_nodelay(true).ok();

        let write = async {
            stream.write_all(payload).await?;
            stream.write_all(b"\n").await?;
            stream.flush().await?;
            stream.shutdown().await
        };
        write.await.map_err(|e| {
            RelayError::transport_failed_with_source(&self.address, "write failed", e)
        })?;

        trace!(endpoint = %self.address, bytes = payload.len(), "Record written");
        Ok(())
    }

    fn endpoint(&self) -> &str {
        &self.address
    }
}
