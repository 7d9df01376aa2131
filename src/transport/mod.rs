//! Outbound delivery channels for serialized records
//!
//! A [`Transport`] makes one best-effort attempt to hand a payload to the collector.
//! It never retries; timeouts are enforced by the dispatcher around each attempt.

mod http;
mod tcp;

pub use http::HttpTransport;
pub use tcp::TcpTransport;

use crate::Result;
use crate::config::{CollectorConfig, Endpoint};

/// Trait for collector delivery channels.
#[async_trait::async_trait]
pub trait Transport: Send {
    /// Deliver one serialized record.
    ///
    /// Any connection opened for the attempt is closed before returning, on success
    /// and on error alike.
    async fn send(&mut self, payload: &[u8]) -> Result<()>;

    /// Human-readable endpoint for logs and errors.
    fn endpoint(&self) -> &str;
}

/// Build the transport named by the collector configuration.
pub fn from_config(config: &CollectorConfig) -> Result<Box<dyn Transport>> {
    let transport: Box<dyn Transport> = match config.endpoint()? {
        Endpoint::Tcp { address } => Box::new(TcpTransport::new(address)),
        Endpoint::Http { url, token } => Box::new(HttpTransport::new(url, token, config.timeout())?),
    };
    Ok(transport)
}
