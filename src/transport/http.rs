//! JSON POST to an HTTP collector

use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use std::time::Duration;
use tracing::trace;

use super::Transport;
use crate::{RelayError, Result};

/// Posts each record to a fixed URL through a pooled client.
///
/// When a token is configured it is sent as `Authorization: Splunk <token>`, the
/// scheme used by HTTP event collectors.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    url: String,
    token: Option<String>,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>, token: Option<String>, timeout: Duration) -> Result<Self> {
        let url = url.into();
        let client = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| RelayError::transport_failed_with_source(&url, "client setup failed", e))?;
        Ok(Self { client, url, token })
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn send(&mut self, payload: &[u8]) -> Result<()> {
        let mut request = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .body(payload.to_vec());
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("Splunk {token}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| RelayError::transport_failed_with_source(&self.url, "request failed", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::transport_failed(
                &self.url,
                format!("collector returned {status}"),
            ));
        }

        trace!(endpoint = %self.url, %status, "Record posted");
        Ok(())
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}
