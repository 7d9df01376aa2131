//! Record delivery with local fallback
//!
//! [`Dispatcher::dispatch`] turns a sample into a [`Record`], makes one bounded
//! attempt to deliver it, and on any failure appends the record to the local data
//! log instead. It never returns an error: the poll loop keeps running no matter
//! what happens on the wire.

use std::time::Duration;
use tracing::{debug, error, info};

use crate::record::Record;
use crate::sampler::Sample;
use crate::sinks::DataLog;
use crate::transport::Transport;
use crate::{RelayError, Result};

/// Result of one dispatch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The collector accepted the record
    Delivered,
    /// The record was not delivered.
    ///
    /// It went to the local data log unless it could not be serialized or the log
    /// write failed, in which case it is counted in [`DispatchStats::lost`].
    FailedFallback,
}

/// Running totals of dispatch outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub delivered: u64,
    pub fallbacks: u64,
    /// Records that reached neither the collector nor the data log
    pub lost: u64,
}

/// Owns the delivery channel and the fallback data log.
pub struct Dispatcher {
    transport: Box<dyn Transport>,
    data_log: DataLog,
    timeout: Duration,
    host: Option<String>,
    stats: DispatchStats,
}

impl Dispatcher {
    pub fn new(transport: Box<dyn Transport>, data_log: DataLog, timeout: Duration) -> Self {
        Self { transport, data_log, timeout, host: None, stats: DispatchStats::default() }
    }

    /// Label added to every record as `host`.
    pub fn with_host(mut self, host: Option<String>) -> Self {
        self.host = host;
        self
    }

    /// Stamp `sample` with `source` and the current time, then deliver it.
    pub async fn dispatch(&mut self, sample: Sample, source: &str) -> DispatchOutcome {
        let record = Record::new(sample, source).with_host(self.host.clone());

        let payload = match record.to_json() {
            Ok(payload) => payload,
            Err(e) => {
                error!(source, "Record lost, cannot be serialized: {}", e);
                self.stats.lost += 1;
                return DispatchOutcome::FailedFallback;
            }
        };

        match self.attempt(payload.as_bytes()).await {
            Ok(()) => {
                self.stats.delivered += 1;
                info!(source, bytes = payload.len(), "Record delivered");
                DispatchOutcome::Delivered
            }
            Err(e) => {
                self.stats.fallbacks += 1;
                error!(source, endpoint = self.transport.endpoint(), "Delivery failed: {}", e);
                if let Err(io) = self.data_log.append(&payload) {
                    self.stats.lost += 1;
                    error!(source, "Data log write failed, record lost: {}", io);
                }
                DispatchOutcome::FailedFallback
            }
        }
    }

    /// One delivery attempt bounded by the configured timeout.
    async fn attempt(&mut self, payload: &[u8]) -> Result<()> {
        debug!(endpoint = self.transport.endpoint(), "Sending record");
        match tokio::time::timeout(self.timeout, self.transport.send(payload)).await {
            Ok(result) => result,
            Err(_) => Err(RelayError::Timeout { duration: self.timeout }),
        }
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    pub fn endpoint(&self) -> &str {
        self.transport.endpoint()
    }
}
