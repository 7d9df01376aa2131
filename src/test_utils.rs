//! Test doubles shared by unit tests across the crate
//!
//! - [`ScriptedSource`] is a telemetry source whose readiness and field values are
//!   set by the test.
//! - [`RecordingTransport`], [`FailingTransport`] and [`StallingTransport`] stand in
//!   for the collector.
//! - [`SharedBuffer`] is an in-memory writer for the data log.

#![cfg(test)]

use std::collections::HashMap;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::source::TelemetrySource;
use crate::transport::Transport;
use crate::types::Value;
use crate::{RelayError, Result};

/// Telemetry source driven entirely by the test.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    reachable: bool,
    session_active: bool,
    initialized: bool,
    values: HashMap<String, Value>,
    startups: usize,
    shutdowns: usize,
}

impl ScriptedSource {
    /// Source whose startup succeeds and reports an active session.
    pub fn available() -> Self {
        Self { reachable: true, session_active: true, ..Self::default() }
    }

    /// Source whose startup always fails.
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.set_value(field, value);
        self
    }

    pub fn set_value(&mut self, field: &str, value: impl Into<Value>) {
        self.values.insert(field.to_string(), value.into());
    }

    /// Simulator started or stopped.
    pub fn set_available(&mut self, available: bool) {
        self.reachable = available;
        self.session_active = available;
    }

    /// Memory is mapped but the simulator has no active session.
    pub fn set_initialized_only(&mut self) {
        self.reachable = true;
        self.session_active = false;
    }

    pub fn startups(&self) -> usize {
        self.startups
    }

    pub fn shutdowns(&self) -> usize {
        self.shutdowns
    }
}

impl TelemetrySource for ScriptedSource {
    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn is_connected(&self) -> bool {
        self.initialized && self.session_active
    }

    fn startup(&mut self) -> bool {
        self.startups += 1;
        self.initialized = self.reachable;
        self.initialized
    }

    fn shutdown(&mut self) {
        self.shutdowns += 1;
        self.initialized = false;
    }

    fn read(&self, field: &str) -> Option<Value> {
        self.values.get(field).cloned()
    }
}

/// Transport that keeps every payload it is asked to send.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    sent: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Payloads sent so far, parsed as JSON.
    pub fn sent_json(&self) -> Vec<serde_json::Value> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|payload| serde_json::from_slice(payload).unwrap())
            .collect()
    }
}

#[async_trait::async_trait]
impl Transport for RecordingTransport {
    async fn send(&mut self, payload: &[u8]) -> Result<()> {
        self.sent.lock().unwrap().push(payload.to_vec());
        Ok(())
    }

    fn endpoint(&self) -> &str {
        "memory"
    }
}

/// Transport that always fails with a connection error.
#[derive(Debug, Clone, Default)]
pub struct FailingTransport;

#[async_trait::async_trait]
impl Transport for FailingTransport {
    async fn send(&mut self, _payload: &[u8]) -> Result<()> {
        Err(RelayError::transport_failed("unreachable:9", "connection refused"))
    }

    fn endpoint(&self) -> &str {
        "unreachable:9"
    }
}

/// Transport that never completes within any reasonable timeout.
#[derive(Debug, Clone, Default)]
pub struct StallingTransport;

#[async_trait::async_trait]
impl Transport for StallingTransport {
    async fn send(&mut self, _payload: &[u8]) -> Result<()> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(())
    }

    fn endpoint(&self) -> &str {
        "stalled:9"
    }
}

/// Cloneable in-memory writer.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        let bytes = self.0.lock().unwrap();
        String::from_utf8_lossy(&bytes).lines().map(str::to_string).collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
