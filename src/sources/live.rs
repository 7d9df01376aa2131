//! Live telemetry source backed by iRacing shared memory

use crate::source::TelemetrySource;
use crate::types::Value;

#[cfg(windows)]
use {
    crate::VariableSchema,
    crate::windows::Connection,
    std::collections::HashMap,
    tracing::{debug, info, trace, warn},
};

/// Live source that reads from iRacing shared memory
#[cfg(windows)]
#[derive(Default)]
pub struct LiveSource {
    /// Shared memory mapping, present while initialized
    connection: Option<Connection>,

    /// Variable layout captured at startup
    schema: Option<VariableSchema>,

    /// Startup failures since the last success, to keep retries quiet
    failed_attempts: u64,
}

#[cfg(windows)]
impl LiveSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn attach(&mut self) -> crate::Result<()> {
        let connection = Connection::try_connect()?;

        let header = connection.header();
        let variables: HashMap<_, _> =
            connection.get_variables().into_iter().map(|v| (v.name.clone(), v)).collect();
        let schema = VariableSchema::new(variables, header.buf_len.max(0) as usize)?;

        info!(
            sdk_version = header.ver,
            tick_rate = header.tick_rate,
            num_vars = schema.variable_count(),
            status_connected = connection.is_connected(),
            "Mapped iRacing shared memory"
        );

        self.connection = Some(connection);
        self.schema = Some(schema);
        Ok(())
    }
}

#[cfg(windows)]
impl TelemetrySource for LiveSource {
    fn is_initialized(&self) -> bool {
        self.connection.is_some() && self.schema.is_some()
    }

    fn is_connected(&self) -> bool {
        self.connection.as_ref().is_some_and(Connection::is_connected)
    }

    fn startup(&mut self) -> bool {
        if self.is_initialized() {
            return true;
        }

        match self.attach() {
            Ok(()) => {
                self.failed_attempts = 0;
                true
            }
            Err(e) => {
                self.failed_attempts += 1;
                if self.failed_attempts == 1 {
                    debug!("iRacing shared memory not available: {}", e);
                } else if e.is_retryable() {
                    trace!(attempts = self.failed_attempts, "iRacing still unavailable: {}", e);
                } else if self.failed_attempts % 100 == 0 {
                    warn!(attempts = self.failed_attempts, "Cannot attach to iRacing: {}", e);
                }
                false
            }
        }
    }

    fn shutdown(&mut self) {
        if self.connection.take().is_some() {
            debug!("Released iRacing shared memory");
        }
        self.schema = None;
    }

    fn read(&self, field: &str) -> Option<Value> {
        let connection = self.connection.as_ref()?;
        let info = self.schema.as_ref()?.get_variable(field)?;

        match connection.with_latest_row(|row| Value::decode(row, info))? {
            Ok(value) => Some(value),
            Err(e) => {
                trace!(field, "Failed to decode variable: {}", e);
                None
            }
        }
    }
}

// Non-Windows stub implementation
#[cfg(not(windows))]
#[derive(Default)]
pub struct LiveSource {
    warned: bool,
}

#[cfg(not(windows))]
impl LiveSource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(not(windows))]
impl TelemetrySource for LiveSource {
    fn is_initialized(&self) -> bool {
        false
    }

    fn is_connected(&self) -> bool {
        false
    }

    /// Live telemetry is only available on Windows, so startup never succeeds here.
    fn startup(&mut self) -> bool {
        if !self.warned {
            self.warned = true;
            let err = crate::RelayError::unsupported_platform("Live telemetry", "Windows");
            tracing::debug!("{}", err);
        }
        false
    }

    fn shutdown(&mut self) {}

    fn read(&self, _field: &str) -> Option<Value> {
        None
    }
}
