//! Error types for the relay.
//!
//! All errors implement the `std::error::Error` trait and include structured context
//! for debugging and recovery guidance.
//!
//! ## Error Categories
//!
//! - **Startup Errors**: configuration, log directory and log sink failures. These are
//!   the only errors that stop the process.
//! - **Source Errors**: problems attaching to or decoding iRacing shared memory. The
//!   tracker treats these as "simulator not ready" and retries on the next tick.
//! - **Delivery Errors**: transport and timeout failures while sending a record. The
//!   dispatcher recovers from these by writing the record to the local data log.
//!
//! ## Recovery and Retry
//!
//! ```rust
//! use pitwall_relay::RelayError;
//!
//! let error = RelayError::transport_failed("127.0.0.1:9000", "connection refused");
//! if error.is_retryable() {
//!     for suggestion in error.recovery_suggestions() {
//!         println!("  - {}", suggestion);
//!     }
//! }
//! ```

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[cfg(windows)]
use windows_core as core;

/// Result type alias for relay operations.
pub type Result<T, E = RelayError> = std::result::Result<T, E>;

/// Main error type for relay operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RelayError {
    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    #[error("File error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Delivery to {endpoint} failed: {reason}")]
    Transport {
        endpoint: String,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    #[error("Record serialization failed")]
    Serialization(#[from] serde_json::Error),

    #[error("Cannot open rotating log in {path}")]
    LogSink {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("SDK version mismatch: expected {expected}, found {found}")]
    Version { expected: u32, found: u32 },

    #[error("Memory access violation at offset {offset:#x}")]
    Memory { offset: usize },

    #[error("Type conversion error: {details}")]
    TypeConversion { details: String },

    #[error("{feature} is only available on {required_platform}")]
    UnsupportedPlatform { feature: String, required_platform: String },

    #[error("Windows API error: {operation}")]
    #[cfg(windows)]
    WindowsApi {
        operation: String,
        #[source]
        source: core::Error,
    },
}

impl RelayError {
    /// Returns whether this error is potentially recoverable through retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            RelayError::Transport { .. } => true,
            RelayError::Timeout { .. } => true,
            RelayError::Memory { .. } => true,
            RelayError::Config { .. } => false,
            RelayError::File { .. } => false,
            RelayError::Serialization(_) => false,
            RelayError::LogSink { .. } => false,
            RelayError::Version { .. } => false,
            RelayError::TypeConversion { .. } => false,
            RelayError::UnsupportedPlatform { .. } => false,
            #[cfg(windows)]
            RelayError::WindowsApi { .. } => true,
        }
    }

    /// Returns whether this error must stop the process before the poll loop starts.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RelayError::Config { .. } | RelayError::File { .. } | RelayError::LogSink { .. }
        )
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            RelayError::Config { .. } => vec![
                "Check the configuration file against the documented keys",
                "Run with --list-bundles to see the known bundle names",
            ],
            RelayError::File { .. } => vec![
                "Check the directory exists and is writable",
                "Ensure sufficient disk space",
                "Pass --log-root to use a different location",
            ],
            RelayError::Transport { .. } => vec![
                "Check the collector is running and reachable",
                "Verify the configured endpoint address",
                "Inspect the local data log for records that were not delivered",
            ],
            RelayError::Timeout { .. } => vec![
                "Increase the collector timeout",
                "Check network latency to the collector",
            ],
            RelayError::Serialization(_) => vec![
                "Check telemetry values are representable as JSON",
            ],
            RelayError::LogSink { .. } => vec![
                "Check the log directory is writable",
                "Check the retention count is not zero",
            ],
            RelayError::Version { .. } => vec![
                "Update iRacing to latest version",
                "Update the relay to a compatible version",
            ],
            RelayError::Memory { .. } => vec![
                "Verify shared memory is still valid",
                "Wait for iRacing to finish loading the session",
            ],
            RelayError::TypeConversion { .. } => vec![
                "Check data type compatibility",
                "Verify expected vs actual data types",
            ],
            RelayError::UnsupportedPlatform { .. } => vec![
                "Run the relay on the Windows machine that hosts iRacing",
            ],
            #[cfg(windows)]
            RelayError::WindowsApi { .. } => vec![
                "Check Windows API permissions",
                "Verify system resources availability",
            ],
        }
    }

    /// Helper constructor for configuration errors.
    pub fn config(reason: impl Into<String>) -> Self {
        RelayError::Config { reason: reason.into() }
    }

    /// Helper constructor for file errors with path context.
    pub fn file_error(path: PathBuf, source: std::io::Error) -> Self {
        RelayError::File { path, source }
    }

    /// Helper constructor for transport errors.
    pub fn transport_failed(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        RelayError::Transport { endpoint: endpoint.into(), reason: reason.into(), source: None }
    }

    /// Helper constructor for transport errors with source.
    pub fn transport_failed_with_source(
        endpoint: impl Into<String>,
        reason: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        RelayError::Transport {
            endpoint: endpoint.into(),
            reason: reason.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Helper constructor for log sink errors.
    pub fn log_sink(
        path: PathBuf,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        RelayError::LogSink { path, source: Box::new(source) }
    }

    /// Helper constructor for Windows API errors.
    #[cfg(windows)]
    pub fn windows_api_error(operation: impl Into<String>, source: core::Error) -> Self {
        RelayError::WindowsApi { operation: operation.into(), source }
    }

    /// Helper constructor for unsupported platform errors.
    pub fn unsupported_platform(
        feature: impl Into<String>,
        required_platform: impl Into<String>,
    ) -> Self {
        RelayError::UnsupportedPlatform {
            feature: feature.into(),
            required_platform: required_platform.into(),
        }
    }
}

impl From<std::io::Error> for RelayError {
    fn from(err: std::io::Error) -> Self {
        RelayError::File { path: PathBuf::from("<unknown>"), source: err }
    }
}

#[cfg(windows)]
impl From<core::Error> for RelayError {
    fn from(err: core::Error) -> Self {
        RelayError::WindowsApi { operation: "Unknown Windows operation".to_string(), source: err }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn transport_messages_carry_endpoint_and_reason(
            endpoint in "[a-z0-9.]+:[0-9]{2,5}",
            reason in ".*"
        ) {
            let msg = RelayError::transport_failed(endpoint.clone(), reason.clone()).to_string();
            prop_assert!(msg.contains(&endpoint));
            prop_assert!(msg.contains(&reason));
        }

        #[test]
        fn timeout_messages_are_never_empty(duration_ms in 1u64..60000u64) {
            let err = RelayError::Timeout { duration: Duration::from_millis(duration_ms) };
            prop_assert!(!err.to_string().is_empty());
            prop_assert!(err.is_retryable());
        }
    }

    #[test]
    fn delivery_errors_are_retryable_and_not_fatal() {
        let transport = RelayError::transport_failed("127.0.0.1:1", "refused");
        let timeout = RelayError::Timeout { duration: Duration::from_secs(2) };

        for err in [&transport, &timeout] {
            assert!(err.is_retryable());
            assert!(!err.is_fatal());
            assert!(!err.recovery_suggestions().is_empty());
        }
    }

    #[test]
    fn startup_errors_are_fatal() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let file = RelayError::file_error(PathBuf::from("/logs"), io);
        let config = RelayError::config("poll interval must be positive");

        assert!(file.is_fatal());
        assert!(config.is_fatal());
        assert!(!file.is_retryable());
        assert!(config.to_string().contains("poll interval"));
    }

    #[test]
    fn transport_source_is_chained() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused by peer");
        let err = RelayError::transport_failed_with_source("collector:80", "connect failed", io);

        let source = std::error::Error::source(&err).expect("source should be kept");
        assert!(source.to_string().contains("refused by peer"));
    }

    #[test]
    fn error_traits_validation() {
        fn assert_send_sync_static<T: Send + Sync + 'static>() {}
        assert_send_sync_static::<RelayError>();

        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test file");
        match RelayError::from(io_err) {
            RelayError::File { source, .. } => assert_eq!(source.to_string(), "test file"),
            other => panic!("Expected File error variant, got {other:?}"),
        }
    }
}
