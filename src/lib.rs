//! Telemetry relay for iRacing.
//!
//! Pitwall Relay polls the simulator's shared-memory telemetry on a fixed interval,
//! samples a named bundle of fields, and forwards each sample to a remote collector
//! as a timestamped JSON record. Records that cannot be delivered are appended to a
//! rotating local data log instead.
//!
//! # Features
//!
//! - **Connection tracking**: Attaches when the simulator starts, releases it on exit
//! - **Field bundles**: Built-in `Vehicle`, `Race`, `Track` and friends, extendable from config
//! - **Scheduling**: One fixed bundle, or several bundles interleaved round-robin
//! - **Delivery**: TCP or HTTP event collector, with a bounded attempt per record
//! - **Fallback**: Undelivered records land in `data/json.log.*`, nothing is dropped
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use pitwall_relay::{
//!     Dispatcher, FieldSetRegistry, LiveSource, LogDirs, PollLoop, Schedule,
//!     config::LoggingConfig, sinks::DataLog, transport::TcpTransport,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> pitwall_relay::Result<()> {
//!     let logging = LoggingConfig::default();
//!     let dirs = LogDirs::create(&logging.root)?;
//!     let dispatcher = Dispatcher::new(
//!         Box::new(TcpTransport::new("127.0.0.1:8080")),
//!         DataLog::rolling(&dirs, &logging)?,
//!         Duration::from_secs(2),
//!     );
//!
//!     let mut poll = PollLoop::new(
//!         LiveSource::new(),
//!         FieldSetRegistry::builtin()?,
//!         Schedule::default(),
//!         dispatcher,
//!         Duration::from_millis(300),
//!     );
//!     poll.run(CancellationToken::new()).await;
//!     Ok(())
//! }
//! ```

// Core types and error handling
mod error;
#[cfg(test)]
mod test_utils;
pub mod types;

// Configuration
pub mod config;
pub mod registry;
pub mod schedule;

// Sampling
pub mod sampler;
pub mod source;
pub mod sources;
pub mod tracker;

// Delivery
pub mod dispatcher;
pub mod record;
pub mod sinks;
pub mod transport;

// Poll loop
pub mod driver;

// Platform-specific modules
#[cfg(windows)]
pub mod windows;

// Core exports
pub use error::*;
pub use types::*;

pub use config::RelayConfig;
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use driver::{LoopState, LoopStats, PollLoop};
pub use record::Record;
pub use registry::{FieldSet, FieldSetRegistry};
pub use sampler::{Sample, sample};
pub use schedule::Schedule;
pub use sinks::LogDirs;
pub use source::TelemetrySource;
pub use sources::LiveSource;
pub use tracker::{ConnectionState, ConnectionTracker};

// Windows memory exports
#[cfg(windows)]
pub use windows::Connection as WindowsConnection;
