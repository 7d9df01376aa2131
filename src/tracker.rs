//! Connection state tracking for the telemetry source

use chrono::Utc;
use tracing::{debug, info};

use crate::source::TelemetrySource;

/// Whether the simulator is currently reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
}

/// Session-scoped counters, reset whenever the connection drops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionCounters {
    /// Last loop tick whose sample was dispatched in this session
    pub last_processed_tick: i64,
}

impl SessionCounters {
    /// Value every counter holds before anything has been processed.
    pub const SENTINEL: i64 = -1;

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_reset(&self) -> bool {
        self.last_processed_tick == Self::SENTINEL
    }
}

impl Default for SessionCounters {
    fn default() -> Self {
        Self { last_processed_tick: Self::SENTINEL }
    }
}

/// Two-state machine deciding when sampling is allowed.
///
/// The tracker is the only component that starts or stops the source.
#[derive(Debug, Default)]
pub struct ConnectionTracker {
    state: ConnectionState,
    session: SessionCounters,
    transitions: u64,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check the source and apply at most one transition.
    ///
    /// - Connected, source no longer ready: reset session counters, shut the source
    ///   down, and log the disconnection.
    /// - Disconnected, startup succeeds and the source is ready: log the connection.
    /// - Anything else leaves the state untouched.
    pub fn tick<S>(&mut self, source: &mut S) -> ConnectionState
    where
        S: TelemetrySource + ?Sized,
    {
        match self.state {
            ConnectionState::Connected if !source.is_ready() => {
                self.state = ConnectionState::Disconnected;
                self.session.reset();
                self.transitions += 1;
                source.shutdown();
                info!(at = %Utc::now().to_rfc2822(), "irsdk disconnected");
            }
            ConnectionState::Disconnected if source.startup() && source.is_ready() => {
                self.state = ConnectionState::Connected;
                self.transitions += 1;
                info!(at = %Utc::now().to_rfc2822(), "irsdk connected");
            }
            _ => {}
        }
        self.state
    }

    /// Record that the sample taken on `tick` was dispatched.
    pub fn mark_processed(&mut self, tick: u64) {
        if self.state == ConnectionState::Connected {
            self.session.last_processed_tick = i64::try_from(tick).unwrap_or(i64::MAX);
        }
    }

    /// Shut a connected source down when the poll loop exits.
    pub fn release<S>(&mut self, source: &mut S)
    where
        S: TelemetrySource + ?Sized,
    {
        if self.state == ConnectionState::Connected {
            debug!("Releasing telemetry source");
            source.shutdown();
            self.state = ConnectionState::Disconnected;
            self.session.reset();
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn session(&self) -> SessionCounters {
        self.session
    }

    /// Number of state changes since creation.
    pub fn transitions(&self) -> u64 {
        self.transitions
    }
}
