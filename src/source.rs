//! Telemetry source trait

use crate::types::Value;

/// Trait for simulator telemetry sources.
///
/// A source owns the session with the simulator. Only the connection tracker starts
/// and stops it; the sampler only reads through it.
pub trait TelemetrySource: Send {
    /// Whether the source has attached to the simulator's telemetry interface.
    fn is_initialized(&self) -> bool;

    /// Whether the simulator reports an active session.
    fn is_connected(&self) -> bool;

    /// Attach to the simulator. Returns `true` when the source is usable afterwards.
    ///
    /// Called on every tick while disconnected, so a failed attempt must be cheap
    /// and must leave the source in a state where a later attempt can succeed.
    fn startup(&mut self) -> bool;

    /// Release the session and clear all cached state.
    fn shutdown(&mut self);

    /// Current value of a named field.
    ///
    /// Returns `None` for names the simulator does not expose, and for any value
    /// that cannot be read right now. Never panics.
    fn read(&self, field: &str) -> Option<Value>;

    /// Whether the source is both initialized and connected.
    fn is_ready(&self) -> bool {
        self.is_initialized() && self.is_connected()
    }
}

impl<S: TelemetrySource + ?Sized> TelemetrySource for Box<S> {
    fn is_initialized(&self) -> bool {
        (**self).is_initialized()
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn startup(&mut self) -> bool {
        (**self).startup()
    }

    fn shutdown(&mut self) {
        (**self).shutdown()
    }

    fn read(&self, field: &str) -> Option<Value> {
        (**self).read(field)
    }
}
