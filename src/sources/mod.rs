//! Telemetry source implementations

pub mod live;

pub use live::LiveSource;
