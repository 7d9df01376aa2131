//! iRacing shared memory access
//!
//! Maps iRacing's shared memory read-only using the same struct layouts as the
//! official C++ SDK. The relay polls on its own cadence, so the data-valid event
//! is not used; readers pick the most recent of the rotating buffers each time.
//!
//! # Usage
//!
//! ```rust,ignore
//! use pitwall_relay::windows::Connection;
//!
//! let connection = Connection::try_connect()?;
//! if connection.is_connected() {
//!     let len = connection.with_latest_row(|row| row.len());
//! }
//! ```

mod connection;

pub use connection::{Connection, IRSDKHeader, VarBuf};
