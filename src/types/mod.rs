//! Core types for telemetry values.
//!
//! The type system maps directly to iRacing SDK structures:
//! - [`VariableType`] maps to iRacing's `irsdk_VarType` enum with size information
//! - [`VariableSchema`] describes where each variable lives in a telemetry row
//! - [`Value`] holds one decoded variable and serialises to its native JSON shape
//! - [`BitField`] handles iRacing's bitfield variables
//!
//! ## Usage Example
//!
//! ```rust
//! use pitwall_relay::types::{Value, VariableInfo, VariableType};
//!
//! let info = VariableInfo::scalar("RPM", VariableType::Float32, 0);
//! let data = 4500.0f32.to_le_bytes();
//!
//! assert_eq!(Value::decode(&data, &info).unwrap(), Value::Float32(4500.0));
//! ```

mod bitfield;
mod decode;
mod schema;
mod variable_type;

pub use bitfield::BitField;
pub use schema::{VariableInfo, VariableSchema};
pub use variable_type::{Value, VariableType};
