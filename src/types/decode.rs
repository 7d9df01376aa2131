//! Decoding of single variables from a raw telemetry row

use super::{BitField, Value, VariableInfo, VariableType};
use crate::{RelayError, Result};

impl Value {
    /// Decode the variable described by `info` from a raw telemetry row.
    ///
    /// Scalars (`count == 1`) decode to the matching scalar variant, char arrays to
    /// [`Value::Text`] trimmed at the first NUL, and other arrays to [`Value::Array`].
    /// All reads are bounds-checked against `row`.
    pub fn decode(row: &[u8], info: &VariableInfo) -> Result<Value> {
        if info.count == 0 {
            return Err(RelayError::TypeConversion {
                details: format!("Variable '{}' has count of 0", info.name),
            });
        }

        if info.count == 1 {
            return decode_scalar(row, info.data_type, info.offset);
        }

        let size = info.data_type.size();
        let end = info.offset + size * info.count;
        let bytes = row.get(info.offset..end).ok_or(RelayError::Memory { offset: info.offset })?;

        if info.data_type == VariableType::Char {
            let text = bytes.split(|b| *b == 0).next().unwrap_or_default();
            return Ok(Value::Text(String::from_utf8_lossy(text).into_owned()));
        }

        (0..info.count)
            .map(|i| decode_scalar(row, info.data_type, info.offset + i * size))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array)
    }
}

fn decode_scalar(row: &[u8], data_type: VariableType, offset: usize) -> Result<Value> {
    let value = match data_type {
        VariableType::Char => Value::Char(u8::from_le_bytes(take(row, offset)?)),
        VariableType::Int8 => Value::Int8(i8::from_le_bytes(take(row, offset)?)),
        VariableType::UInt8 => Value::UInt8(u8::from_le_bytes(take(row, offset)?)),
        VariableType::Bool => Value::Bool(u8::from_le_bytes(take(row, offset)?) != 0),
        VariableType::Int16 => Value::Int16(i16::from_le_bytes(take(row, offset)?)),
        VariableType::UInt16 => Value::UInt16(u16::from_le_bytes(take(row, offset)?)),
        VariableType::Int32 => Value::Int32(i32::from_le_bytes(take(row, offset)?)),
        VariableType::UInt32 => Value::UInt32(u32::from_le_bytes(take(row, offset)?)),
        VariableType::BitField => Value::BitField(BitField(u32::from_le_bytes(take(row, offset)?))),
        VariableType::Float32 => Value::Float32(f32::from_le_bytes(take(row, offset)?)),
        VariableType::Float64 => Value::Float64(f64::from_le_bytes(take(row, offset)?)),
    };
    Ok(value)
}

fn take<const N: usize>(row: &[u8], offset: usize) -> Result<[u8; N]> {
    row.get(offset..offset + N)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or(RelayError::Memory { offset })
}
