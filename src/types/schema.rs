//! Telemetry variable schema types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::VariableType;

/// Schema describing the structure and metadata of telemetry variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableSchema {
    /// Map of variable names to their metadata (provides O(1) lookup)
    pub variables: HashMap<String, VariableInfo>,
    /// Total size of a telemetry row in bytes
    pub frame_size: usize,
}

impl VariableSchema {
    /// Create a new VariableSchema with validation.
    pub fn new(variables: HashMap<String, VariableInfo>, frame_size: usize) -> crate::Result<Self> {
        let schema = Self { variables, frame_size };
        schema.validate()?;
        Ok(schema)
    }

    /// Validate the schema for consistency.
    pub fn validate(&self) -> crate::Result<()> {
        for (name, var_info) in &self.variables {
            if var_info.count == 0 {
                return Err(crate::RelayError::TypeConversion {
                    details: format!("Variable '{}' has count of 0", name),
                });
            }

            if var_info.name != *name {
                return Err(crate::RelayError::TypeConversion {
                    details: format!(
                        "Variable map key '{}' doesn't match info name '{}'",
                        name, var_info.name
                    ),
                });
            }

            let end_offset = var_info.offset + (var_info.data_type.size() * var_info.count);
            if end_offset > self.frame_size {
                return Err(crate::RelayError::Memory { offset: var_info.offset });
            }
        }

        Ok(())
    }

    /// Get variable info by name (O(1) lookup).
    pub fn get_variable(&self, name: &str) -> Option<&VariableInfo> {
        self.variables.get(name)
    }

    /// Get the number of variables.
    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }
}

/// Information about a specific telemetry variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableInfo {
    /// Variable name as defined by iRacing
    pub name: String,
    /// Data type of the variable
    pub data_type: VariableType,
    /// Byte offset within the telemetry row
    pub offset: usize,
    /// Number of elements (1 for scalar, >1 for arrays)
    pub count: usize,
    /// Units of measurement (e.g., "m/s", "C", "N*m")
    pub units: String,
}

impl VariableInfo {
    /// Scalar variable at `offset`.
    pub fn scalar(name: impl Into<String>, data_type: VariableType, offset: usize) -> Self {
        Self { name: name.into(), data_type, offset, count: 1, units: String::new() }
    }

    /// Array variable of `count` elements starting at `offset`.
    pub fn array(
        name: impl Into<String>,
        data_type: VariableType,
        offset: usize,
        count: usize,
    ) -> Self {
        Self { name: name.into(), data_type, offset, count, units: String::new() }
    }
}
