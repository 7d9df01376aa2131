//! Named field bundles sampled together.
//!
//! A [`FieldSet`] is an immutable, ordered list of iRacing variable names. The
//! [`FieldSetRegistry`] holds every bundle known to the process, keyed by bundle name.
//! The built-in table lives in `config/bundles.yaml` and is embedded at compile time;
//! configuration can add bundles or replace built-in ones by name.

use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

use crate::{RelayError, Result};

/// Built-in bundle table.
const BUILTIN_BUNDLES: &str = include_str!("../config/bundles.yaml");

/// An immutable, ordered set of field names sampled together under one label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSet {
    name: String,
    fields: Vec<String>,
}

impl FieldSet {
    /// Create a field set, rejecting an empty name or repeated field names.
    pub fn new<I, S>(name: impl Into<String>, fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(RelayError::config("bundle name must not be empty"));
        }

        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        let mut seen = HashSet::with_capacity(fields.len());
        for field in &fields {
            if field.is_empty() {
                return Err(RelayError::config(format!("bundle '{name}' has an empty field name")));
            }
            if !seen.insert(field.as_str()) {
                return Err(RelayError::config(format!(
                    "bundle '{name}' lists field '{field}' more than once"
                )));
            }
        }

        Ok(Self { name, fields })
    }

    /// Bundle name, also used as the record's `source` label.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Field names in declaration order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// On-disk shape of a bundle table.
#[derive(Debug, Default, Deserialize)]
pub struct BundleTable {
    #[serde(default)]
    pub bundles: BTreeMap<String, Vec<String>>,
}

/// Every bundle known to the process, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct FieldSetRegistry {
    sets: BTreeMap<String, FieldSet>,
}

impl FieldSetRegistry {
    /// Registry holding the built-in bundles.
    pub fn builtin() -> Result<Self> {
        let table: BundleTable = serde_yaml_ng::from_str(BUILTIN_BUNDLES)
            .map_err(|e| RelayError::config(format!("built-in bundle table: {e}")))?;
        Self::from_table(table.bundles)
    }

    /// Registry built from a name to field-list map.
    pub fn from_table(table: BTreeMap<String, Vec<String>>) -> Result<Self> {
        let mut registry = Self::default();
        for (name, fields) in table {
            registry.insert(FieldSet::new(name, fields)?);
        }
        Ok(registry)
    }

    /// Add bundles, replacing any existing bundle with the same name.
    pub fn with_overrides(mut self, overrides: &BTreeMap<String, Vec<String>>) -> Result<Self> {
        for (name, fields) in overrides {
            let replaced = self.insert(FieldSet::new(name.clone(), fields.iter().cloned())?);
            debug!(bundle = %name, replaced, "Applied configured bundle");
        }
        Ok(self)
    }

    fn insert(&mut self, set: FieldSet) -> bool {
        self.sets.insert(set.name.clone(), set).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&FieldSet> {
        self.sets.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sets.contains_key(name)
    }

    /// Bundle names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sets.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldSet> {
        self.sets.values()
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_has_every_bundle() {
        let registry = FieldSetRegistry::builtin().unwrap();
        let names: Vec<_> = registry.names().collect();

        assert_eq!(
            names,
            ["Camera", "Compute", "Environment", "Normalised", "Race", "Track", "Vehicle"]
        );
        for set in registry.iter() {
            assert!(!set.is_empty(), "bundle {} is empty", set.name());
        }
    }

    #[test]
    fn vehicle_bundle_keeps_declaration_order() {
        let registry = FieldSetRegistry::builtin().unwrap();
        let vehicle = registry.get("Vehicle").unwrap();

        assert!(vehicle.fields().iter().any(|f| f == "Speed"));
        assert!(vehicle.fields().iter().any(|f| f == "RPM"));
        assert_eq!(vehicle.fields().last().map(String::as_str), Some("SessionUniqueID"));
    }

    #[test]
    fn duplicate_fields_are_rejected() {
        let err = FieldSet::new("Bad", ["Speed", "RPM", "Speed"]).unwrap_err();
        assert!(err.to_string().contains("Speed"));
        assert!(FieldSet::new("  ", ["Speed"]).is_err());
    }

    #[test]
    fn overrides_replace_and_add() {
        let mut overrides = BTreeMap::new();
        overrides.insert("Vehicle".to_string(), vec!["Speed".to_string()]);
        overrides.insert("Pit".to_string(), vec!["OnPitRoad".to_string()]);

        let registry = FieldSetRegistry::builtin().unwrap().with_overrides(&overrides).unwrap();

        assert_eq!(registry.get("Vehicle").unwrap().fields(), ["Speed"]);
        assert!(registry.contains("Pit"));
        assert_eq!(registry.len(), 8);
    }
}
