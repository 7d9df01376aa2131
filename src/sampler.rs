//! Sampling of one field bundle from a telemetry source

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::trace;

use crate::registry::FieldSet;
use crate::source::TelemetrySource;
use crate::types::Value;

/// Values read for every field of one bundle at one instant.
///
/// Fields the source could not provide are present with a `None` value, so the key
/// set always equals the bundle's field list.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    fields: BTreeMap<String, Option<Value>>,
    taken_at: DateTime<Utc>,
}

impl Sample {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)?.as_ref()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn fields(&self) -> &BTreeMap<String, Option<Value>> {
        &self.fields
    }

    /// Fields that the source did not provide.
    pub fn missing(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().filter(|(_, v)| v.is_none()).map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }

    pub(crate) fn into_fields(self) -> BTreeMap<String, Option<Value>> {
        self.fields
    }
}

/// Read every field of `set` from `source`.
pub fn sample<S>(set: &FieldSet, source: &S) -> Sample
where
    S: TelemetrySource + ?Sized,
{
    let taken_at = Utc::now();
    let fields: BTreeMap<_, _> =
        set.fields().iter().map(|name| (name.clone(), source.read(name))).collect();

    trace!(
        bundle = set.name(),
        fields = fields.len(),
        missing = fields.values().filter(|v| v.is_none()).count(),
        "Sampled bundle"
    );

    Sample { fields, taken_at }
}
