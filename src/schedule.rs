//! Bundle selection per loop tick
//!
//! Two modes:
//! - [`Schedule::Fixed`] samples the same bundle on every connected tick.
//! - [`Schedule::RoundRobin`] spreads bundles over a repeating window of `period`
//!   ticks. A slot with offset `o` fires on ticks where `(tick + o) % period == 0`;
//!   ticks that match no slot sample nothing.

use serde::Deserialize;
use std::collections::HashMap;

use crate::registry::FieldSetRegistry;
use crate::{RelayError, Result};

/// One bundle's position in a round-robin window.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Slot {
    pub bundle: String,
    #[serde(default)]
    pub offset: u64,
}

impl Slot {
    pub fn new(bundle: impl Into<String>, offset: u64) -> Self {
        Self { bundle: bundle.into(), offset }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Schedule {
    Fixed {
        #[serde(default = "default_bundle")]
        bundle: String,
    },
    RoundRobin {
        #[serde(default = "default_period")]
        period: u64,
        #[serde(default = "default_slots")]
        slots: Vec<Slot>,
    },
}

impl Default for Schedule {
    fn default() -> Self {
        Schedule::Fixed { bundle: default_bundle() }
    }
}

fn default_bundle() -> String {
    "Vehicle".to_string()
}

fn default_period() -> u64 {
    20
}

/// Six bundles spread three ticks apart over a 20-tick window.
fn default_slots() -> Vec<Slot> {
    vec![
        Slot::new("Track", 0),
        Slot::new("Compute", 3),
        Slot::new("Camera", 6),
        Slot::new("Vehicle", 9),
        Slot::new("Race", 12),
        Slot::new("Environment", 15),
    ]
}

impl Schedule {
    /// Round-robin schedule over the default window.
    pub fn round_robin() -> Self {
        Schedule::RoundRobin { period: default_period(), slots: default_slots() }
    }

    /// Bundle to sample on `tick`, if any.
    pub fn select(&self, tick: u64) -> Option<&str> {
        match self {
            Schedule::Fixed { bundle } => Some(bundle.as_str()),
            Schedule::RoundRobin { period: 0, .. } => None,
            Schedule::RoundRobin { period, slots } => slots
                .iter()
                .find(|slot| tick % period == (period - slot.offset % period) % period)
                .map(|slot| slot.bundle.as_str()),
        }
    }

    /// Every bundle this schedule can select.
    pub fn bundles(&self) -> Vec<&str> {
        match self {
            Schedule::Fixed { bundle } => vec![bundle.as_str()],
            Schedule::RoundRobin { slots, .. } => slots.iter().map(|s| s.bundle.as_str()).collect(),
        }
    }

    /// Check every named bundle exists and no round-robin slot is shadowed.
    pub fn validate(&self, registry: &FieldSetRegistry) -> Result<()> {
        if let Schedule::RoundRobin { period, slots } = self {
            if *period == 0 {
                return Err(RelayError::config("round-robin period must be greater than zero"));
            }
            if slots.is_empty() {
                return Err(RelayError::config("round-robin schedule has no slots"));
            }

            let mut positions = HashMap::new();
            for slot in slots {
                if let Some(other) = positions.insert(slot.offset % period, &slot.bundle) {
                    return Err(RelayError::config(format!(
                        "round-robin slots '{}' and '{}' share offset {}",
                        other, slot.bundle, slot.offset
                    )));
                }
            }
        }

        for bundle in self.bundles() {
            if !registry.contains(bundle) {
                let known: Vec<_> = registry.names().collect();
                return Err(RelayError::config(format!(
                    "schedule names unknown bundle '{}' (known: {})",
                    bundle,
                    known.join(", ")
                )));
            }
        }
        Ok(())
    }
}
