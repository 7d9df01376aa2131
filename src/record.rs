//! Record wire format sent to the collector
//!
//! ```json
//! { "source": "Vehicle", "event": { "Speed": 42.5, "Gear": 3, "ts_send": "2024-05-01T12:00:00.123456Z" } }
//! ```
//!
//! Field values keep their native JSON shapes. Fields the simulator did not provide
//! are sent as `null`. An optional `host` label is added at the top level when one
//! is configured.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

use crate::sampler::Sample;
use crate::types::Value;

/// A sample tagged with its source label and send time.
#[derive(Debug, Clone, Serialize)]
pub struct Record {
    source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    host: Option<String>,
    event: Event,
}

#[derive(Debug, Clone, Serialize)]
struct Event {
    #[serde(flatten)]
    fields: BTreeMap<String, Option<Value>>,
    #[serde(serialize_with = "iso8601")]
    ts_send: DateTime<Utc>,
}

impl Record {
    /// Build a record stamped with the current time.
    pub fn new(sample: Sample, source: impl Into<String>) -> Self {
        Self::at(sample, source, Utc::now())
    }

    /// Build a record stamped with `ts_send`.
    pub fn at(sample: Sample, source: impl Into<String>, ts_send: DateTime<Utc>) -> Self {
        Self {
            source: source.into(),
            host: None,
            event: Event { fields: sample.into_fields(), ts_send },
        }
    }

    pub fn with_host(mut self, host: Option<String>) -> Self {
        self.host = host;
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn ts_send(&self) -> DateTime<Utc> {
        self.event.ts_send
    }

    /// Serialise to a single line of JSON.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// RFC 3339 UTC with microseconds and a `Z` suffix.
pub fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn iso8601<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_ts(ts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::FieldSet;
    use crate::sampler::sample;
    use crate::test_utils::ScriptedSource;
    use chrono::TimeZone;

    fn vehicle_sample() -> Sample {
        let source = ScriptedSource::available()
            .with_value("Speed", 42.5f32)
            .with_value("Gear", 3)
            .with_value("CarIdxLapDistPct", vec![0.5f32, 0.25]);
        let set = FieldSet::new("Vehicle", ["Speed", "Gear", "CarIdxLapDistPct", "Yaw"]).unwrap();
        sample(&set, &source)
    }

    #[test]
    fn wire_shape_nests_fields_under_event() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let record = Record::at(vehicle_sample(), "Vehicle", ts);

        let json: serde_json::Value = serde_json::from_str(&record.to_json().unwrap()).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "source": "Vehicle",
                "event": {
                    "Speed": 42.5,
                    "Gear": 3,
                    "CarIdxLapDistPct": [0.5, 0.25],
                    "Yaw": null,
                    "ts_send": "2024-05-01T12:00:00.000000Z"
                }
            })
        );
    }

    #[test]
    fn host_label_is_optional() {
        let plain = Record::new(vehicle_sample(), "Vehicle").to_json().unwrap();
        let tagged = Record::new(vehicle_sample(), "Vehicle")
            .with_host(Some("rig-1".into()))
            .to_json()
            .unwrap();

        assert!(!plain.contains("\"host\""));
        assert!(tagged.contains("\"host\":\"rig-1\""));
    }

    #[test]
    fn record_is_a_single_line() {
        let json = Record::new(vehicle_sample(), "Vehicle").to_json().unwrap();
        assert!(!json.contains('\n'));
    }

    #[test]
    fn ts_send_parses_back_as_utc() {
        let record = Record::new(vehicle_sample(), "Vehicle");
        let rendered = format_ts(&record.ts_send());

        let parsed = DateTime::parse_from_rfc3339(&rendered).unwrap();
        assert_eq!(parsed.offset().local_minus_utc(), 0);
        assert!(rendered.ends_with('Z'));
    }
}
