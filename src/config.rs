//! Relay configuration
//!
//! Loaded from a YAML file. Every key has a default, so an empty file, or no file
//! at all, gives a working configuration that samples the `Vehicle` bundle every
//! 300ms and sends it over TCP to `127.0.0.1:8080`.
//!
//! ```yaml
//! collector:
//!   transport: http
//!   url: https://collector.example:8088/services/collector/event
//!   token: 00000000-0000-0000-0000-000000000000
//!   timeout_ms: 2000
//!   host: rig-1
//! poll:
//!   interval_ms: 300
//!   schedule:
//!     mode: round_robin
//! logging:
//!   root: C:/iracing_telemetry
//!   rotation: minutely
//!   retain: 120
//! bundles:
//!   Pit: [OnPitRoad, PitstopActive, PlayerCarInPitStall]
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::registry::FieldSetRegistry;
use crate::schedule::Schedule;
use crate::{RelayError, Result};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RelayConfig {
    pub collector: CollectorConfig,
    pub poll: PollConfig,
    pub logging: LoggingConfig,
    /// Bundles added to, or replacing, the built-in table
    pub bundles: BTreeMap<String, Vec<String>>,
}

impl RelayConfig {
    /// Load configuration from `path`, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            debug!("No configuration file given, using defaults");
            return Ok(Self::default());
        };

        let text = std::fs::read_to_string(path)
            .map_err(|e| RelayError::file_error(path.to_path_buf(), e))?;
        let config = Self::from_yaml(&text)
            .map_err(|e| RelayError::config(format!("{}: {}", path.display(), e)))?;

        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml_ng::from_str(text).map_err(|e| RelayError::config(e.to_string()))
    }

    /// Bundle registry: built-in bundles with configured bundles applied.
    pub fn registry(&self) -> Result<FieldSetRegistry> {
        FieldSetRegistry::builtin()?.with_overrides(&self.bundles)
    }

    /// Check values that have no sensible meaning at runtime.
    pub fn validate(&self, registry: &FieldSetRegistry) -> Result<()> {
        if self.poll.interval_ms == 0 {
            return Err(RelayError::config("poll.interval_ms must be greater than zero"));
        }
        if self.collector.timeout_ms == 0 {
            return Err(RelayError::config("collector.timeout_ms must be greater than zero"));
        }
        if self.logging.retain == 0 {
            return Err(RelayError::config("logging.retain must be greater than zero"));
        }
        self.collector.endpoint()?;
        self.poll.schedule.validate(registry)
    }
}

/// Delivery channel selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// One newline-terminated JSON record per TCP connection
    #[default]
    Tcp,
    /// One JSON POST per record
    Http,
}

/// Resolved collector endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Tcp { address: String },
    Http { url: String, token: Option<String> },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CollectorConfig {
    pub transport: TransportKind,
    /// `host:port` for the TCP transport
    pub address: String,
    /// Collector URL for the HTTP transport
    pub url: Option<String>,
    /// HTTP event collector token
    pub token: Option<String>,
    /// Upper bound on one delivery attempt, connect included
    pub timeout_ms: u64,
    /// Optional label added to every record
    pub host: Option<String>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            transport: TransportKind::Tcp,
            address: "127.0.0.1:8080".to_string(),
            url: None,
            token: None,
            timeout_ms: 2000,
            host: None,
        }
    }
}

impl CollectorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Resolve the endpoint for the selected transport.
    pub fn endpoint(&self) -> Result<Endpoint> {
        match self.transport {
            TransportKind::Tcp if self.address.trim().is_empty() => {
                Err(RelayError::config("collector.address must not be empty"))
            }
            TransportKind::Tcp => Ok(Endpoint::Tcp { address: self.address.trim().to_string() }),
            TransportKind::Http => match self.url.as_deref().map(str::trim) {
                Some(url) if url.starts_with("http://") || url.starts_with("https://") => {
                    Ok(Endpoint::Http { url: url.to_string(), token: self.token.clone() })
                }
                Some(url) => Err(RelayError::config(format!(
                    "collector.url must start with http:// or https://, got '{url}'"
                ))),
                None => Err(RelayError::config("collector.url is required for http transport")),
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PollConfig {
    /// Pause between loop iterations
    pub interval_ms: u64,
    pub schedule: Schedule,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self { interval_ms: 300, schedule: Schedule::default() }
    }
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// How often the rotating logs start a new file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationUnit {
    #[default]
    Minutely,
    Hourly,
    Daily,
    Never,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Directory holding the `app` and `data` log directories
    pub root: PathBuf,
    pub rotation: RotationUnit,
    /// Number of files kept per log
    pub retain: usize,
    /// Filter used when `RUST_LOG` is not set
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            root: default_log_root(),
            rotation: RotationUnit::Minutely,
            retain: 120,
            filter: "info".to_string(),
        }
    }
}

#[cfg(windows)]
fn default_log_root() -> PathBuf {
    PathBuf::from("C:/iracing_telemetry")
}

#[cfg(not(windows))]
fn default_log_root() -> PathBuf {
    PathBuf::from("iracing_telemetry")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let config = RelayConfig::from_yaml("").unwrap();

        assert_eq!(config.poll.interval(), Duration::from_millis(300));
        assert_eq!(config.collector.timeout(), Duration::from_secs(2));
        assert_eq!(
            config.collector.endpoint().unwrap(),
            Endpoint::Tcp { address: "127.0.0.1:8080".into() }
        );
        assert_eq!(config.logging.retain, 120);
        assert_eq!(config.poll.schedule, Schedule::Fixed { bundle: "Vehicle".into() });
        config.validate(&config.registry().unwrap()).unwrap();
    }

    #[test]
    fn parses_full_document() {
        let yaml = r#"
collector:
  transport: http
  url: https://collector.example/services/collector
  token: abc
  timeout_ms: 500
  host: rig-1
poll:
  interval_ms: 100
  schedule:
    mode: round_robin
logging:
  root: /var/log/relay
  rotation: hourly
  retain: 24
bundles:
  Pit: [OnPitRoad, PitstopActive]
"#;
        let config = RelayConfig::from_yaml(yaml).unwrap();

        assert_eq!(
            config.collector.endpoint().unwrap(),
            Endpoint::Http {
                url: "https://collector.example/services/collector".into(),
                token: Some("abc".into())
            }
        );
        assert_eq!(config.collector.host.as_deref(), Some("rig-1"));
        assert_eq!(config.logging.rotation, RotationUnit::Hourly);
        assert!(matches!(config.poll.schedule, Schedule::RoundRobin { period: 20, .. }));

        let registry = config.registry().unwrap();
        assert!(registry.contains("Pit"));
        config.validate(&registry).unwrap();
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = RelayConfig::from_yaml("poll:\n  intervall_ms: 5\n").unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn http_requires_url() {
        let config = RelayConfig::from_yaml("collector:\n  transport: http\n").unwrap();
        assert!(config.collector.endpoint().is_err());

        let config =
            RelayConfig::from_yaml("collector:\n  transport: http\n  url: ftp://x\n").unwrap();
        assert!(config.collector.endpoint().is_err());
    }

    #[test]
    fn zero_interval_and_unknown_bundle_fail_validation() {
        let registry = FieldSetRegistry::builtin().unwrap();

        let config = RelayConfig::from_yaml("poll:\n  interval_ms: 0\n").unwrap();
        assert!(config.validate(&registry).is_err());

        let yaml = "poll:\n  schedule:\n    mode: fixed\n    bundle: Nope\n";
        let config = RelayConfig::from_yaml(yaml).unwrap();
        assert!(config.validate(&registry).unwrap_err().to_string().contains("Nope"));
    }

    #[test]
    fn missing_file_is_a_file_error() {
        let err = RelayConfig::load(Some(Path::new("/definitely/not/here.yaml"))).unwrap_err();
        assert!(matches!(err, RelayError::File { .. }));
    }
}
