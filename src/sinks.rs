//! Local rotating log sinks
//!
//! The relay keeps two append-only logs under one root directory:
//!
//! - `app/`: operational messages, written by the tracing subscriber
//! - `data/`: records that could not be delivered, one JSON document per line
//!
//! Both rotate on a fixed wall-clock interval and keep a bounded number of files.

use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{Subscriber, debug};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::Layer;
use tracing_subscriber::registry::LookupSpan;

use crate::config::{LoggingConfig, RotationUnit};
use crate::{RelayError, Result};

/// File name prefix shared by both logs.
const LOG_PREFIX: &str = "json";
/// File name suffix shared by both logs.
const LOG_SUFFIX: &str = "log";

/// Directory layout for the local logs.
#[derive(Debug, Clone)]
pub struct LogDirs {
    pub root: PathBuf,
    pub app: PathBuf,
    pub data: PathBuf,
}

impl LogDirs {
    /// Create `root`, `root/app` and `root/data` if they do not exist.
    pub fn create(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let dirs = Self { app: root.join("app"), data: root.join("data"), root };

        for dir in [&dirs.root, &dirs.app, &dirs.data] {
            std::fs::create_dir_all(dir).map_err(|e| RelayError::file_error(dir.clone(), e))?;
        }

        debug!(root = %dirs.root.display(), "Log directories ready");
        Ok(dirs)
    }
}

impl From<RotationUnit> for Rotation {
    fn from(unit: RotationUnit) -> Self {
        match unit {
            RotationUnit::Minutely => Rotation::MINUTELY,
            RotationUnit::Hourly => Rotation::HOURLY,
            RotationUnit::Daily => Rotation::DAILY,
            RotationUnit::Never => Rotation::NEVER,
        }
    }
}

/// Build a rotating file appender in `dir` with the configured policy.
pub fn rolling_appender(dir: &Path, config: &LoggingConfig) -> Result<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(config.rotation.into())
        .filename_prefix(LOG_PREFIX)
        .filename_suffix(LOG_SUFFIX)
        .max_log_files(config.retain.max(1))
        .build(dir)
        .map_err(|e| RelayError::log_sink(dir.to_path_buf(), e))
}

/// Formatting layer writing plain-text events into the rotating app log.
pub fn app_layer<S>(dirs: &LogDirs, config: &LoggingConfig) -> Result<impl Layer<S> + Send + Sync>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    let appender = rolling_appender(&dirs.app, config)?;
    Ok(tracing_subscriber::fmt::layer().with_ansi(false).with_target(true).with_writer(appender))
}

/// Append-only sink for records that could not be delivered.
pub struct DataLog {
    writer: Box<dyn Write + Send>,
}

impl DataLog {
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self { writer: Box::new(writer) }
    }

    /// Rotating data log in `dirs.data`.
    pub fn rolling(dirs: &LogDirs, config: &LoggingConfig) -> Result<Self> {
        Ok(Self::new(rolling_appender(&dirs.data, config)?))
    }

    /// Append one line and flush it to disk.
    pub fn append(&mut self, line: &str) -> std::io::Result<()> {
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }
}

impl std::fmt::Debug for DataLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataLog").finish_non_exhaustive()
    }
}

/// Most recent log file in `dir`, by name.
///
/// Rotated file names embed the period start, so name order is time order.
pub fn latest_log_file(dir: &Path) -> std::io::Result<Option<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path.file_name().and_then(|n| n.to_str()).is_some_and(|n| n.starts_with(LOG_PREFIX))
        })
        .collect();
    files.sort();
    Ok(files.pop())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::Dispatcher;
    use crate::registry::FieldSet;
    use crate::sampler::sample;
    use crate::test_utils::{FailingTransport, ScriptedSource, SharedBuffer};
    use crate::tracker::ConnectionTracker;
    use std::time::Duration;
    use tracing_subscriber::layer::SubscriberExt;

    fn never_rotating() -> LoggingConfig {
        LoggingConfig { rotation: RotationUnit::Never, ..LoggingConfig::default() }
    }

    #[test]
    fn creates_nested_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let dirs = LogDirs::create(tmp.path().join("iracing_telemetry")).unwrap();

        assert!(dirs.app.is_dir());
        assert!(dirs.data.is_dir());
        assert!(LogDirs::create(&dirs.root).is_ok());
    }

    #[test]
    fn unwritable_root_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("file");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let err = LogDirs::create(blocker.join("logs")).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn data_log_appends_lines_to_rotating_file() {
        let tmp = tempfile::tempdir().unwrap();
        let dirs = LogDirs::create(tmp.path()).unwrap();
        let mut log = DataLog::rolling(&dirs, &never_rotating()).unwrap();
        log.append(r#"{"n":1}"#).unwrap();
        log.append(r#"{"n":2}"#).unwrap();

        let file = latest_log_file(&dirs.data).unwrap().unwrap();
        let text = std::fs::read_to_string(file).unwrap();
        assert_eq!(text.lines().collect::<Vec<_>>(), [r#"{"n":1}"#, r#"{"n":2}"#]);
    }

    #[tokio::test]
    async fn app_log_records_transitions_and_delivery_failures() {
        let tmp = tempfile::tempdir().unwrap();
        let dirs = LogDirs::create(tmp.path()).unwrap();
        let subscriber = tracing_subscriber::registry().with(app_layer(&dirs, &never_rotating()).unwrap());
        let _guard = tracing::subscriber::set_default(subscriber);

        let mut source = ScriptedSource::available().with_value("Speed", 42.5f32);
        let mut tracker = ConnectionTracker::new();
        tracker.tick(&mut source);

        let mut dispatcher = Dispatcher::new(
            Box::new(FailingTransport),
            DataLog::new(SharedBuffer::new()),
            Duration::from_secs(1),
        );
        let set = FieldSet::new("Vehicle", ["Speed"]).unwrap();
        dispatcher.dispatch(sample(&set, &source), "Vehicle").await;

        source.set_available(false);
        tracker.tick(&mut source);

        let file = latest_log_file(&dirs.app).unwrap().expect("app log file");
        let text = std::fs::read_to_string(file).unwrap();
        assert!(text.contains("irsdk connected"), "{text}");
        assert!(text.contains("Delivery failed"), "{text}");
        assert!(text.contains("unreachable:9"), "{text}");
        assert!(text.contains("irsdk disconnected"), "{text}");
        assert!(!text.contains('\x1b'), "app log must not contain ANSI escapes");
    }
}
