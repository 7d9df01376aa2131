use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use pitwall_relay::config::{LoggingConfig, RelayConfig, TransportKind};
use pitwall_relay::sinks::{DataLog, app_layer};
use pitwall_relay::{Dispatcher, LiveSource, LogDirs, PollLoop, RelayError, Schedule, transport};

/// Poll iRacing telemetry and forward field bundles to a collector.
#[derive(Debug, Parser)]
#[command(name = "pitwall-relay", version)]
struct Cli {
    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Collector endpoint: `host:port` for TCP, or an http(s) URL
    #[arg(long)]
    endpoint: Option<String>,

    /// Directory holding the `app` and `data` logs
    #[arg(long)]
    log_root: Option<PathBuf>,

    /// Pause between loop iterations, in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Sample only this bundle on every tick
    #[arg(long)]
    bundle: Option<String>,

    /// Print the available bundles and exit
    #[arg(long)]
    list_bundles: bool,
}

impl Cli {
    fn apply(&self, config: &mut RelayConfig) {
        if let Some(endpoint) = &self.endpoint {
            if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
                config.collector.transport = TransportKind::Http;
                config.collector.url = Some(endpoint.clone());
            } else {
                config.collector.transport = TransportKind::Tcp;
                config.collector.address = endpoint.clone();
            }
        }
        if let Some(root) = &self.log_root {
            config.logging.root = root.clone();
        }
        if let Some(interval_ms) = self.interval_ms {
            config.poll.interval_ms = interval_ms;
        }
        if let Some(bundle) = &self.bundle {
            config.poll.schedule = Schedule::Fixed { bundle: bundle.clone() };
        }
    }
}

fn init_tracing(config: &LoggingConfig, dirs: &LogDirs) -> Result<()> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.filter.as_str().into());
    let console_layer = tracing_subscriber::fmt::layer().with_target(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(app_layer(dirs, config)?)
        .try_init()
        .map_err(|err| anyhow::anyhow!(err.to_string()))?;
    Ok(())
}

/// Recovery suggestions for a relay error that stops the process.
fn recovery_hints(err: &anyhow::Error) -> Vec<&'static str> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<RelayError>())
        .filter(|relay| relay.is_fatal())
        .map(RelayError::recovery_suggestions)
        .unwrap_or_default()
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let result = run(Cli::parse()).await;
    if let Err(err) = &result {
        for hint in recovery_hints(err) {
            eprintln!("  - {hint}");
        }
    }
    result
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = RelayConfig::load(cli.config.as_deref()).context("loading configuration")?;
    cli.apply(&mut config);

    let registry = config.registry().context("building bundle table")?;
    if cli.list_bundles {
        for set in registry.iter() {
            println!("{:<12} {:>4} fields", set.name(), set.len());
        }
        return Ok(());
    }
    config.validate(&registry).context("invalid configuration")?;

    let dirs = LogDirs::create(&config.logging.root).context("creating log directories")?;
    init_tracing(&config.logging, &dirs).context("initialising logging")?;

    let data_log = DataLog::rolling(&dirs, &config.logging).context("opening data log")?;
    let transport = transport::from_config(&config.collector).context("building transport")?;
    let dispatcher = Dispatcher::new(transport, data_log, config.collector.timeout())
        .with_host(config.collector.host.clone());

    info!(
        version = env!("CARGO_PKG_VERSION"),
        log_root = %dirs.root.display(),
        bundles = registry.len(),
        "pitwall-relay starting"
    );

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupt received, stopping");
                interrupt.cancel();
            }
            Err(e) => warn!("Cannot listen for interrupt: {}", e),
        }
    });

    let mut poll = PollLoop::new(
        LiveSource::new(),
        registry,
        config.poll.schedule.clone(),
        dispatcher,
        config.poll.interval(),
    );
    poll.run(cancel).await;

    Ok(())
}
