//! Poll loop that samples the simulator and dispatches records

use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::dispatcher::{DispatchOutcome, Dispatcher};
use crate::registry::FieldSetRegistry;
use crate::sampler::sample;
use crate::schedule::Schedule;
use crate::source::TelemetrySource;
use crate::tracker::{ConnectionState, ConnectionTracker};

/// Lifecycle of a [`PollLoop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
    Stopped,
}

/// Counters reported when the loop exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub ticks: u64,
    pub connected_ticks: u64,
    pub delivered: u64,
    pub fallbacks: u64,
}

impl LoopStats {
    pub fn dispatched(&self) -> u64 {
        self.delivered + self.fallbacks
    }
}

/// Sequential poll loop: check connection, sample, dispatch, sleep.
///
/// Iterations never overlap. A slow dispatch delays the next sample instead of
/// racing it, and records leave in tick order.
pub struct PollLoop<S> {
    source: S,
    tracker: ConnectionTracker,
    registry: FieldSetRegistry,
    schedule: Schedule,
    dispatcher: Dispatcher,
    interval: Duration,
    tick: u64,
    state: LoopState,
    stats: LoopStats,
}

impl<S: TelemetrySource> PollLoop<S> {
    pub fn new(
        source: S,
        registry: FieldSetRegistry,
        schedule: Schedule,
        dispatcher: Dispatcher,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            tracker: ConnectionTracker::new(),
            registry,
            schedule,
            dispatcher,
            interval,
            tick: 0,
            state: LoopState::Idle,
            stats: LoopStats::default(),
        }
    }

    /// Run one iteration without sleeping.
    ///
    /// Returns the dispatch outcome when a bundle was sampled on this tick.
    pub async fn step(&mut self) -> Option<DispatchOutcome> {
        let connection = self.tracker.tick(&mut self.source);
        self.tick = self.tick.wrapping_add(1);
        self.stats.ticks += 1;

        if connection != ConnectionState::Connected {
            trace!(tick = self.tick, "Simulator not connected, skipping tick");
            return None;
        }
        self.stats.connected_ticks += 1;

        let bundle = self.schedule.select(self.tick)?;
        let Some(set) = self.registry.get(bundle) else {
            warn!(bundle, "Scheduled bundle is not registered");
            return None;
        };

        let sample = sample(set, &self.source);
        debug!(tick = self.tick, bundle, fields = sample.len(), "Sampled bundle");

        let outcome = self.dispatcher.dispatch(sample, set.name()).await;
        match outcome {
            DispatchOutcome::Delivered => self.stats.delivered += 1,
            DispatchOutcome::FailedFallback => self.stats.fallbacks += 1,
        }
        self.tracker.mark_processed(self.tick);

        Some(outcome)
    }

    /// Run until `cancel` fires.
    ///
    /// Cancellation is only observed between iterations and during the sleep, so an
    /// in-flight dispatch always completes or falls back first. The source is
    /// released before returning.
    pub async fn run(&mut self, cancel: CancellationToken) -> LoopStats {
        if self.state == LoopState::Stopped {
            warn!("Poll loop already stopped");
            return self.stats;
        }

        self.state = LoopState::Running;
        info!(
            interval_ms = self.interval.as_millis() as u64,
            schedule = ?self.schedule.bundles(),
            endpoint = self.dispatcher.endpoint(),
            "Poll loop started"
        );

        loop {
            if cancel.is_cancelled() {
                break;
            }

            self.step().await;

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        self.tracker.release(&mut self.source);
        self.state = LoopState::Stopped;

        info!(
            ticks = self.stats.ticks,
            connected_ticks = self.stats.connected_ticks,
            delivered = self.stats.delivered,
            fallbacks = self.stats.fallbacks,
            "Poll loop stopped"
        );
        self.stats
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn connection(&self) -> ConnectionState {
        self.tracker.state()
    }

    pub fn tracker(&self) -> &ConnectionTracker {
        &self.tracker
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }
}
