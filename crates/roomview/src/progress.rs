//! Aggregation of load events into a single completion ratio.
//!
//! The tracker is a small state machine:
//!
//! ```text
//! Loading ──(ratio = 1, sources settled)──> Settling ──(ready delay)──> Ready
//!    └──────────────(load failure)──────────> Failed
//! ```
//!
//! `Ready` and `Failed` are terminal; events arriving afterwards are ignored.

use std::collections::HashMap;
use std::time::Duration;

/// Progress of one load source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadEvent {
    /// Which source this event belongs to.
    pub source_id: String,
    /// The sub-resource that just finished, for logging.
    pub item: Option<String>,
    /// Items (or bytes) loaded so far.
    pub loaded: u64,
    /// Items (or bytes) expected in total.
    pub total: u64,
}

impl LoadEvent {
    /// Create an event without an item name.
    #[must_use]
    pub fn new(source_id: impl Into<String>, loaded: u64, total: u64) -> Self {
        Self {
            source_id: source_id.into(),
            item: None,
            loaded,
            total,
        }
    }
}

/// What the UI needs to draw the loading surface.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProgressState {
    /// Completion ratio in `[0, 1]`. Never decreases.
    pub ratio: f32,
    /// The fade-out of the loading surface has started.
    pub fading: bool,
    /// The scene is declared interactable. Set exactly once.
    pub ready: bool,
}

/// Lifecycle phase of a [`ProgressTracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Events are still arriving, or the ratio is below 1.
    #[default]
    Loading,
    /// Fully loaded; the settling timer is running.
    Settling,
    /// Terminal: the scene is ready.
    Ready,
    /// Terminal: the load failed.
    Failed,
}

/// Delays between "fully loaded" and "ready".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettleConfig {
    /// Time after settling before the loading surface starts fading.
    pub fade_delay: Duration,
    /// Time after settling before the scene is declared ready.
    pub ready_delay: Duration,
}

impl Default for SettleConfig {
    fn default() -> Self {
        Self {
            fade_delay: Duration::from_millis(500),
            ready_delay: Duration::from_millis(3500),
        }
    }
}

/// Aggregates [`LoadEvent`]s across sources into one [`ProgressState`].
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    config: SettleConfig,
    /// `(loaded, total)` per source.
    sources: HashMap<String, (u64, u64)>,
    ratio: f32,
    phase: Phase,
    settle_requested: bool,
    settling_for: Duration,
    fading: bool,
    failure: Option<String>,
}

impl ProgressTracker {
    /// Create a tracker with the given settling delays.
    #[must_use]
    pub fn new(config: SettleConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Record an event and return the updated state.
    pub fn on_event(&mut self, event: LoadEvent) -> ProgressState {
        if self.is_terminal() {
            return self.state();
        }

        let entry = self.sources.entry(event.source_id).or_insert((0, 0));
        let loaded = event.loaded.min(event.total);
        if loaded < entry.0 {
            tracing::warn!(
                loaded,
                previous = entry.0,
                "ignoring regressing load event"
            );
        } else {
            *entry = (loaded, event.total);
        }
        if let Some(item) = &event.item {
            tracing::debug!(%item, loaded, total = event.total, "loaded item");
        }

        if let Some(ratio) = self.compute_ratio() {
            self.ratio = self.ratio.max(ratio);
        }
        if self.settle_requested && self.all_complete() {
            self.arm();
        }
        self.state()
    }

    /// Signal that no further events are expected.
    ///
    /// Arms the settling timer now if every known source is complete,
    /// otherwise as soon as late events complete them. When every known
    /// source reported an empty total, there is nothing to wait for.
    pub fn on_all_sources_settled(&mut self) -> ProgressState {
        if !self.is_terminal() {
            self.settle_requested = true;
            // Only empty totals so far: nothing to wait for.
            let only_empty = !self.sources.is_empty() && self.compute_ratio().is_none();
            if only_empty || self.all_complete() {
                self.arm();
            }
        }
        self.state()
    }

    /// Advance the settling timer.
    pub fn advance(&mut self, dt: Duration) -> ProgressState {
        if self.phase != Phase::Settling {
            return self.state();
        }

        self.settling_for += dt;
        if !self.fading && self.settling_for >= self.config.fade_delay {
            self.fading = true;
            tracing::debug!("loading surface fading");
        }
        if self.settling_for >= self.config.ready_delay {
            self.fading = true;
            self.phase = Phase::Ready;
            tracing::info!("scene ready");
        }
        self.state()
    }

    /// Record a load failure. The tracker becomes inert.
    pub fn on_failure(&mut self, source_id: &str, message: impl Into<String>) -> ProgressState {
        if !self.is_terminal() {
            let message = message.into();
            tracing::error!(source_id, %message, "load failed");
            self.failure = Some(message);
            self.phase = Phase::Failed;
        }
        self.state()
    }

    /// The current state.
    #[must_use]
    pub fn state(&self) -> ProgressState {
        ProgressState {
            ratio: self.ratio,
            fading: self.fading,
            ready: self.phase == Phase::Ready,
        }
    }

    /// The current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The failure message, if the load failed.
    #[must_use]
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Time spent in the settling phase so far.
    #[must_use]
    pub fn settling_for(&self) -> Duration {
        self.settling_for
    }

    fn is_terminal(&self) -> bool {
        matches!(self.phase, Phase::Ready | Phase::Failed)
    }

    /// `sum(loaded) / sum(total)` over sources with a non-empty total, or
    /// `None` when no such source has reported.
    fn compute_ratio(&self) -> Option<f32> {
        let (loaded, total) = self
            .sources
            .values()
            .filter(|(_, total)| *total > 0)
            .fold((0u64, 0u64), |(l, t), (loaded, total)| {
                (l.saturating_add(*loaded), t.saturating_add(*total))
            });
        if total == 0 {
            return None;
        }
        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
        let ratio = (loaded as f64 / total as f64) as f32;
        Some(ratio.clamp(0.0, 1.0))
    }

    /// Every source with a non-empty total has finished.
    fn all_complete(&self) -> bool {
        self.compute_ratio().is_some_and(|ratio| ratio >= 1.0)
    }

    fn arm(&mut self) {
        if self.phase != Phase::Loading {
            return;
        }
        self.ratio = 1.0;
        self.phase = Phase::Settling;
        self.settling_for = Duration::ZERO;
        tracing::info!("all sources loaded, settling");
        // Zero delays complete immediately.
        self.advance(Duration::ZERO);
    }
}

/// Receiver of load events.
///
/// Loaders only talk to a sink; the tracker lives wherever the sink
/// forwards to.
pub trait ProgressSink: Send + Sync {
    /// Deliver one event.
    fn emit(&self, event: LoadEvent);
}

/// A sink that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn emit(&self, _event: LoadEvent) {}
}

impl ProgressSink for async_channel::Sender<LoadEvent> {
    fn emit(&self, event: LoadEvent) {
        if let Err(e) = self.try_send(event) {
            tracing::debug!("dropping load event: {e}");
        }
    }
}
