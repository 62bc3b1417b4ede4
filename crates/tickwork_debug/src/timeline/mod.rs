//! Time travel for simulations.
//!
//! A [`Timeline`] captures snapshot checkpoints while a simulation runs and can
//! rewind it to any earlier tick. Rewinding restores the nearest checkpoint at
//! or before the target and replays forward from there; the registered systems
//! are kept across the restore, so the replay is deterministic as long as they
//! are.
//!
//! # Example
//!
//! ```
//! use tickwork_debug::Timeline;
//! use tickwork_engine::Simulation;
//! use tickwork_foundation::SimulationConfig;
//!
//! let mut sim = Simulation::new(SimulationConfig::default()).unwrap();
//! let mut timeline = Timeline::new();
//!
//! timeline.step(&mut sim, 10).unwrap();
//! timeline.goto_tick(&mut sim, 4).unwrap();
//! assert_eq!(sim.tick(), 4);
//! ```

mod diff;
mod history;

pub use diff::{
    ComponentChange, DiffGranularity, EntityDiff, SimulationDiff, diff_simulations, diff_summary,
    format_diff,
};
pub use history::{Checkpoint, HistoryBuffer};

use tickwork_engine::Simulation;
use tickwork_foundation::{Error, Result, Tick};
use tracing::{debug, info};

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the timeline.
#[derive(Clone, Debug)]
pub struct TimelineConfig {
    /// Maximum number of checkpoints retained.
    pub history_size: usize,
    /// Capture a checkpoint every this many ticks.
    pub interval: Tick,
    /// Default diff granularity.
    pub diff_granularity: DiffGranularity,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            history_size: 100,
            interval: 1,
            diff_granularity: DiffGranularity::Component,
        }
    }
}

impl TimelineConfig {
    /// Creates a new configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set history size.
    #[must_use]
    pub const fn with_history_size(mut self, size: usize) -> Self {
        self.history_size = size;
        self
    }

    /// Builder method to set the capture interval. Zero is treated as one.
    #[must_use]
    pub const fn with_interval(mut self, interval: Tick) -> Self {
        self.interval = if interval == 0 { 1 } else { interval };
        self
    }

    /// Builder method to set diff granularity.
    #[must_use]
    pub const fn with_granularity(mut self, granularity: DiffGranularity) -> Self {
        self.diff_granularity = granularity;
        self
    }
}

// =============================================================================
// Timeline
// =============================================================================

/// Checkpoint history with rewind and replay.
#[derive(Clone, Debug)]
pub struct Timeline {
    config: TimelineConfig,
    history: HistoryBuffer,
    enabled: bool,
}

impl Timeline {
    /// Creates a new timeline with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(TimelineConfig::default())
    }

    /// Creates a new timeline with custom configuration.
    #[must_use]
    pub fn with_config(config: TimelineConfig) -> Self {
        Self {
            history: HistoryBuffer::new(config.history_size),
            config,
            enabled: true,
        }
    }

    /// Returns whether checkpoints are being captured.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enables capture.
    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Disables capture. Existing checkpoints stay available.
    pub fn disable(&mut self) {
        self.enabled = false;
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &TimelineConfig {
        &self.config
    }

    /// Returns the checkpoint history.
    #[must_use]
    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    /// Captures a checkpoint of `sim` if enabled and the tick falls on the
    /// capture interval. Returns whether a checkpoint was taken.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be encoded.
    pub fn record(&mut self, sim: &Simulation) -> Result<bool> {
        if !self.enabled || sim.tick() % self.config.interval.max(1) != 0 {
            return Ok(false);
        }
        let checkpoint = self.history.capture(sim)?;
        debug!(
            tick = checkpoint.tick(),
            bytes = checkpoint.bytes().len(),
            "captured checkpoint"
        );
        Ok(true)
    }

    /// Advances `sim` one tick at a time, recording after each.
    ///
    /// The current state is recorded first if the history is empty, so the
    /// starting point can always be returned to.
    ///
    /// # Errors
    ///
    /// Returns an error if a checkpoint cannot be encoded.
    pub fn step(&mut self, sim: &mut Simulation, ticks: u32) -> Result<()> {
        if self.history.is_empty() && self.enabled {
            self.history.capture(sim)?;
        }
        for _ in 0..ticks {
            sim.step(1);
            self.record(sim)?;
        }
        Ok(())
    }

    /// Gets a checkpoint taken at exactly `tick`.
    #[must_use]
    pub fn checkpoint(&self, tick: Tick) -> Option<&Checkpoint> {
        self.history.get(tick)
    }

    /// Returns the available tick range.
    #[must_use]
    pub fn tick_range(&self) -> Option<(Tick, Tick)> {
        self.history.tick_range()
    }

    /// Moves `sim` to `tick`.
    ///
    /// Restores the newest checkpoint at or before `tick`, then steps forward
    /// the remaining ticks. Checkpoints after the restored one are kept; they
    /// are replaced as new ones are recorded.
    ///
    /// # Errors
    ///
    /// Returns invalid argument if no checkpoint at or before `tick` is held,
    /// or the load error if the checkpoint is rejected. `sim` is unchanged in
    /// either case.
    pub fn goto_tick(&self, sim: &mut Simulation, tick: Tick) -> Result<()> {
        let checkpoint = self.history.at_or_before(tick).ok_or_else(|| {
            Error::invalid_argument(format!("no checkpoint at or before tick {tick}"))
        })?;
        checkpoint.restore(sim)?;
        let from = checkpoint.tick();

        let mut remaining = tick - from;
        while remaining > 0 {
            let chunk = u32::try_from(remaining).unwrap_or(u32::MAX);
            sim.step(chunk);
            remaining -= Tick::from(chunk);
        }
        info!(tick, from, "moved to tick");
        Ok(())
    }

    /// Restores the checkpoint `checkpoints_back` entries before the latest
    /// and drops everything newer.
    ///
    /// # Errors
    ///
    /// Returns invalid argument if the history is not that deep.
    pub fn rollback(&mut self, sim: &mut Simulation, checkpoints_back: usize) -> Result<Tick> {
        let checkpoint = self
            .history
            .iter_rev()
            .nth(checkpoints_back)
            .ok_or_else(|| {
                Error::invalid_argument(format!(
                    "history holds {} checkpoints, cannot roll back {checkpoints_back}",
                    self.history.len()
                ))
            })?;
        checkpoint.restore(sim)?;
        let tick = checkpoint.tick();
        self.history.truncate_after(tick);
        info!(tick, "rolled back");
        Ok(tick)
    }

    /// Compares the checkpoints at two ticks.
    ///
    /// Both checkpoints are loaded into scratch simulations built from
    /// `template`'s configuration. Returns `None` if either tick has no
    /// checkpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if a checkpoint fails to load.
    pub fn diff_ticks(
        &self,
        template: &Simulation,
        left: Tick,
        right: Tick,
    ) -> Result<Option<SimulationDiff>> {
        let (Some(l), Some(r)) = (self.history.get(left), self.history.get(right)) else {
            return Ok(None);
        };
        let left_sim = materialize(template, l)?;
        let right_sim = materialize(template, r)?;
        Ok(Some(diff_simulations(
            &left_sim,
            &right_sim,
            self.config.diff_granularity,
        )))
    }

    /// Clears the history.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Returns a summary of the timeline state.
    #[must_use]
    pub fn status(&self) -> String {
        use std::fmt::Write;
        let mut summary = String::new();

        let _ = writeln!(
            summary,
            "Timeline: {}",
            if self.enabled { "enabled" } else { "disabled" }
        );
        if let Some((min, max)) = self.tick_range() {
            let _ = writeln!(summary, "Tick range: {min} - {max}");
        } else {
            let _ = writeln!(summary, "Tick range: (empty)");
        }
        let _ = writeln!(
            summary,
            "Checkpoints: {} / {}",
            self.history.len(),
            self.history.capacity()
        );
        let _ = writeln!(summary, "Stored bytes: {}", self.history.total_bytes());

        summary.trim_end().to_string()
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

fn materialize(template: &Simulation, checkpoint: &Checkpoint) -> Result<Simulation> {
    let mut sim = Simulation::new(template.config().clone())?;
    checkpoint.restore(&mut sim)?;
    Ok(sim)
}

// =============================================================================
// Tests
// =============================================================================
