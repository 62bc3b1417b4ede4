//! History buffer for storing snapshot checkpoints.
//!
//! Implements a bounded ring buffer of encoded simulation snapshots for time
//! travel. Checkpoints are kept in strictly increasing tick order.

use std::collections::VecDeque;
use std::sync::Arc;

use tickwork_engine::{Simulation, SimulationDiagnostics};
use tickwork_foundation::{Result, Tick};
use tickwork_runtime::{load_bytes, to_bytes};

// =============================================================================
// Checkpoint
// =============================================================================

/// An encoded snapshot of the simulation at a particular tick.
#[derive(Clone, Debug)]
pub struct Checkpoint {
    /// The tick the snapshot was taken at.
    tick: Tick,
    /// Snapshot bytes (shared via Arc so clones are cheap).
    bytes: Arc<[u8]>,
    /// Occupancy counters at capture time.
    summary: SimulationDiagnostics,
}

impl Checkpoint {
    /// Encodes the current state of `sim`.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot buffer cannot be allocated.
    pub fn capture(sim: &Simulation) -> Result<Self> {
        let bytes = to_bytes(sim)?;
        Ok(Self {
            tick: sim.tick(),
            bytes: bytes.into(),
            summary: sim.diagnostics(),
        })
    }

    /// Returns the tick number.
    #[must_use]
    pub const fn tick(&self) -> Tick {
        self.tick
    }

    /// Returns the encoded snapshot.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the diagnostics captured alongside the snapshot.
    #[must_use]
    pub fn summary(&self) -> &SimulationDiagnostics {
        &self.summary
    }

    /// Loads this checkpoint into `sim`, replacing its state.
    ///
    /// # Errors
    ///
    /// Fails under the same conditions as [`load_bytes`]; `sim` is untouched
    /// on failure.
    pub fn restore(&self, sim: &mut Simulation) -> Result<()> {
        load_bytes(sim, &self.bytes)
    }
}

// =============================================================================
// History Buffer
// =============================================================================

/// Ring buffer of checkpoints for time travel.
#[derive(Clone, Debug)]
pub struct HistoryBuffer {
    /// The checkpoints in chronological order.
    checkpoints: VecDeque<Checkpoint>,
    /// Maximum number of checkpoints to retain.
    capacity: usize,
}

impl HistoryBuffer {
    /// Creates a new history buffer holding at most `capacity` checkpoints.
    ///
    /// A capacity of zero is treated as one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            checkpoints: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    /// Returns the capacity of the buffer.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of checkpoints in the buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.checkpoints.len()
    }

    /// Returns true if the buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.checkpoints.is_empty()
    }

    /// Pushes a checkpoint, evicting the oldest if at capacity.
    ///
    /// Checkpoints at or after the new tick are discarded first, so a push
    /// after a rewind starts a fresh line of history.
    pub fn push(&mut self, checkpoint: Checkpoint) {
        self.truncate_from(checkpoint.tick);
        if self.checkpoints.len() >= self.capacity {
            self.checkpoints.pop_front();
        }
        self.checkpoints.push_back(checkpoint);
    }

    /// Captures `sim` and pushes the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be encoded.
    pub fn capture(&mut self, sim: &Simulation) -> Result<&Checkpoint> {
        self.push(Checkpoint::capture(sim)?);
        Ok(&self.checkpoints[self.checkpoints.len() - 1])
    }

    /// Gets the checkpoint for a specific tick.
    #[must_use]
    pub fn get(&self, tick: Tick) -> Option<&Checkpoint> {
        self.checkpoints
            .binary_search_by_key(&tick, Checkpoint::tick)
            .ok()
            .map(|index| &self.checkpoints[index])
    }

    /// Gets the newest checkpoint taken at or before `tick`.
    #[must_use]
    pub fn at_or_before(&self, tick: Tick) -> Option<&Checkpoint> {
        let end = self.checkpoints.partition_point(|c| c.tick <= tick);
        end.checked_sub(1).map(|index| &self.checkpoints[index])
    }

    /// Gets the most recent checkpoint.
    #[must_use]
    pub fn latest(&self) -> Option<&Checkpoint> {
        self.checkpoints.back()
    }

    /// Gets the oldest checkpoint.
    #[must_use]
    pub fn oldest(&self) -> Option<&Checkpoint> {
        self.checkpoints.front()
    }

    /// Returns an iterator over checkpoints from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Checkpoint> {
        self.checkpoints.iter()
    }

    /// Returns an iterator over checkpoints from newest to oldest.
    pub fn iter_rev(&self) -> impl Iterator<Item = &Checkpoint> {
        self.checkpoints.iter().rev()
    }

    /// Returns the range of ticks available.
    #[must_use]
    pub fn tick_range(&self) -> Option<(Tick, Tick)> {
        match (self.checkpoints.front(), self.checkpoints.back()) {
            (Some(first), Some(last)) => Some((first.tick, last.tick)),
            _ => None,
        }
    }

    /// Gets the N most recent checkpoints.
    pub fn recent(&self, count: usize) -> impl Iterator<Item = &Checkpoint> {
        let skip = self.checkpoints.len().saturating_sub(count);
        self.checkpoints.iter().skip(skip)
    }

    /// Total encoded size of every retained checkpoint.
    #[must_use]
    pub fn total_bytes(&self) -> usize {
        self.checkpoints.iter().map(|c| c.bytes.len()).sum()
    }

    /// Clears all checkpoints.
    pub fn clear(&mut self) {
        self.checkpoints.clear();
    }

    /// Removes all checkpoints after the given tick.
    pub fn truncate_after(&mut self, tick: Tick) {
        while self.checkpoints.back().is_some_and(|last| last.tick > tick) {
            self.checkpoints.pop_back();
        }
    }

    fn truncate_from(&mut self, tick: Tick) {
        while self.checkpoints.back().is_some_and(|last| last.tick >= tick) {
            self.checkpoints.pop_back();
        }
    }

    /// Returns the tick and diagnostics of every checkpoint.
    #[must_use]
    pub fn summaries(&self) -> Vec<(Tick, &SimulationDiagnostics)> {
        self.checkpoints
            .iter()
            .map(|c| (c.tick, &c.summary))
            .collect()
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(100)
    }
}

// =============================================================================
// Tests
// =============================================================================
