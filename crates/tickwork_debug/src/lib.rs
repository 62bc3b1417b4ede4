//! Checkpoint history, rewind, and state diffs for Tickwork.
//!
//! This crate provides:
//! - [`Timeline`] - Periodic checkpoints with rewind and replay
//! - [`HistoryBuffer`] - A bounded ring of snapshot checkpoints keyed by tick
//! - [`diff_simulations`] - Structural comparison of two simulations

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod timeline;

pub use timeline::{
    Checkpoint, ComponentChange, DiffGranularity, EntityDiff, HistoryBuffer, SimulationDiff,
    Timeline, TimelineConfig, diff_simulations, diff_summary, format_diff,
};
