//! Event scheduling, systems, and the tick loop for Tickwork.
//!
//! This crate provides:
//! - [`Simulation`] - The aggregate root exposing every public operation
//! - [`EventQueues`] - Time-ordered pending events and pollable ready events
//! - [`SystemRegistry`] - Per-tick callbacks sorted by explicit order
//! - [`SimulationDiagnostics`] - Occupancy counters and limits

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod diagnostics;
pub mod event;
pub mod simulation;
pub mod system;
pub mod tick;

pub use diagnostics::SimulationDiagnostics;
pub use event::{EventDesc, EventMeta, EventQueues, EventRecord, EventRegistry, PolledEvent};
pub use simulation::{Simulation, SimulationState};
pub use system::{System, SystemEntry, SystemRegistry};
