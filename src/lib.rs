//! Tickwork - Deterministic tick-based simulation engine
//!
//! This crate re-exports all layers of the Tickwork system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 4: tickwork_debug:       Checkpoint history, state diffs
//! Layer 3: tickwork_runtime:     Binary snapshot codec, file persistence
//! Layer 2: tickwork_engine:      Events, systems, tick scheduler, Simulation
//! Layer 1: tickwork_storage:     Entity table, component registry and blobs
//! Layer 0: tickwork_foundation:  Core types (EntityId, config, Error)
//! ```

pub use tickwork_debug as debug;
pub use tickwork_engine as engine;
pub use tickwork_foundation as foundation;
pub use tickwork_runtime as runtime;
pub use tickwork_storage as storage;
