//! Integration tests for Layer 2: Engine
//!
//! Tests for event scheduling, systems, the tick loop, and the Simulation
//! facade.

mod simulation;
mod systems;
