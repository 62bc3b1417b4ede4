//! Occupancy summary of a simulation.

use std::fmt;

use tickwork_foundation::Tick;

/// Point-in-time counters and limits, as returned by
/// [`Simulation::diagnostics`](crate::Simulation::diagnostics).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationDiagnostics {
    /// Configured entity slot limit.
    pub entity_capacity: u32,
    /// Live entities.
    pub entity_count: u32,
    /// Registered component types.
    pub component_registry_count: u32,
    /// Registered event types.
    pub event_registry_count: u32,
    /// Events waiting for their delivery tick.
    pub pending_event_count: u32,
    /// Events that can be polled.
    pub ready_event_count: u32,
    /// Configured queued event limit.
    pub max_events: u32,
    /// Payload bytes held by queued events.
    pub used_event_payload_bytes: u32,
    /// Configured payload byte budget.
    pub max_event_payload_bytes: u32,
    /// Current tick.
    pub current_tick: Tick,
    /// Seconds per tick.
    pub fixed_dt: f32,
}

impl fmt::Display for SimulationDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "tick {} (dt {}s)", self.current_tick, self.fixed_dt)?;
        writeln!(
            f,
            "entities: {}/{}",
            self.entity_count, self.entity_capacity
        )?;
        writeln!(
            f,
            "registries: {} component, {} event",
            self.component_registry_count, self.event_registry_count
        )?;
        write!(
            f,
            "events: {} pending + {} ready of {}, payload {}/{} bytes",
            self.pending_event_count,
            self.ready_event_count,
            self.max_events,
            self.used_event_payload_bytes,
            self.max_event_payload_bytes
        )
    }
}
