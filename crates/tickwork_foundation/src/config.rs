//! Simulation configuration.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Capacity limits and timestep of a simulation.
///
/// Limits are fixed for the lifetime of a simulation; only `fixed_dt` can
/// change afterwards, when a snapshot is loaded.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimulationConfig {
    /// Maximum number of entity slots.
    pub max_entities: u32,

    /// Maximum number of distinct components on one entity.
    pub max_components_per_entity: u32,

    /// Maximum number of queued events (pending plus ready).
    pub max_events: u32,

    /// Maximum aggregate payload bytes across all queued events.
    pub max_event_payload_bytes: u32,

    /// Seconds of simulated time per tick.
    pub fixed_dt: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_entities: 4096,
            max_components_per_entity: 16,
            max_events: 4096,
            max_event_payload_bytes: 1024 * 1024,
            fixed_dt: 1.0 / 60.0,
        }
    }
}

impl SimulationConfig {
    /// Checks that every limit is nonzero and the timestep is positive.
    ///
    /// # Errors
    ///
    /// Returns an invalid argument error naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let zero_field = [
            ("max_entities", self.max_entities),
            ("max_components_per_entity", self.max_components_per_entity),
            ("max_events", self.max_events),
            ("max_event_payload_bytes", self.max_event_payload_bytes),
        ]
        .into_iter()
        .find(|(_, value)| *value == 0);

        if let Some((field, _)) = zero_field {
            return Err(Error::invalid_argument(format!("{field} must be nonzero")));
        }
        if !valid_fixed_dt(self.fixed_dt) {
            return Err(Error::invalid_argument(format!(
                "fixed_dt must be finite and positive, got {}",
                self.fixed_dt
            )));
        }
        Ok(())
    }

    /// Builder method to set the entity limit.
    #[must_use]
    pub fn with_max_entities(mut self, max: u32) -> Self {
        self.max_entities = max;
        self
    }

    /// Builder method to set the per-entity component limit.
    #[must_use]
    pub fn with_max_components_per_entity(mut self, max: u32) -> Self {
        self.max_components_per_entity = max;
        self
    }

    /// Builder method to set the queued event limit.
    #[must_use]
    pub fn with_max_events(mut self, max: u32) -> Self {
        self.max_events = max;
        self
    }

    /// Builder method to set the aggregate event payload budget.
    #[must_use]
    pub fn with_max_event_payload_bytes(mut self, max: u32) -> Self {
        self.max_event_payload_bytes = max;
        self
    }

    /// Builder method to set the timestep.
    #[must_use]
    pub fn with_fixed_dt(mut self, fixed_dt: f32) -> Self {
        self.fixed_dt = fixed_dt;
        self
    }
}

/// Returns true if `dt` is usable as a timestep.
#[must_use]
pub fn valid_fixed_dt(dt: f32) -> bool {
    dt.is_finite() && dt > 0.0
}
