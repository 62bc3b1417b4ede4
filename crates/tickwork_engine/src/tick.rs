//! Tick orchestration.
//!
//! A tick is the fundamental unit of simulation time. Each tick:
//! 1. Advances the tick counter (wrapping at `u64::MAX`)
//! 2. Promotes pending events whose delivery tick has arrived
//! 3. Runs every system in `(order, registration)` order

use tracing::trace;

use crate::simulation::Simulation;

impl Simulation {
    /// Advances the simulation by `ticks` ticks. Zero ticks is a no-op.
    pub fn step(&mut self, ticks: u32) {
        for _ in 0..ticks {
            self.run_tick();
        }
    }

    fn run_tick(&mut self) {
        self.state.tick = self.state.tick.wrapping_add(1);
        let tick = self.state.tick;
        let promoted = self.state.events.promote_due(tick);

        let mut entries = self.systems.take_entries();
        trace!(tick, promoted, systems = entries.len(), "running tick");
        for entry in &mut entries {
            entry.system.run(self, tick);
        }
        self.systems.restore_entries(entries);
    }
}
