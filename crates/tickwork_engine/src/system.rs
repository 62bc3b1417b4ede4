//! Per-tick systems and their execution order.
//!
//! Systems run once per tick, sorted by `(order, registration index)`. Lower
//! orders run first; systems sharing an order run in registration order.

use std::fmt;

use tickwork_foundation::{SystemId, Tick};

use crate::simulation::Simulation;

/// A callback invoked once per tick.
///
/// Any `FnMut(&mut Simulation, Tick)` closure is a system; state the system
/// needs between ticks lives in the closure or the implementing type.
pub trait System {
    /// Runs the system for `tick`.
    fn run(&mut self, sim: &mut Simulation, tick: Tick);

    /// Name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<F> System for F
where
    F: FnMut(&mut Simulation, Tick),
{
    fn run(&mut self, sim: &mut Simulation, tick: Tick) {
        self(sim, tick);
    }
}

/// A registered system with its sort key.
pub struct SystemEntry {
    pub(crate) id: SystemId,
    pub(crate) order: i32,
    pub(crate) system: Box<dyn System>,
}

impl SystemEntry {
    /// Returns the registration id.
    #[must_use]
    pub fn id(&self) -> SystemId {
        self.id
    }

    /// Returns the explicit order.
    #[must_use]
    pub fn order(&self) -> i32 {
        self.order
    }

    fn sort_key(&self) -> (i32, SystemId) {
        (self.order, self.id)
    }
}

impl fmt::Debug for SystemEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemEntry")
            .field("id", &self.id)
            .field("order", &self.order)
            .field("name", &self.system.name())
            .finish()
    }
}

/// Ordered list of systems.
#[derive(Debug)]
pub struct SystemRegistry {
    entries: Vec<SystemEntry>,
    next_id: u64,
}

impl Default for SystemRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemRegistry {
    /// Creates an empty registry. The first registration gets id 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
        }
    }

    /// Adds a system and re-sorts the list.
    pub fn register(&mut self, order: i32, system: Box<dyn System>) -> SystemId {
        let id = SystemId(self.next_id);
        self.next_id += 1;
        self.entries.push(SystemEntry { id, order, system });
        self.sort();
        id
    }

    /// Returns the number of registered systems.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no system is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over entries in execution order.
    pub fn iter(&self) -> impl Iterator<Item = &SystemEntry> {
        self.entries.iter()
    }

    /// Moves every entry out, leaving the registry empty but keeping the id counter.
    pub(crate) fn take_entries(&mut self) -> Vec<SystemEntry> {
        std::mem::take(&mut self.entries)
    }

    /// Puts entries taken by [`SystemRegistry::take_entries`] back, merged with
    /// anything registered in the meantime.
    pub(crate) fn restore_entries(&mut self, mut entries: Vec<SystemEntry>) {
        entries.append(&mut self.entries);
        self.entries = entries;
        self.sort();
    }

    fn sort(&mut self) {
        self.entries.sort_by_key(SystemEntry::sort_key);
    }
}
