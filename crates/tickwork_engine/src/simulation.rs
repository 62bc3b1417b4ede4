//! The simulation aggregate root.
//!
//! A [`Simulation`] owns all state of one deterministic world: configuration,
//! tick counter, entities and their components, event registry and queues,
//! and the ordered list of systems. Everything except the systems lives in a
//! [`SimulationState`], which is what snapshots capture and restore.

use bytemuck::Pod;
use tickwork_foundation::{
    CapacityLimit, ComponentType, EntityId, Error, ErrorKind, EventType, Result,
    SimulationConfig, SystemId, Tick,
};
use tickwork_storage::{ComponentDesc, ComponentMeta, World};
use tracing::debug;

use crate::diagnostics::SimulationDiagnostics;
use crate::event::{EventDesc, EventMeta, EventQueues, EventRecord, EventRegistry, PolledEvent};
use crate::system::{System, SystemRegistry};

// =============================================================================
// Simulation State
// =============================================================================

/// Every piece of simulation data that a snapshot covers.
#[derive(Clone, Debug)]
pub struct SimulationState {
    pub(crate) config: SimulationConfig,
    pub(crate) tick: Tick,
    pub(crate) next_sequence: u64,
    pub(crate) world: World,
    pub(crate) event_registry: EventRegistry,
    pub(crate) events: EventQueues,
}

impl SimulationState {
    /// Creates an empty state: no entities, no registrations, tick 0.
    ///
    /// # Errors
    ///
    /// Returns an invalid argument error if `config` fails validation.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            world: World::new(&config),
            event_registry: EventRegistry::new(),
            events: EventQueues::new(config.max_events, config.max_event_payload_bytes),
            tick: 0,
            next_sequence: 1,
            config,
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Returns the current tick.
    #[must_use]
    pub fn tick(&self) -> Tick {
        self.tick
    }

    /// Returns the sequence number the next emitted event will get.
    #[must_use]
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    /// Returns the entity and component state.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Returns mutable entity and component state.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Returns the event registry.
    #[must_use]
    pub fn event_registry(&self) -> &EventRegistry {
        &self.event_registry
    }

    /// Returns the mutable event registry.
    pub fn event_registry_mut(&mut self) -> &mut EventRegistry {
        &mut self.event_registry
    }

    /// Returns the event queues.
    #[must_use]
    pub fn events(&self) -> &EventQueues {
        &self.events
    }

    /// Returns the mutable event queues.
    pub fn events_mut(&mut self) -> &mut EventQueues {
        &mut self.events
    }

    /// Sets the tick counter and sequence counter. A zero sequence becomes 1.
    pub fn set_clock(&mut self, tick: Tick, next_sequence: u64) {
        self.tick = tick;
        self.next_sequence = next_sequence.max(1);
    }

    /// Replaces the timestep.
    ///
    /// # Errors
    ///
    /// Returns an invalid argument error unless `fixed_dt` is finite and positive.
    pub fn set_fixed_dt(&mut self, fixed_dt: f32) -> Result<()> {
        if !tickwork_foundation::config::valid_fixed_dt(fixed_dt) {
            return Err(Error::invalid_argument(format!(
                "fixed_dt must be finite and positive, got {fixed_dt}"
            )));
        }
        self.config.fixed_dt = fixed_dt;
        Ok(())
    }

    /// Drops entities and events and rewinds the clock; registries stay.
    pub fn clear_runtime(&mut self) {
        self.world.clear_entities();
        self.events.clear();
        self.tick = 0;
        self.next_sequence = 1;
    }
}

// =============================================================================
// Simulation
// =============================================================================

/// A deterministic tick-based entity/component simulation.
///
/// Single-threaded: one simulation is driven by one thread at a time.
#[derive(Debug)]
pub struct Simulation {
    pub(crate) state: SimulationState,
    pub(crate) systems: SystemRegistry,
}

impl Simulation {
    /// Creates an empty simulation.
    ///
    /// # Errors
    ///
    /// Returns an invalid argument error if `config` fails validation.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        let state = SimulationState::new(config)?;
        debug!(
            max_entities = state.config.max_entities,
            max_events = state.config.max_events,
            fixed_dt = state.config.fixed_dt,
            "created simulation"
        );
        Ok(Self {
            state,
            systems: SystemRegistry::new(),
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.state.config
    }

    /// Returns the current tick.
    #[must_use]
    pub fn tick(&self) -> Tick {
        self.state.tick
    }

    /// Returns seconds of simulated time per tick.
    #[must_use]
    pub fn fixed_dt(&self) -> f32 {
        self.state.config.fixed_dt
    }

    /// Returns the snapshot-covered state.
    #[must_use]
    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Creates an empty state with this simulation's configuration.
    ///
    /// # Errors
    ///
    /// Never fails for a simulation that was constructed successfully.
    pub fn staging_state(&self) -> Result<SimulationState> {
        SimulationState::new(self.state.config.clone())
    }

    /// Swaps in a fully built state, keeping the registered systems.
    ///
    /// Capacity limits stay those of the live simulation; only the timestep
    /// is taken from `state`.
    ///
    /// # Errors
    ///
    /// Returns an invalid argument error if `state` was built with different
    /// capacity limits.
    pub fn replace_state(&mut self, state: SimulationState) -> Result<()> {
        let live = &self.state.config;
        let staged = &state.config;
        if live.max_entities != staged.max_entities
            || live.max_components_per_entity != staged.max_components_per_entity
            || live.max_events != staged.max_events
            || live.max_event_payload_bytes != staged.max_event_payload_bytes
        {
            return Err(Error::invalid_argument(
                "replacement state must use the live capacity limits",
            ));
        }
        self.state = state;
        Ok(())
    }

    /// Clears entities, components, and events and rewinds to tick 0.
    ///
    /// Registries and systems are kept.
    pub fn reset(&mut self) {
        self.state.clear_runtime();
        debug!("simulation reset");
    }

    /// Returns a summary of occupancy and limits.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn diagnostics(&self) -> SimulationDiagnostics {
        let state = &self.state;
        SimulationDiagnostics {
            entity_capacity: state.config.max_entities,
            entity_count: state.world.entity_count(),
            component_registry_count: state.world.registry().len() as u32,
            event_registry_count: state.event_registry.len() as u32,
            pending_event_count: state.events.pending_len() as u32,
            ready_event_count: state.events.ready_len() as u32,
            max_events: state.config.max_events,
            used_event_payload_bytes: state.events.used_payload_bytes(),
            max_event_payload_bytes: state.config.max_event_payload_bytes,
            current_tick: state.tick,
            fixed_dt: state.config.fixed_dt,
        }
    }

    // --- Entities ---

    /// Creates an entity with no components.
    ///
    /// # Errors
    ///
    /// Returns a capacity error once `max_entities` slots are in use.
    pub fn create_entity(&mut self) -> Result<EntityId> {
        self.state.world.spawn()
    }

    /// Destroys an entity and all its components.
    ///
    /// # Errors
    ///
    /// Returns invalid argument for the null id and not found for a stale id.
    pub fn destroy_entity(&mut self, entity: EntityId) -> Result<()> {
        self.state.world.destroy(entity)
    }

    /// Checks if an entity is alive.
    #[must_use]
    pub fn is_alive(&self, entity: EntityId) -> bool {
        self.state.world.exists(entity)
    }

    /// Returns the number of live entities.
    #[must_use]
    pub fn entity_count(&self) -> u32 {
        self.state.world.entity_count()
    }

    /// Iterates over live entities in slot order.
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.state.world.entities().iter()
    }

    /// Calls `f` for each live entity with mutable access to the simulation.
    ///
    /// Only slots that existed when the walk started are visited, each under
    /// the id it holds at its turn. An entity created during the walk is seen
    /// if it reused one of those slots and skipped if it was appended past
    /// them. Entities destroyed before their turn are skipped.
    pub fn for_each_entity(&mut self, mut f: impl FnMut(&mut Simulation, EntityId)) {
        let slot_count = self.state.world.entities().slot_count();
        for index in 0..slot_count {
            if let Some(entity) = self.state.world.entities().id_at(index) {
                f(self, entity);
            }
        }
    }

    // --- Components ---

    /// Registers a component type.
    ///
    /// # Errors
    ///
    /// Returns invalid argument for type 0, a zero size, or a duplicate id.
    pub fn register_component(&mut self, desc: ComponentDesc) -> Result<()> {
        self.state.world.register_component(desc).map(|_| ())
    }

    /// Returns the schema of a component type.
    #[must_use]
    pub fn component_meta(&self, component: ComponentType) -> Option<&ComponentMeta> {
        self.state.world.component_meta(component)
    }

    /// Attaches or overwrites a component.
    ///
    /// # Errors
    ///
    /// See [`World::set`].
    pub fn set_component(
        &mut self,
        entity: EntityId,
        component: ComponentType,
        data: &[u8],
    ) -> Result<()> {
        self.state.world.set(entity, component, data)
    }

    /// Copies a component into `out` and returns the byte count.
    ///
    /// # Errors
    ///
    /// See [`World::get_into`].
    pub fn get_component(
        &self,
        entity: EntityId,
        component: ComponentType,
        out: &mut [u8],
    ) -> Result<usize> {
        self.state.world.get_into(entity, component, out)
    }

    /// Borrows a component's bytes.
    ///
    /// # Errors
    ///
    /// Returns not found for a dead entity, unregistered type, or missing component.
    pub fn component_bytes(&self, entity: EntityId, component: ComponentType) -> Result<&[u8]> {
        self.state.world.get(entity, component)
    }

    /// Mutably borrows a component's bytes.
    ///
    /// # Errors
    ///
    /// Fails like [`Simulation::component_bytes`].
    pub fn component_bytes_mut(
        &mut self,
        entity: EntityId,
        component: ComponentType,
    ) -> Result<&mut [u8]> {
        self.state.world.get_mut(entity, component)
    }

    /// Detaches a component.
    ///
    /// # Errors
    ///
    /// Returns invalid argument for type 0 and not found for a dead entity or
    /// absent component.
    pub fn remove_component(&mut self, entity: EntityId, component: ComponentType) -> Result<()> {
        self.state.world.remove(entity, component)
    }

    /// Checks if an entity has a component.
    #[must_use]
    pub fn has_component(&self, entity: EntityId, component: ComponentType) -> bool {
        self.state.world.has(entity, component)
    }

    /// Lists an entity's component types in insertion order.
    ///
    /// # Errors
    ///
    /// Returns not found for a dead entity.
    pub fn component_types(&self, entity: EntityId) -> Result<Vec<ComponentType>> {
        self.state.world.component_types(entity)
    }

    /// Attaches or overwrites a component from a typed value.
    ///
    /// # Errors
    ///
    /// See [`World::set`].
    pub fn set_component_as<T: Pod>(
        &mut self,
        entity: EntityId,
        component: ComponentType,
        value: &T,
    ) -> Result<()> {
        self.state.world.set_as(entity, component, value)
    }

    /// Reads a component as a typed value.
    ///
    /// # Errors
    ///
    /// See [`World::get_as`].
    pub fn component_as<T: Pod>(&self, entity: EntityId, component: ComponentType) -> Result<T> {
        self.state.world.get_as(entity, component)
    }

    /// Read-modify-writes a component through a typed closure.
    ///
    /// # Errors
    ///
    /// See [`World::with_mut`].
    pub fn with_component_mut<T: Pod, R>(
        &mut self,
        entity: EntityId,
        component: ComponentType,
        f: impl FnOnce(&mut T) -> R,
    ) -> Result<R> {
        self.state.world.with_mut(entity, component, f)
    }

    // --- Events ---

    /// Registers an event type.
    ///
    /// # Errors
    ///
    /// Returns invalid argument for type 0 or a duplicate id.
    pub fn register_event(&mut self, desc: EventDesc) -> Result<()> {
        self.state.event_registry.register(desc).map(|_| ())
    }

    /// Returns the schema of an event type.
    #[must_use]
    pub fn event_meta(&self, event: EventType) -> Option<&EventMeta> {
        self.state.event_registry.get(event)
    }

    /// Schedules an event for `target` at `deliver_at`.
    ///
    /// Events due at or before the current tick are pollable immediately.
    ///
    /// # Errors
    ///
    /// Checked in order:
    /// - not found if the target is dead or the type is unregistered
    /// - invalid argument if the payload length differs from the registered size
    /// - capacity exceeded if the event count or payload budget would be
    ///   passed, or the sequence counter is exhausted
    pub fn emit_event(
        &mut self,
        target: EntityId,
        event: EventType,
        payload: &[u8],
        deliver_at: Tick,
    ) -> Result<()> {
        let state = &mut self.state;
        state.world.entities().validate(target)?;
        let meta = state.event_registry.require(event)?;
        if payload.len() != meta.payload_size as usize {
            return Err(Error::size_mismatch(
                event.raw(),
                meta.payload_size as usize,
                payload.len(),
            ));
        }

        let next_sequence = state
            .next_sequence
            .checked_add(1)
            .ok_or_else(|| Error::capacity_exceeded(CapacityLimit::EventSequence))?;

        let record = EventRecord {
            target,
            event,
            deliver_at,
            sequence: state.next_sequence,
            payload: payload.to_vec(),
        };
        state.events.push(record, state.tick)?;
        state.next_sequence = next_sequence;
        Ok(())
    }

    /// Schedules an event with a typed payload.
    ///
    /// # Errors
    ///
    /// See [`Simulation::emit_event`].
    pub fn emit_as<T: Pod>(
        &mut self,
        target: EntityId,
        event: EventType,
        payload: &T,
        deliver_at: Tick,
    ) -> Result<()> {
        self.emit_event(target, event, bytemuck::bytes_of(payload), deliver_at)
    }

    /// Consumes the oldest ready event for `(target, event)`, copying its
    /// payload into `out` and returning its delivery tick.
    ///
    /// # Errors
    ///
    /// - invalid argument for type 0 or an `out` shorter than the payload size
    /// - not found for an unregistered type or when nothing matches
    pub fn poll_event_into(
        &mut self,
        target: EntityId,
        event: EventType,
        out: &mut [u8],
    ) -> Result<Tick> {
        let size = self.check_pollable(event)?;
        if size > 0 && out.len() < size {
            return Err(Error::new(ErrorKind::BufferTooSmall {
                required: size,
                provided: out.len(),
            }));
        }
        let record = self.take_ready(target, event)?;
        out[..record.payload.len()].copy_from_slice(&record.payload);
        Ok(record.deliver_at)
    }

    /// Consumes the oldest ready event for `(target, event)`.
    ///
    /// # Errors
    ///
    /// Returns invalid argument for type 0 and not found for an unregistered
    /// type or when nothing matches.
    pub fn poll_event(&mut self, target: EntityId, event: EventType) -> Result<PolledEvent> {
        self.check_pollable(event)?;
        self.take_ready(target, event).map(PolledEvent::from)
    }

    /// Consumes the oldest ready event and decodes its payload as `T`.
    ///
    /// Nothing is consumed if `T` does not have the registered payload size.
    ///
    /// # Errors
    ///
    /// See [`Simulation::poll_event`]; also invalid argument on a size mismatch.
    pub fn poll_as<T: Pod>(&mut self, target: EntityId, event: EventType) -> Result<(T, Tick)> {
        let size = self.check_pollable(event)?;
        if size != std::mem::size_of::<T>() {
            return Err(Error::size_mismatch(
                event.raw(),
                size,
                std::mem::size_of::<T>(),
            ));
        }
        let record = self.take_ready(target, event)?;
        Ok((bytemuck::pod_read_unaligned(&record.payload), record.deliver_at))
    }

    fn check_pollable(&self, event: EventType) -> Result<usize> {
        if event.is_reserved() {
            return Err(Error::invalid_argument("event type 0 is reserved"));
        }
        let meta = self.state.event_registry.require(event)?;
        Ok(meta.payload_size as usize)
    }

    fn take_ready(&mut self, target: EntityId, event: EventType) -> Result<EventRecord> {
        self.state
            .events
            .take_ready(target, event)
            .ok_or_else(|| Error::new(ErrorKind::EventNotFound { target, event }))
    }

    // --- Systems ---

    /// Registers a per-tick system and returns its id.
    ///
    /// Systems registered while a tick is running take effect on the next tick.
    pub fn register_system(&mut self, order: i32, system: impl System + 'static) -> SystemId {
        let id = self.systems.register(order, Box::new(system));
        debug!(system = id.0, order, "registered system");
        id
    }

    /// Returns the number of registered systems.
    #[must_use]
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }
}
