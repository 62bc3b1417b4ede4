//! Entity and component state of a simulation.
//!
//! The `World` is the unified interface over the entity table and the
//! component registry. Component payloads are opaque byte blobs whose
//! length always equals the registered size of their type.

use bytemuck::Pod;
use tickwork_foundation::{
    CapacityLimit, ComponentType, EntityId, Error, ErrorKind, Result, SimulationConfig,
};

use crate::component::{ComponentBlob, ComponentRegistry};
use crate::entity::EntityTable;
use crate::schema::{ComponentDesc, ComponentMeta};

/// Entities plus their component blobs.
#[derive(Clone, Debug)]
pub struct World {
    entities: EntityTable,
    registry: ComponentRegistry,
    max_components_per_entity: u32,
}

impl World {
    /// Creates an empty world sized by `config`.
    #[must_use]
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            entities: EntityTable::new(config.max_entities),
            registry: ComponentRegistry::new(),
            max_components_per_entity: config.max_components_per_entity,
        }
    }

    /// Returns the entity table.
    #[must_use]
    pub fn entities(&self) -> &EntityTable {
        &self.entities
    }

    /// Returns the component registry.
    #[must_use]
    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// Returns the per-entity component limit.
    #[must_use]
    pub fn max_components_per_entity(&self) -> u32 {
        self.max_components_per_entity
    }

    /// Returns the number of live entities.
    #[must_use]
    pub fn entity_count(&self) -> u32 {
        self.entities.len()
    }

    // --- Schema Management ---

    /// Registers a component schema.
    ///
    /// # Errors
    ///
    /// See [`ComponentRegistry::register`].
    pub fn register_component(&mut self, desc: ComponentDesc) -> Result<&ComponentMeta> {
        self.registry.register(desc)
    }

    /// Returns the schema of a registered component type.
    #[must_use]
    pub fn component_meta(&self, component: ComponentType) -> Option<&ComponentMeta> {
        self.registry.get(component)
    }

    // --- Entity Operations ---

    /// Spawns a new entity with no components.
    ///
    /// # Errors
    ///
    /// Returns a capacity error if the entity table is full.
    pub fn spawn(&mut self) -> Result<EntityId> {
        self.entities.spawn()
    }

    /// Destroys an entity and all its components.
    ///
    /// # Errors
    ///
    /// See [`EntityTable::destroy`].
    pub fn destroy(&mut self, entity: EntityId) -> Result<()> {
        self.entities.destroy(entity)
    }

    /// Checks if an entity is alive.
    #[must_use]
    pub fn exists(&self, entity: EntityId) -> bool {
        self.entities.exists(entity)
    }

    /// Drops every entity; schemas are kept.
    pub fn clear_entities(&mut self) {
        self.entities.clear();
    }

    // --- Component Operations ---

    /// Attaches or overwrites a component.
    ///
    /// # Errors
    ///
    /// - invalid argument for empty data, an unregistered type, or a length
    ///   that differs from the registered size
    /// - not found for a dead or stale entity
    /// - capacity exceeded when a new component would pass the per-entity limit
    pub fn set(&mut self, entity: EntityId, component: ComponentType, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Err(Error::invalid_argument("component data is empty"));
        }
        self.entities.validate(entity)?;
        let meta = self.registry.require(component)?;
        if data.len() != meta.byte_len() {
            return Err(Error::size_mismatch(
                component.raw(),
                meta.byte_len(),
                data.len(),
            ));
        }

        let limit = self.max_components_per_entity;
        let slot = self.entities.slot_mut(entity)?;
        if let Some(blob) = slot.components.iter_mut().find(|b| b.component == component) {
            blob.data.copy_from_slice(data);
            return Ok(());
        }
        if slot.components.len() >= limit as usize {
            return Err(Error::capacity_exceeded(CapacityLimit::ComponentsPerEntity {
                limit,
            }));
        }
        slot.components.push(ComponentBlob {
            component,
            data: data.to_vec(),
        });
        Ok(())
    }

    /// Copies a component into `out`, returning the number of bytes written.
    ///
    /// # Errors
    ///
    /// - invalid argument for an empty `out`, an unregistered type, or an
    ///   `out` shorter than the registered size
    /// - not found for a dead entity or a missing component
    pub fn get_into(
        &self,
        entity: EntityId,
        component: ComponentType,
        out: &mut [u8],
    ) -> Result<usize> {
        if out.is_empty() {
            return Err(Error::invalid_argument("output buffer is empty"));
        }
        let slot = self.entities.slot(entity)?;
        let meta = self.registry.require(component)?;
        let size = meta.byte_len();
        if out.len() < size {
            return Err(Error::new(ErrorKind::BufferTooSmall {
                required: size,
                provided: out.len(),
            }));
        }
        let blob = slot
            .components
            .iter()
            .find(|b| b.component == component)
            .ok_or_else(|| Error::component_not_found(entity, component))?;
        out[..size].copy_from_slice(&blob.data);
        Ok(size)
    }

    /// Borrows the bytes of a component.
    ///
    /// # Errors
    ///
    /// Returns a not-found error for a dead entity, an unregistered type, or
    /// a missing component.
    pub fn get(&self, entity: EntityId, component: ComponentType) -> Result<&[u8]> {
        let slot = self.entities.slot(entity)?;
        slot.components
            .iter()
            .find(|b| b.component == component)
            .map(|b| b.data.as_slice())
            .ok_or_else(|| Error::component_not_found(entity, component))
    }

    /// Mutably borrows the bytes of a component.
    ///
    /// The slice is valid until the world is next mutated.
    ///
    /// # Errors
    ///
    /// Fails like [`World::get`].
    pub fn get_mut(&mut self, entity: EntityId, component: ComponentType) -> Result<&mut [u8]> {
        let slot = self.entities.slot_mut(entity)?;
        slot.components
            .iter_mut()
            .find(|b| b.component == component)
            .map(|b| b.data.as_mut_slice())
            .ok_or_else(|| Error::component_not_found(entity, component))
    }

    /// Detaches a component, keeping the order of the remaining ones.
    ///
    /// # Errors
    ///
    /// Returns invalid argument for the reserved type id, and not found for
    /// a dead entity or an absent component.
    pub fn remove(&mut self, entity: EntityId, component: ComponentType) -> Result<()> {
        if component.is_reserved() {
            return Err(Error::invalid_argument("component type 0 is reserved"));
        }
        let slot = self.entities.slot_mut(entity)?;
        let position = slot
            .components
            .iter()
            .position(|b| b.component == component)
            .ok_or_else(|| Error::component_not_found(entity, component))?;
        slot.components.remove(position);
        Ok(())
    }

    /// Checks if an entity has a component.
    #[must_use]
    pub fn has(&self, entity: EntityId, component: ComponentType) -> bool {
        self.entities
            .slot(entity)
            .is_ok_and(|slot| slot.components.iter().any(|b| b.component == component))
    }

    /// Lists the component types of an entity in insertion order.
    ///
    /// # Errors
    ///
    /// Returns a not-found error for a dead entity.
    pub fn component_types(&self, entity: EntityId) -> Result<Vec<ComponentType>> {
        let slot = self.entities.slot(entity)?;
        Ok(slot.components.iter().map(|b| b.component).collect())
    }

    // --- Typed Access ---

    /// Attaches or overwrites a component from a plain-old-data value.
    ///
    /// # Errors
    ///
    /// Fails like [`World::set`].
    pub fn set_as<T: Pod>(
        &mut self,
        entity: EntityId,
        component: ComponentType,
        value: &T,
    ) -> Result<()> {
        self.set(entity, component, bytemuck::bytes_of(value))
    }

    /// Reads a component as a plain-old-data value.
    ///
    /// # Errors
    ///
    /// Fails like [`World::get`], and with a size mismatch if `T` does not
    /// have the registered size.
    pub fn get_as<T: Pod>(&self, entity: EntityId, component: ComponentType) -> Result<T> {
        let bytes = self.get(entity, component)?;
        check_len::<T>(component, bytes.len())?;
        Ok(bytemuck::pod_read_unaligned(bytes))
    }

    /// Runs `f` on a copy of a component and writes the result back.
    ///
    /// Blobs carry no alignment guarantee, so the value is not borrowed in place.
    ///
    /// # Errors
    ///
    /// Fails like [`World::get_as`].
    pub fn with_mut<T: Pod, R>(
        &mut self,
        entity: EntityId,
        component: ComponentType,
        f: impl FnOnce(&mut T) -> R,
    ) -> Result<R> {
        let bytes = self.get_mut(entity, component)?;
        check_len::<T>(component, bytes.len())?;
        let mut value: T = bytemuck::pod_read_unaligned(bytes);
        let result = f(&mut value);
        bytes.copy_from_slice(bytemuck::bytes_of(&value));
        Ok(result)
    }

    // --- Restoration ---

    /// Appends an entity slot reconstructed from persisted state.
    ///
    /// # Errors
    ///
    /// See [`EntityTable::push_restored_slot`].
    pub fn push_restored_slot(&mut self, generation: u32, alive: bool) -> Result<()> {
        self.entities.push_restored_slot(generation, alive)
    }

    /// Attaches a persisted component blob to the slot at `index`.
    ///
    /// # Errors
    ///
    /// - corrupt for a slot that is missing or dead, an unregistered type,
    ///   a size mismatch, or a second blob of the same type
    /// - capacity exceeded when the per-entity limit is reached
    pub fn insert_restored(
        &mut self,
        index: u32,
        component: ComponentType,
        data: &[u8],
    ) -> Result<()> {
        let meta = self
            .registry
            .get(component)
            .ok_or_else(|| Error::corrupt(format!("blob of unregistered {component}")))?;
        if meta.byte_len() != data.len() {
            return Err(Error::corrupt(format!(
                "blob of {component} has {} bytes, registered size is {}",
                data.len(),
                meta.size
            )));
        }

        let limit = self.max_components_per_entity;
        let slot = self
            .entities
            .slot_at_mut(index)
            .filter(|slot| slot.alive)
            .ok_or_else(|| Error::corrupt(format!("blob for missing or dead slot {index}")))?;
        if slot.components.iter().any(|b| b.component == component) {
            return Err(Error::corrupt(format!(
                "slot {index} holds {component} twice"
            )));
        }
        if slot.components.len() >= limit as usize {
            return Err(Error::capacity_exceeded(CapacityLimit::ComponentsPerEntity {
                limit,
            }));
        }
        slot.components.push(ComponentBlob {
            component,
            data: data.to_vec(),
        });
        Ok(())
    }
}

fn check_len<T>(component: ComponentType, registered: usize) -> Result<()> {
    let requested = std::mem::size_of::<T>();
    if requested == registered {
        Ok(())
    } else {
        Err(Error::size_mismatch(component.raw(), registered, requested))
    }
}
