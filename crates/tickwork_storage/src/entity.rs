//! Entity lifecycle management with generational indices.
//!
//! The `EntityTable` owns one slot per entity index. Each slot tracks a
//! generation counter, an alive flag, and the component blobs of the entity
//! currently living in it.

use std::collections::BTreeSet;

use tickwork_foundation::{CapacityLimit, EntityId, Error, Result};

use crate::component::ComponentBlob;

/// Storage cell for one entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntitySlot {
    pub(crate) generation: u32,
    pub(crate) alive: bool,
    pub(crate) components: Vec<ComponentBlob>,
}

impl EntitySlot {
    fn fresh() -> Self {
        Self {
            generation: 1,
            alive: true,
            components: Vec::new(),
        }
    }

    /// Returns the current generation of the slot.
    #[must_use]
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Returns true if an entity currently lives in the slot.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Returns the component blobs in insertion order.
    #[must_use]
    pub fn components(&self) -> &[ComponentBlob] {
        &self.components
    }
}

/// Manages entity lifecycle and generation tracking.
///
/// Destroyed slots go to a free list and are reused lowest index first, so
/// the allocation order depends only on which slots are alive. That keeps a
/// table rebuilt from a snapshot handing out the same ids as the original.
#[derive(Clone, Debug)]
pub struct EntityTable {
    slots: Vec<EntitySlot>,
    free_list: BTreeSet<u32>,
    live_count: u32,
    max_entities: u32,
}

impl EntityTable {
    /// Creates an empty table that holds at most `max_entities` slots.
    #[must_use]
    pub fn new(max_entities: u32) -> Self {
        Self {
            slots: Vec::new(),
            free_list: BTreeSet::new(),
            live_count: 0,
            max_entities,
        }
    }

    /// Spawns a new entity, returns its ID.
    ///
    /// Reuses the lowest free slot when one exists, keeping its generation.
    ///
    /// # Errors
    ///
    /// Returns a capacity error when every slot is in use and the table
    /// already has `max_entities` slots.
    #[allow(clippy::cast_possible_truncation)]
    pub fn spawn(&mut self) -> Result<EntityId> {
        let index = if let Some(index) = self.free_list.pop_first() {
            let slot = &mut self.slots[index as usize];
            slot.components.clear();
            slot.alive = true;
            if slot.generation == 0 {
                slot.generation = 1;
            }
            index
        } else {
            if self.slots.len() >= self.max_entities as usize {
                return Err(Error::capacity_exceeded(CapacityLimit::Entities {
                    limit: self.max_entities,
                }));
            }
            self.slots.push(EntitySlot::fresh());
            (self.slots.len() - 1) as u32
        };

        self.live_count += 1;
        Ok(EntityId::new(index, self.slots[index as usize].generation))
    }

    /// Destroys an entity, dropping all its components.
    ///
    /// # Errors
    ///
    /// Returns an invalid argument error for the null id and a not-found
    /// error if the entity is stale or never existed.
    pub fn destroy(&mut self, id: EntityId) -> Result<()> {
        if id.is_null() {
            return Err(Error::invalid_argument("cannot destroy the null entity"));
        }
        let slot = self.slot_mut(id)?;
        slot.components.clear();
        slot.alive = false;
        slot.generation = slot.generation.wrapping_add(1);
        if slot.generation == 0 {
            slot.generation = 1;
        }
        self.free_list.insert(id.index);
        self.live_count -= 1;
        Ok(())
    }

    /// Checks if an entity exists and is not stale.
    #[must_use]
    pub fn exists(&self, id: EntityId) -> bool {
        self.validate(id).is_ok()
    }

    /// Validates that an entity is live.
    ///
    /// # Errors
    ///
    /// Returns a stale-entity error on generation mismatch, and an
    /// entity-not-found error for unknown indices or dead slots.
    pub fn validate(&self, id: EntityId) -> Result<()> {
        let Some(slot) = self.slots.get(id.index as usize) else {
            return Err(Error::entity_not_found(id));
        };
        if slot.generation != id.generation {
            return Err(Error::stale_entity(id));
        }
        if !slot.alive {
            return Err(Error::entity_not_found(id));
        }
        Ok(())
    }

    /// Returns the slot of a live entity.
    ///
    /// # Errors
    ///
    /// Fails like [`EntityTable::validate`].
    pub fn slot(&self, id: EntityId) -> Result<&EntitySlot> {
        self.validate(id)?;
        Ok(&self.slots[id.index as usize])
    }

    pub(crate) fn slot_mut(&mut self, id: EntityId) -> Result<&mut EntitySlot> {
        self.validate(id)?;
        Ok(&mut self.slots[id.index as usize])
    }

    pub(crate) fn slot_at_mut(&mut self, index: u32) -> Option<&mut EntitySlot> {
        self.slots.get_mut(index as usize)
    }

    /// Returns the total number of live entities.
    #[must_use]
    pub fn len(&self) -> u32 {
        self.live_count
    }

    /// Returns true if there are no live entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live_count == 0
    }

    /// Returns the configured slot limit.
    #[must_use]
    pub fn capacity(&self) -> u32 {
        self.max_entities
    }

    /// Returns the number of allocated slots, alive or free.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn slot_count(&self) -> u32 {
        self.slots.len() as u32
    }

    /// Returns all slots in index order.
    #[must_use]
    pub fn slots(&self) -> &[EntitySlot] {
        &self.slots
    }

    /// Returns the id currently living at `index`, if the slot is alive.
    #[must_use]
    pub fn id_at(&self, index: u32) -> Option<EntityId> {
        let slot = self.slots.get(index as usize)?;
        slot.alive.then(|| EntityId::new(index, slot.generation))
    }

    /// Iterates over all live entity IDs in slot order.
    #[allow(clippy::cast_possible_truncation)]
    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.alive)
            .map(|(idx, slot)| EntityId::new(idx as u32, slot.generation))
    }

    /// Returns the current generation for an index, if it exists.
    #[must_use]
    pub fn generation(&self, index: u32) -> Option<u32> {
        self.slots.get(index as usize).map(|slot| slot.generation)
    }

    /// Appends a slot reconstructed from persisted state.
    ///
    /// A zero generation is normalized to 1. Dead slots join the free list.
    ///
    /// # Errors
    ///
    /// Returns a capacity error if the table is already at its slot limit.
    #[allow(clippy::cast_possible_truncation)]
    pub fn push_restored_slot(&mut self, generation: u32, alive: bool) -> Result<()> {
        if self.slots.len() >= self.max_entities as usize {
            return Err(Error::capacity_exceeded(CapacityLimit::Entities {
                limit: self.max_entities,
            }));
        }
        let index = self.slots.len() as u32;
        self.slots.push(EntitySlot {
            generation: generation.max(1),
            alive,
            components: Vec::new(),
        });
        if alive {
            self.live_count += 1;
        } else {
            self.free_list.insert(index);
        }
        Ok(())
    }

    /// Removes every slot, resetting the table to empty.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free_list.clear();
        self.live_count = 0;
    }
}
