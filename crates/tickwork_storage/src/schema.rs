//! Schema definitions for component types.
//!
//! A schema is registered once at setup time and fixes the byte size of
//! every blob stored under its type id for the rest of the simulation.

use std::mem;

use bytemuck::Pod;
use tickwork_foundation::{ComponentType, Name};

/// Registration request for a component type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComponentDesc {
    /// Type id (nonzero).
    pub component: ComponentType,
    /// Exact byte size of every instance (nonzero).
    pub size: u32,
    /// Requested alignment; zero means 1.
    pub alignment: u32,
    /// Human-readable name.
    pub name: Name,
}

impl ComponentDesc {
    /// Creates a descriptor for a raw byte layout.
    #[must_use]
    pub fn new(component: ComponentType, size: u32) -> Self {
        Self {
            component,
            size,
            alignment: 0,
            name: Name::default(),
        }
    }

    /// Creates a descriptor whose size and alignment come from `T`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn of<T: Pod>(component: ComponentType, name: &str) -> Self {
        Self {
            component,
            size: mem::size_of::<T>() as u32,
            alignment: mem::align_of::<T>() as u32,
            name: Name::new(name),
        }
    }

    /// Sets the alignment.
    #[must_use]
    pub fn with_alignment(mut self, alignment: u32) -> Self {
        self.alignment = alignment;
        self
    }

    /// Sets the name.
    #[must_use]
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Name::new(name);
        self
    }
}

/// Registered metadata for a component type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComponentMeta {
    /// Type id.
    pub component: ComponentType,
    /// Exact byte size of every instance.
    pub size: u32,
    /// Alignment, at least 1.
    pub alignment: u32,
    /// Human-readable name.
    pub name: Name,
}

impl ComponentMeta {
    /// Returns the size as a `usize` for slice comparisons.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.size as usize
    }
}
