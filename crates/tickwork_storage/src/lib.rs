//! Entity table, component registry, and component blob storage for Tickwork.
//!
//! This crate provides:
//! - [`EntityTable`] - Generational slot allocation with a reusable free list
//! - [`ComponentRegistry`] - Runtime schemas for component types
//! - [`World`] - Per-entity component blobs validated against the registry

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod component;
pub mod entity;
pub mod schema;
pub mod world;

pub use component::{ComponentBlob, ComponentRegistry};
pub use entity::{EntitySlot, EntityTable};
pub use schema::{ComponentDesc, ComponentMeta};
pub use world::World;
