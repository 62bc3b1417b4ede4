//! Core types, configuration, and error taxonomy for Tickwork.
//!
//! This crate provides:
//! - [`EntityId`] - Generational entity identifiers packed into 64 bits
//! - [`ComponentType`], [`EventType`], [`Tick`] - Runtime schema identifiers
//! - [`Name`] - Fixed-capacity registry names
//! - [`SimulationConfig`] - Capacity limits and the fixed timestep
//! - [`Error`] - Error kinds mapped onto the [`ErrorCode`] taxonomy

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod entity;
pub mod error;
pub mod types;

pub use config::SimulationConfig;
pub use entity::EntityId;
pub use error::{CapacityLimit, Error, ErrorCode, ErrorKind, Result};
pub use types::{ComponentType, EventType, NAME_CAPACITY, Name, SystemId, Tick};
