//! Snapshot persistence for Tickwork.
//!
//! This crate provides:
//! - [`snapshot::to_bytes`] / [`snapshot::load_bytes`] - In-memory snapshot codec
//! - [`snapshot::save_to_file`] / [`snapshot::load_from_file`] - File persistence
//! - [`snapshot::format`] - Layout constants and the FNV-1a checksum

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod snapshot;

pub use snapshot::{load_bytes, load_from_file, save_to_file, to_bytes};
