//! Binary snapshots of a whole simulation.
//!
//! A snapshot captures configuration, clock, entities, components, both
//! registries, and both event queues. Systems are code and are never
//! captured; a load keeps the systems already registered on the target.
//!
//! Loading is transactional: the buffer is parsed into a staging state and
//! the live simulation is only touched once every check has passed.

mod bytes;
mod decode;
mod encode;
pub mod format;

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use tickwork_engine::Simulation;
use tickwork_foundation::{Error, Result};
use tracing::{debug, info, warn};

pub use format::SectionKind;

/// Serializes a simulation into snapshot bytes.
///
/// # Errors
///
/// Returns an out-of-memory error if the output buffer cannot be allocated.
pub fn to_bytes(sim: &Simulation) -> Result<Vec<u8>> {
    let bytes = encode::encode(sim.state())?;
    debug!(tick = sim.tick(), bytes = bytes.len(), "encoded snapshot");
    Ok(bytes)
}

/// Replaces the state of `sim` with the state encoded in `bytes`.
///
/// Capacity limits stay those of `sim`; the timestep comes from the snapshot.
/// On failure `sim` is left untouched.
///
/// # Errors
///
/// - unsupported for a foreign magic, version, or byte order
/// - io for any structural damage: sizes, offsets, checksum, sections
/// - capacity exceeded if the snapshot needs more room than `sim` allows
/// - invalid argument for a bad timestep or duplicate registry entry
pub fn load_bytes(sim: &mut Simulation, bytes: &[u8]) -> Result<()> {
    let staged = match decode::decode(sim, bytes) {
        Ok(staged) => staged,
        Err(err) => {
            warn!(%err, bytes = bytes.len(), "rejected snapshot");
            return Err(err);
        }
    };
    sim.replace_state(staged)?;
    info!(
        tick = sim.tick(),
        entities = sim.entity_count(),
        bytes = bytes.len(),
        "loaded snapshot"
    );
    Ok(())
}

/// Saves a snapshot of `sim` to a file.
///
/// Creates the file if it doesn't exist, or overwrites it if it does.
///
/// # Errors
///
/// Returns an io error if the file cannot be created or written to.
pub fn save_to_file<P: AsRef<Path>>(sim: &Simulation, path: P) -> Result<()> {
    let path = path.as_ref();
    let bytes = to_bytes(sim)?;

    let file = File::create(path).map_err(|e| {
        Error::io(format!("failed to create file '{}': {e}", path.display()))
    })?;
    let mut writer = BufWriter::new(file);
    writer.write_all(&bytes).map_err(|e| {
        Error::io(format!("failed to write to file '{}': {e}", path.display()))
    })?;
    writer.flush().map_err(|e| {
        Error::io(format!("failed to flush file '{}': {e}", path.display()))
    })?;

    info!(path = %path.display(), bytes = bytes.len(), "wrote snapshot");
    Ok(())
}

/// Loads a snapshot file into `sim`.
///
/// # Errors
///
/// Returns an io error if the file cannot be read, otherwise fails like
/// [`load_bytes`].
pub fn load_from_file<P: AsRef<Path>>(sim: &mut Simulation, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        Error::io(format!("failed to open file '{}': {e}", path.display()))
    })?;

    let mut reader = BufReader::new(file);
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes).map_err(|e| {
        Error::io(format!("failed to read file '{}': {e}", path.display()))
    })?;

    load_bytes(sim, &bytes)
}
