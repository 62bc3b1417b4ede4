//! Entity identifiers with generational indices.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Entity identifier with generational index for stale reference detection.
///
/// The generation counter of a slot increments every time the entity living
/// in it is destroyed, so ids handed out before the destroy stop validating
/// even when the slot is later reused.
///
/// # Layout
/// Packed into a `u64` as `generation << 32 | index`. Live slots never carry
/// generation 0, which makes the all-zero value a safe null sentinel.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EntityId {
    /// Index into the entity table.
    pub index: u32,
    /// Generation counter for stale reference detection.
    pub generation: u32,
}

impl EntityId {
    /// Creates a new entity ID with the given index and generation.
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Returns the sentinel value representing "no entity".
    #[must_use]
    pub const fn null() -> Self {
        Self {
            index: 0,
            generation: 0,
        }
    }

    /// Returns true if this is the null sentinel value.
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.index == 0 && self.generation == 0
    }

    /// Packs the id into its 64-bit wire representation.
    #[must_use]
    pub const fn to_bits(self) -> u64 {
        ((self.generation as u64) << 32) | self.index as u64
    }

    /// Unpacks an id from its 64-bit wire representation.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_bits(bits: u64) -> Self {
        Self {
            index: (bits & 0xFFFF_FFFF) as u32,
            generation: (bits >> 32) as u32,
        }
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::null()
    }
}

impl From<EntityId> for u64 {
    fn from(id: EntityId) -> Self {
        id.to_bits()
    }
}

impl From<u64> for EntityId {
    fn from(bits: u64) -> Self {
        Self::from_bits(bits)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "EntityId(null)")
        } else {
            write!(f, "EntityId({}v{})", self.index, self.generation)
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "Entity(null)")
        } else {
            write!(f, "Entity({})", self.index)
        }
    }
}
