//! Runtime schema identifiers.
//!
//! Component and event schemas are defined when the simulation is set up,
//! not at compile time, so their identities are plain integers wrapped in
//! newtypes to keep the two namespaces apart.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Discrete simulation time, advanced by one per step.
pub type Tick = u64;

/// Byte capacity of a registry name on the wire, including the NUL terminator.
pub const NAME_CAPACITY: usize = 64;

/// Identifier of a registered component type. Zero is reserved.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ComponentType(pub u32);

impl ComponentType {
    /// Wraps a raw type id.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw type id.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Returns true for the reserved zero id.
    #[must_use]
    pub const fn is_reserved(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "component#{}", self.0)
    }
}

/// Identifier of a registered event type. Zero is reserved.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EventType(pub u32);

impl EventType {
    /// Wraps a raw type id.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw type id.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Returns true for the reserved zero id.
    #[must_use]
    pub const fn is_reserved(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "event#{}", self.0)
    }
}

/// Registration index of a system; doubles as its tie-break key.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SystemId(pub u64);

/// A registry name bounded to `NAME_CAPACITY - 1` bytes of UTF-8.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Name(String);

impl Name {
    /// Creates a name, truncating on a character boundary if it is too long.
    #[must_use]
    pub fn new(name: &str) -> Self {
        let mut end = name.len().min(NAME_CAPACITY - 1);
        while !name.is_char_boundary(end) {
            end -= 1;
        }
        Self(name[..end].to_string())
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Encodes the name as a NUL-padded fixed-size field.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; NAME_CAPACITY] {
        let mut out = [0u8; NAME_CAPACITY];
        out[..self.0.len()].copy_from_slice(self.0.as_bytes());
        out
    }

    /// Decodes a NUL-padded fixed-size field.
    ///
    /// Reads up to the first NUL (the last byte is always treated as the
    /// terminator); invalid UTF-8 is replaced rather than rejected.
    #[must_use]
    pub fn from_bytes(bytes: &[u8; NAME_CAPACITY]) -> Self {
        let body = &bytes[..NAME_CAPACITY - 1];
        let end = body.iter().position(|&b| b == 0).unwrap_or(body.len());
        Self::new(&String::from_utf8_lossy(&body[..end]))
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Name {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}
