//! Error types for the Tickwork system.
//!
//! Uses `thiserror` for ergonomic error definition. Every [`ErrorKind`] maps
//! onto one of the six [`ErrorCode`] categories, which is what callers match
//! on when they only care about the class of failure.

use std::fmt;

use thiserror::Error;

use crate::entity::EntityId;
use crate::types::{ComponentType, EventType};

/// Result alias used across all Tickwork crates.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for Tickwork operations.
#[derive(Debug, Error)]
#[error("{kind}{}", format_context(.context))]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional description of where the error occurred.
    pub context: Option<String>,
}

fn format_context(context: &Option<String>) -> String {
    context
        .as_ref()
        .map_or_else(String::new, |ctx| format!(" ({ctx})"))
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Returns the taxonomy category of this error.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        self.kind.code()
    }

    /// Creates an invalid argument error.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument(message.into()))
    }

    /// Creates an entity not found error.
    #[must_use]
    pub fn entity_not_found(id: EntityId) -> Self {
        Self::new(ErrorKind::EntityNotFound(id))
    }

    /// Creates a stale entity reference error.
    #[must_use]
    pub fn stale_entity(id: EntityId) -> Self {
        Self::new(ErrorKind::StaleEntity(id))
    }

    /// Creates a component not found error.
    #[must_use]
    pub fn component_not_found(entity: EntityId, component: ComponentType) -> Self {
        Self::new(ErrorKind::ComponentNotFound { entity, component })
    }

    /// Creates a payload size mismatch error.
    #[must_use]
    pub fn size_mismatch(type_id: u32, expected: usize, actual: usize) -> Self {
        Self::new(ErrorKind::SizeMismatch {
            type_id,
            expected,
            actual,
        })
    }

    /// Creates a capacity exceeded error.
    #[must_use]
    pub fn capacity_exceeded(limit: CapacityLimit) -> Self {
        Self::new(ErrorKind::CapacityExceeded(limit))
    }

    /// Creates a malformed-data error.
    #[must_use]
    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Corrupt(message.into()))
    }

    /// Creates an unsupported format error.
    #[must_use]
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unsupported(message.into()))
    }

    /// Creates an I/O error.
    #[must_use]
    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io(message.into()))
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// Malformed input that is not covered by a more specific kind.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Byte length does not match the registered size of a type.
    #[error("size mismatch for type {type_id}: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        /// The component or event type id.
        type_id: u32,
        /// The registered size.
        expected: usize,
        /// The size supplied by the caller.
        actual: usize,
    },

    /// Caller-provided output buffer cannot hold the payload.
    #[error("buffer too small: need {required} bytes, got {provided}")]
    BufferTooSmall {
        /// Bytes needed.
        required: usize,
        /// Bytes available.
        provided: usize,
    },

    /// Component type was used before being registered.
    #[error("unregistered component type: {0}")]
    UnregisteredComponent(ComponentType),

    /// Event type was used before being registered.
    #[error("unregistered event type: {0}")]
    UnregisteredEvent(EventType),

    /// Component type id registered twice.
    #[error("component type already registered: {0}")]
    DuplicateComponent(ComponentType),

    /// Event type id registered twice.
    #[error("event type already registered: {0}")]
    DuplicateEvent(EventType),

    /// Entity was not found in the entity table.
    #[error("entity not found: {0:?}")]
    EntityNotFound(EntityId),

    /// Entity reference is stale (generation mismatch).
    #[error("stale entity reference: {0:?}")]
    StaleEntity(EntityId),

    /// Component not present on entity.
    #[error("component {component} not found on entity {entity:?}")]
    ComponentNotFound {
        /// The entity that was queried.
        entity: EntityId,
        /// The component type that was not found.
        component: ComponentType,
    },

    /// No ready event matched the poll.
    #[error("no ready event {event} for entity {target:?}")]
    EventNotFound {
        /// The polled target.
        target: EntityId,
        /// The polled event type.
        event: EventType,
    },

    /// A configured capacity limit was hit.
    #[error("capacity exceeded: {0}")]
    CapacityExceeded(CapacityLimit),

    /// Allocation of the given number of bytes failed.
    #[error("out of memory allocating {0} bytes")]
    OutOfMemory(usize),

    /// Binary data is structurally invalid (truncated, bad checksum, ...).
    #[error("corrupt data: {0}")]
    Corrupt(String),

    /// Filesystem error.
    #[error("i/o error: {0}")]
    Io(String),

    /// Unrecognized magic, version, or byte order.
    #[error("unsupported: {0}")]
    Unsupported(String),
}

impl ErrorKind {
    /// Maps this kind onto its taxonomy category.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidArgument(_)
            | Self::SizeMismatch { .. }
            | Self::BufferTooSmall { .. }
            | Self::UnregisteredComponent(_)
            | Self::DuplicateComponent(_)
            | Self::DuplicateEvent(_) => ErrorCode::InvalidArgument,
            Self::UnregisteredEvent(_)
            | Self::EntityNotFound(_)
            | Self::StaleEntity(_)
            | Self::ComponentNotFound { .. }
            | Self::EventNotFound { .. } => ErrorCode::NotFound,
            Self::CapacityExceeded(_) => ErrorCode::CapacityExceeded,
            Self::OutOfMemory(_) => ErrorCode::OutOfMemory,
            Self::Corrupt(_) | Self::Io(_) => ErrorCode::Io,
            Self::Unsupported(_) => ErrorCode::Unsupported,
        }
    }
}

/// Coarse error categories every operation reports in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Malformed input or size mismatch.
    InvalidArgument,
    /// Stale/unknown entity, unregistered type, missing component or event.
    NotFound,
    /// Allocation failure.
    OutOfMemory,
    /// File or binary-format structural failure.
    Io,
    /// Unrecognized magic, version, or endianness.
    Unsupported,
    /// Entity, event, payload, or per-entity component limit hit.
    CapacityExceeded,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InvalidArgument => "invalid_argument",
            Self::NotFound => "not_found",
            Self::OutOfMemory => "out_of_memory",
            Self::Io => "io",
            Self::Unsupported => "unsupported",
            Self::CapacityExceeded => "capacity_exceeded",
        };
        f.write_str(name)
    }
}

/// Configured limits that can be exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityLimit {
    /// Entity table is full.
    Entities {
        /// The configured limit.
        limit: u32,
    },
    /// Entity already holds the maximum number of components.
    ComponentsPerEntity {
        /// The configured limit.
        limit: u32,
    },
    /// Pending plus ready event count at the maximum.
    Events {
        /// The configured limit.
        limit: u32,
    },
    /// Aggregate queued payload bytes would pass the budget.
    EventPayloadBytes {
        /// The configured limit.
        limit: u32,
        /// Bytes the operation would have brought the total to.
        requested: u64,
    },
    /// Event sequence numbers are exhausted.
    EventSequence,
    /// Snapshot was taken with a larger configuration than the live one.
    SnapshotConfig {
        /// Which limit is too large.
        field: &'static str,
        /// The live limit.
        limit: u32,
        /// The value embedded in the snapshot.
        snapshot: u32,
    },
}

impl fmt::Display for CapacityLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entities { limit } => write!(f, "max entities ({limit}) reached"),
            Self::ComponentsPerEntity { limit } => {
                write!(f, "max components per entity ({limit}) reached")
            }
            Self::Events { limit } => write!(f, "max queued events ({limit}) reached"),
            Self::EventPayloadBytes { limit, requested } => write!(
                f,
                "event payload budget ({limit} bytes) exceeded: {requested} bytes requested"
            ),
            Self::EventSequence => write!(f, "event sequence numbers exhausted"),
            Self::SnapshotConfig {
                field,
                limit,
                snapshot,
            } => write!(
                f,
                "snapshot {field} ({snapshot}) exceeds live limit ({limit})"
            ),
        }
    }
}
