//! Integration tests for Error types
//!
//! Tests error construction, display, context, and the code taxonomy.

use tickwork_foundation::{
    CapacityLimit, ComponentType, EntityId, Error, ErrorCode, ErrorKind, EventType,
};

// =============================================================================
// Error Construction
// =============================================================================

#[test]
fn error_entity_not_found() {
    let err = Error::entity_not_found(EntityId::new(42, 1));
    assert!(matches!(err.kind, ErrorKind::EntityNotFound(_)));
    assert_eq!(err.code(), ErrorCode::NotFound);
    assert!(err.to_string().contains("42"));
}

#[test]
fn error_stale_entity() {
    let err = Error::stale_entity(EntityId::new(5, 2));
    assert!(matches!(err.kind, ErrorKind::StaleEntity(_)));
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[test]
fn error_component_not_found() {
    let err = Error::component_not_found(EntityId::new(1, 1), ComponentType::new(3));
    assert_eq!(err.code(), ErrorCode::NotFound);
    assert!(err.to_string().contains("component#3"));
}

#[test]
fn error_capacity_exceeded() {
    let err = Error::capacity_exceeded(CapacityLimit::Entities { limit: 8 });
    assert_eq!(err.code(), ErrorCode::CapacityExceeded);
    assert!(err.to_string().contains("max entities (8)"));

    let err = Error::capacity_exceeded(CapacityLimit::SnapshotConfig {
        field: "max_events",
        limit: 16,
        snapshot: 32,
    });
    assert!(err.to_string().contains("max_events (32) exceeds live limit (16)"));
}

#[test]
fn error_with_context() {
    let err = Error::corrupt("checksum mismatch").with_context("header");
    assert_eq!(err.context.as_deref(), Some("header"));
    assert_eq!(err.to_string(), "corrupt data: checksum mismatch (header)");
}

// =============================================================================
// Taxonomy
// =============================================================================

#[test]
fn kinds_map_to_codes() {
    let cases = [
        (Error::invalid_argument("x"), ErrorCode::InvalidArgument),
        (Error::size_mismatch(1, 4, 8), ErrorCode::InvalidArgument),
        (
            Error::new(ErrorKind::BufferTooSmall {
                required: 8,
                provided: 4,
            }),
            ErrorCode::InvalidArgument,
        ),
        (
            Error::new(ErrorKind::UnregisteredComponent(ComponentType::new(1))),
            ErrorCode::InvalidArgument,
        ),
        (
            Error::new(ErrorKind::UnregisteredEvent(EventType::new(1))),
            ErrorCode::NotFound,
        ),
        (Error::new(ErrorKind::OutOfMemory(64)), ErrorCode::OutOfMemory),
        (Error::corrupt("x"), ErrorCode::Io),
        (Error::io("x"), ErrorCode::Io),
        (Error::unsupported("x"), ErrorCode::Unsupported),
    ];
    for (err, code) in cases {
        assert_eq!(err.code(), code, "{err}");
    }
}

#[test]
fn codes_display_snake_case() {
    assert_eq!(ErrorCode::InvalidArgument.to_string(), "invalid_argument");
    assert_eq!(ErrorCode::CapacityExceeded.to_string(), "capacity_exceeded");
    assert_eq!(ErrorCode::NotFound.to_string(), "not_found");
}
