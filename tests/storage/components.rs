//! Integration tests for component registration and storage

use bytemuck::{Pod, Zeroable};
use tickwork_foundation::{ComponentType, ErrorCode, ErrorKind, SimulationConfig};
use tickwork_storage::{ComponentDesc, World};

const HEALTH: ComponentType = ComponentType::new(1);
const VELOCITY: ComponentType = ComponentType::new(2);
const FLAG: ComponentType = ComponentType::new(3);

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
struct Velocity {
    x: f32,
    y: f32,
}

fn world() -> World {
    let mut world = World::new(&SimulationConfig::default().with_max_components_per_entity(2));
    world
        .register_component(ComponentDesc::of::<u32>(HEALTH, "health"))
        .unwrap();
    world
        .register_component(ComponentDesc::of::<Velocity>(VELOCITY, "velocity"))
        .unwrap();
    world
        .register_component(ComponentDesc::new(FLAG, 1))
        .unwrap();
    world
}

// =============================================================================
// Registration
// =============================================================================

#[test]
fn registration_rules() {
    let mut world = world();

    let err = world
        .register_component(ComponentDesc::new(HEALTH, 4))
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::DuplicateComponent(_)));

    let err = world
        .register_component(ComponentDesc::new(ComponentType::new(0), 4))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidArgument);

    let err = world
        .register_component(ComponentDesc::new(ComponentType::new(9), 0))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidArgument);

    let meta = world.component_meta(FLAG).unwrap();
    assert_eq!(meta.alignment, 1);
    assert_eq!(meta.size, 1);
    assert_eq!(world.component_meta(VELOCITY).unwrap().name.as_str(), "velocity");
    assert_eq!(world.registry().len(), 3);
}

// =============================================================================
// Blobs
// =============================================================================

#[test]
fn set_then_overwrite_in_place() {
    let mut world = world();
    let e = world.spawn().unwrap();

    world.set(e, HEALTH, &100u32.to_le_bytes()).unwrap();
    world.set(e, HEALTH, &90u32.to_le_bytes()).unwrap();

    assert_eq!(world.get(e, HEALTH).unwrap(), &90u32.to_le_bytes());
    assert_eq!(world.component_types(e).unwrap(), vec![HEALTH]);
}

#[test]
fn set_validation_order() {
    let mut world = world();
    let e = world.spawn().unwrap();

    assert_eq!(
        world.set(e, HEALTH, &[]).unwrap_err().code(),
        ErrorCode::InvalidArgument
    );
    assert!(matches!(
        world.set(e, ComponentType::new(77), &[1]).unwrap_err().kind,
        ErrorKind::UnregisteredComponent(_)
    ));
    assert!(matches!(
        world.set(e, HEALTH, &[1, 2]).unwrap_err().kind,
        ErrorKind::SizeMismatch { .. }
    ));

    world.destroy(e).unwrap();
    assert_eq!(
        world.set(e, HEALTH, &[1, 2, 3, 4]).unwrap_err().code(),
        ErrorCode::NotFound
    );
}

#[test]
fn per_entity_component_limit() {
    let mut world = world();
    let e = world.spawn().unwrap();
    world.set(e, HEALTH, &[0; 4]).unwrap();
    world.set(e, FLAG, &[1]).unwrap();

    let err = world.set_as(e, VELOCITY, &Velocity { x: 0.0, y: 0.0 }).unwrap_err();
    assert_eq!(err.code(), ErrorCode::CapacityExceeded);

    // Overwriting an existing component is still allowed at the limit.
    world.set(e, FLAG, &[2]).unwrap();
}

#[test]
fn get_into_checks_buffer() {
    let mut world = world();
    let e = world.spawn().unwrap();
    world.set(e, HEALTH, &7u32.to_le_bytes()).unwrap();

    let mut out = [0u8; 8];
    assert_eq!(world.get_into(e, HEALTH, &mut out).unwrap(), 4);
    assert_eq!(&out[..4], &7u32.to_le_bytes());

    let mut short = [0u8; 2];
    assert!(matches!(
        world.get_into(e, HEALTH, &mut short).unwrap_err().kind,
        ErrorKind::BufferTooSmall { required: 4, provided: 2 }
    ));
    assert_eq!(
        world.get_into(e, HEALTH, &mut []).unwrap_err().code(),
        ErrorCode::InvalidArgument
    );
    assert_eq!(
        world.get_into(e, FLAG, &mut out).unwrap_err().code(),
        ErrorCode::NotFound
    );
}

#[test]
fn remove_keeps_other_components() {
    let mut world = world();
    let e = world.spawn().unwrap();
    world.set(e, HEALTH, &[0; 4]).unwrap();
    world.set(e, FLAG, &[1]).unwrap();

    world.remove(e, HEALTH).unwrap();
    assert!(!world.has(e, HEALTH));
    assert!(world.has(e, FLAG));

    assert_eq!(
        world.remove(e, HEALTH).unwrap_err().code(),
        ErrorCode::NotFound
    );
    assert_eq!(
        world.remove(e, ComponentType::new(0)).unwrap_err().code(),
        ErrorCode::InvalidArgument
    );
}

#[test]
fn typed_access() {
    let mut world = world();
    let e = world.spawn().unwrap();
    world.set_as(e, VELOCITY, &Velocity { x: 1.0, y: 2.0 }).unwrap();

    world
        .with_mut(e, VELOCITY, |v: &mut Velocity| v.x += 0.5)
        .unwrap();
    let v: Velocity = world.get_as(e, VELOCITY).unwrap();
    assert_eq!(v, Velocity { x: 1.5, y: 2.0 });

    let err = world.get_as::<u32>(e, VELOCITY).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidArgument);
}

#[test]
fn mutable_slice_writes_through() {
    let mut world = world();
    let e = world.spawn().unwrap();
    world.set(e, HEALTH, &[0; 4]).unwrap();

    world.get_mut(e, HEALTH).unwrap()[0] = 42;
    assert_eq!(world.get(e, HEALTH).unwrap(), &[42, 0, 0, 0]);
}

#[test]
fn destroy_then_respawn_has_no_components() {
    let mut world = world();
    let e = world.spawn().unwrap();
    world.set(e, HEALTH, &[1; 4]).unwrap();
    world.destroy(e).unwrap();

    let reused = world.spawn().unwrap();
    assert_eq!(reused.index, e.index);
    assert!(world.component_types(reused).unwrap().is_empty());
}
