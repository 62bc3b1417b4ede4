//! Integration tests for the Simulation facade

use bytemuck::{Pod, Zeroable};
use tickwork_engine::{EventDesc, Simulation};
use tickwork_foundation::{
    ComponentType, EntityId, ErrorCode, EventType, SimulationConfig, Tick,
};
use tickwork_storage::ComponentDesc;

const POSITION: ComponentType = ComponentType::new(1);
const HEALTH: ComponentType = ComponentType::new(2);
const HIT: EventType = EventType::new(1);

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
struct Position {
    x: f32,
    y: f32,
}

fn sim() -> Simulation {
    let mut sim = Simulation::new(SimulationConfig::default().with_fixed_dt(0.5)).unwrap();
    sim.register_component(ComponentDesc::of::<Position>(POSITION, "position"))
        .unwrap();
    sim.register_component(ComponentDesc::of::<u32>(HEALTH, "health"))
        .unwrap();
    sim.register_event(EventDesc::of::<u32>(HIT, "hit")).unwrap();
    sim
}

#[test]
fn invalid_config_rejected() {
    let err = Simulation::new(SimulationConfig::default().with_max_entities(0)).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidArgument);
}

#[test]
fn accessors() {
    let sim = sim();
    assert_eq!(sim.tick(), 0);
    assert!((sim.fixed_dt() - 0.5).abs() < f32::EPSILON);
    assert_eq!(sim.component_meta(HEALTH).unwrap().size, 4);
    assert_eq!(sim.event_meta(HIT).unwrap().payload_size, 4);
    assert!(sim.component_meta(ComponentType::new(5)).is_none());
}

#[test]
fn entity_lifecycle() {
    let mut sim = sim();
    let a = sim.create_entity().unwrap();
    let b = sim.create_entity().unwrap();
    assert_eq!(sim.entity_count(), 2);

    sim.destroy_entity(a).unwrap();
    assert!(!sim.is_alive(a));
    assert!(sim.is_alive(b));
    assert!(!sim.is_alive(EntityId::null()));
    assert_eq!(sim.entities().collect::<Vec<_>>(), vec![b]);

    let c = sim.create_entity().unwrap();
    assert_eq!(c.index, a.index);
    assert_eq!(c.generation, a.generation + 1);
}

#[test]
fn component_round_trip_through_facade() {
    let mut sim = sim();
    let e = sim.create_entity().unwrap();
    sim.set_component(e, HEALTH, &100u32.to_le_bytes()).unwrap();
    sim.set_component_as(e, POSITION, &Position { x: 1.0, y: 2.0 })
        .unwrap();

    let mut out = [0u8; 4];
    assert_eq!(sim.get_component(e, HEALTH, &mut out).unwrap(), 4);
    assert_eq!(u32::from_le_bytes(out), 100);

    sim.component_bytes_mut(e, HEALTH)
        .unwrap()
        .copy_from_slice(&75u32.to_le_bytes());
    assert_eq!(sim.component_bytes(e, HEALTH).unwrap(), &75u32.to_le_bytes());

    sim.with_component_mut(e, POSITION, |p: &mut Position| p.y = -1.0)
        .unwrap();
    assert_eq!(
        sim.component_as::<Position>(e, POSITION).unwrap(),
        Position { x: 1.0, y: -1.0 }
    );
    assert_eq!(sim.component_types(e).unwrap(), vec![HEALTH, POSITION]);

    sim.remove_component(e, HEALTH).unwrap();
    assert!(!sim.has_component(e, HEALTH));
}

#[test]
fn failed_operations_leave_state_unchanged() {
    let mut sim = sim();
    let e = sim.create_entity().unwrap();
    sim.set_component_as(e, HEALTH, &10u32).unwrap();
    let before = sim.diagnostics();

    assert!(sim.set_component(e, HEALTH, &[1, 2]).is_err());
    assert!(sim.emit_event(e, HIT, &[1], 0).is_err());
    assert!(sim.destroy_entity(EntityId::new(40, 1)).is_err());

    assert_eq!(sim.diagnostics(), before);
    assert_eq!(sim.component_as::<u32>(e, HEALTH).unwrap(), 10);
}

#[test]
fn reset_keeps_registries_and_systems() {
    let mut sim = sim();
    sim.register_system(0, |_sim: &mut Simulation, _tick: Tick| {});
    let e = sim.create_entity().unwrap();
    sim.set_component_as(e, HEALTH, &1u32).unwrap();
    sim.emit_as(e, HIT, &1u32, 9).unwrap();
    sim.emit_as(e, HIT, &2u32, 0).unwrap();
    sim.step(3);

    sim.reset();

    let diag = sim.diagnostics();
    assert_eq!(diag.current_tick, 0);
    assert_eq!(diag.entity_count, 0);
    assert_eq!(diag.pending_event_count, 0);
    assert_eq!(diag.ready_event_count, 0);
    assert_eq!(diag.used_event_payload_bytes, 0);
    assert_eq!(diag.component_registry_count, 2);
    assert_eq!(diag.event_registry_count, 1);
    assert_eq!(sim.state().next_sequence(), 1);
    assert_eq!(sim.system_count(), 1);
    assert!(!sim.is_alive(e));
    assert_eq!(sim.create_entity().unwrap(), EntityId::new(0, 1));
}

#[test]
fn diagnostics_report_occupancy() {
    let mut sim = sim();
    let e = sim.create_entity().unwrap();
    sim.emit_as(e, HIT, &5u32, 4).unwrap();
    sim.emit_as(e, HIT, &6u32, 0).unwrap();

    let diag = sim.diagnostics();
    assert_eq!(diag.entity_capacity, 4096);
    assert_eq!(diag.entity_count, 1);
    assert_eq!(diag.pending_event_count, 1);
    assert_eq!(diag.ready_event_count, 1);
    assert_eq!(diag.used_event_payload_bytes, 8);
    assert_eq!(diag.max_events, 4096);

    let text = diag.to_string();
    assert!(text.contains("entities: 1/4096"));
    assert!(text.contains("1 pending + 1 ready"));
}
