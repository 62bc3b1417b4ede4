//! Checkpoint and restore of a small combat simulation
//!
//! Impulses push velocity, damage lowers health; both arrive as events and
//! are consumed by systems.

use bytemuck::{Pod, Zeroable};
use tickwork_engine::{EventDesc, Simulation};
use tickwork_foundation::{ComponentType, EntityId, EventType, SimulationConfig, Tick};
use tickwork_runtime::{load_bytes, to_bytes};
use tickwork_storage::ComponentDesc;

const HEALTH: ComponentType = ComponentType::new(1);
const VELOCITY: ComponentType = ComponentType::new(2);
const IMPULSE: EventType = EventType::new(1);
const DAMAGE: EventType = EventType::new(2);

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
struct Health {
    hp: f32,
    max_hp: f32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
struct Velocity {
    x: f32,
    y: f32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
struct Impulse {
    dx: f32,
    dy: f32,
}

fn physics(sim: &mut Simulation, _tick: Tick) {
    sim.for_each_entity(|sim, e| {
        while let Ok((impulse, _)) = sim.poll_as::<Impulse>(e, IMPULSE) {
            sim.with_component_mut(e, VELOCITY, |v: &mut Velocity| {
                v.x += impulse.dx;
                v.y += impulse.dy;
            })
            .unwrap();
        }
    });
}

fn combat(sim: &mut Simulation, _tick: Tick) {
    sim.for_each_entity(|sim, e| {
        while let Ok((amount, _)) = sim.poll_as::<f32>(e, DAMAGE) {
            sim.with_component_mut(e, HEALTH, |h: &mut Health| {
                h.hp = (h.hp - amount).max(0.0);
            })
            .unwrap();
        }
    });
}

fn build() -> (Simulation, EntityId) {
    let mut sim = Simulation::new(SimulationConfig::default()).unwrap();
    sim.register_component(ComponentDesc::of::<Health>(HEALTH, "health"))
        .unwrap();
    sim.register_component(ComponentDesc::of::<Velocity>(VELOCITY, "velocity"))
        .unwrap();
    sim.register_event(EventDesc::of::<Impulse>(IMPULSE, "impulse"))
        .unwrap();
    sim.register_event(EventDesc::of::<f32>(DAMAGE, "damage"))
        .unwrap();
    sim.register_system(0, physics);
    sim.register_system(1, combat);

    let hero = sim.create_entity().unwrap();
    sim.set_component_as(
        hero,
        HEALTH,
        &Health {
            hp: 100.0,
            max_hp: 100.0,
        },
    )
    .unwrap();
    sim.set_component_as(hero, VELOCITY, &Velocity { x: 0.0, y: 0.0 })
        .unwrap();
    (sim, hero)
}

fn hp(sim: &Simulation, e: EntityId) -> f32 {
    sim.component_as::<Health>(e, HEALTH).unwrap().hp
}

fn velocity_x(sim: &Simulation, e: EntityId) -> f32 {
    sim.component_as::<Velocity>(e, VELOCITY).unwrap().x
}

#[test]
fn checkpoint_restores_health_and_velocity() {
    let (mut sim, hero) = build();
    sim.emit_as(hero, IMPULSE, &Impulse { dx: 2.0, dy: 0.0 }, 1)
        .unwrap();
    sim.emit_as(hero, DAMAGE, &10.0f32, 2).unwrap();
    sim.step(2);

    assert!((hp(&sim, hero) - 90.0).abs() < 1e-6);
    assert!((velocity_x(&sim, hero) - 2.0).abs() < 1e-6);
    let checkpoint = to_bytes(&sim).unwrap();

    sim.emit_as(hero, DAMAGE, &25.0f32, 3).unwrap();
    sim.emit_as(hero, IMPULSE, &Impulse { dx: -5.0, dy: 1.0 }, 3)
        .unwrap();
    sim.step(3);
    assert!((hp(&sim, hero) - 65.0).abs() < 1e-6);
    assert!((velocity_x(&sim, hero) + 3.0).abs() < 1e-6);

    load_bytes(&mut sim, &checkpoint).unwrap();

    assert_eq!(sim.tick(), 2);
    assert!((hp(&sim, hero) - 90.0).abs() < 1e-6);
    assert!((velocity_x(&sim, hero) - 2.0).abs() < 1e-6);
    let max_hp = sim.component_as::<Health>(hero, HEALTH).unwrap().max_hp;
    assert!((max_hp - 100.0).abs() < 1e-6);
}

#[test]
fn restored_simulation_continues_identically() {
    let (mut original, hero) = build();
    original
        .emit_as(hero, IMPULSE, &Impulse { dx: 2.0, dy: 0.0 }, 1)
        .unwrap();
    original.emit_as(hero, DAMAGE, &10.0f32, 2).unwrap();
    original.emit_as(hero, DAMAGE, &15.0f32, 6).unwrap();
    original.step(3);
    let checkpoint = to_bytes(&original).unwrap();

    let (mut restored, _) = build();
    load_bytes(&mut restored, &checkpoint).unwrap();
    assert_eq!(to_bytes(&restored).unwrap(), checkpoint);

    original.step(5);
    restored.step(5);

    assert!((hp(&restored, hero) - 75.0).abs() < 1e-6);
    assert_eq!(to_bytes(&restored).unwrap(), to_bytes(&original).unwrap());
}

#[test]
fn pending_events_are_captured() {
    let (mut sim, hero) = build();
    sim.emit_as(hero, DAMAGE, &50.0f32, 10).unwrap();
    let checkpoint = to_bytes(&sim).unwrap();

    let (mut restored, _) = build();
    load_bytes(&mut restored, &checkpoint).unwrap();
    assert_eq!(restored.diagnostics().pending_event_count, 1);

    restored.step(9);
    assert!((hp(&restored, hero) - 100.0).abs() < 1e-6);
    restored.step(1);
    assert!((hp(&restored, hero) - 50.0).abs() < 1e-6);
}
