//! Integration tests for systems and the tick loop

use std::cell::RefCell;
use std::rc::Rc;

use tickwork_engine::{EventDesc, Simulation, System};
use tickwork_foundation::{ComponentType, EventType, SimulationConfig, SystemId, Tick};
use tickwork_storage::ComponentDesc;

const COUNTER: ComponentType = ComponentType::new(1);
const WAKE: EventType = EventType::new(1);

type Log = Rc<RefCell<Vec<String>>>;

fn sim() -> Simulation {
    Simulation::new(SimulationConfig::default()).unwrap()
}

fn logger(log: &Log, label: &'static str) -> impl FnMut(&mut Simulation, Tick) + 'static {
    let log = Rc::clone(log);
    move |_sim: &mut Simulation, tick: Tick| log.borrow_mut().push(format!("{label}@{tick}"))
}

#[test]
fn systems_run_by_order_then_registration() {
    let mut sim = sim();
    let log = Log::default();
    let late = sim.register_system(10, logger(&log, "late"));
    let first = sim.register_system(-5, logger(&log, "first"));
    let tie_a = sim.register_system(0, logger(&log, "tie_a"));
    let tie_b = sim.register_system(0, logger(&log, "tie_b"));

    sim.step(1);

    assert_eq!(
        *log.borrow(),
        vec!["first@1", "tie_a@1", "tie_b@1", "late@1"]
    );
    assert_eq!(late, SystemId(1));
    assert!(first < tie_a && tie_a < tie_b);
    assert_eq!(sim.system_count(), 4);
}

#[test]
fn step_zero_is_noop() {
    let mut sim = sim();
    let log = Log::default();
    sim.register_system(0, logger(&log, "s"));
    sim.step(0);
    assert_eq!(sim.tick(), 0);
    assert!(log.borrow().is_empty());
}

#[test]
fn multi_tick_step_runs_each_tick() {
    let mut sim = sim();
    let log = Log::default();
    sim.register_system(0, logger(&log, "s"));
    sim.step(3);
    assert_eq!(*log.borrow(), vec!["s@1", "s@2", "s@3"]);
}

#[test]
fn events_promoted_before_systems_run() {
    let mut sim = sim();
    sim.register_event(EventDesc::new(WAKE, 0)).unwrap();
    let e = sim.create_entity().unwrap();
    sim.emit_event(e, WAKE, &[], 2).unwrap();

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    sim.register_system(0, move |sim: &mut Simulation, tick: Tick| {
        if sim.poll_event(e, WAKE).is_ok() {
            sink.borrow_mut().push(tick);
        }
    });

    sim.step(4);
    assert_eq!(*seen.borrow(), vec![2]);
}

#[test]
fn system_registered_mid_tick_runs_next_tick() {
    let mut sim = sim();
    let log = Log::default();
    let inner = Rc::clone(&log);
    let mut registered = false;
    sim.register_system(0, move |sim: &mut Simulation, _tick: Tick| {
        if !registered {
            registered = true;
            sim.register_system(-1, logger(&inner, "spawned"));
        }
    });

    sim.step(1);
    assert!(log.borrow().is_empty());
    sim.step(1);
    assert_eq!(*log.borrow(), vec!["spawned@2"]);
    assert_eq!(sim.system_count(), 2);
}

struct Accumulate {
    total: u32,
}

impl System for Accumulate {
    fn run(&mut self, sim: &mut Simulation, _tick: Tick) {
        self.total += 1;
        let total = self.total;
        sim.for_each_entity(|sim, e| {
            sim.set_component_as(e, COUNTER, &total).unwrap();
        });
    }

    fn name(&self) -> &str {
        "accumulate"
    }
}

#[test]
fn trait_systems_carry_their_own_state() {
    let mut sim = sim();
    sim.register_component(ComponentDesc::of::<u32>(COUNTER, "counter"))
        .unwrap();
    let e = sim.create_entity().unwrap();
    sim.register_system(0, Accumulate { total: 0 });

    sim.step(5);
    assert_eq!(sim.component_as::<u32>(e, COUNTER).unwrap(), 5);
}

#[test]
fn systems_may_destroy_other_entities() {
    let mut sim = sim();
    let a = sim.create_entity().unwrap();
    let b = sim.create_entity().unwrap();
    let visited = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&visited);
    sim.register_system(0, move |sim: &mut Simulation, _tick: Tick| {
        sim.for_each_entity(|sim, e| {
            sink.borrow_mut().push(e);
            if e == a {
                sim.destroy_entity(b).unwrap();
                sim.create_entity().unwrap();
            }
        });
    });

    sim.step(1);
    // `b` died before its turn; its reused slot is visited under the new id.
    let seen = visited.borrow();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0], a);
    assert_eq!(seen[1].index, b.index);
    assert_ne!(seen[1], b);
}
