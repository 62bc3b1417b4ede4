//! Integration tests for the snapshot wire layout

use tickwork_engine::{EventDesc, Simulation};
use tickwork_foundation::{ComponentType, EventType, SimulationConfig};
use tickwork_runtime::snapshot::SectionKind;
use tickwork_runtime::snapshot::format::{
    CHECKSUM_OFFSET, ENDIAN_LITTLE, HEADER_LEN, MAGIC, SECTION_ENTRY_LEN, VERSION, checksum,
};
use tickwork_runtime::to_bytes;
use tickwork_storage::ComponentDesc;

const HEALTH: ComponentType = ComponentType::new(1);
const HIT: EventType = EventType::new(1);

fn u32_at(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes(bytes[at..at + 4].try_into().unwrap())
}

fn u64_at(bytes: &[u8], at: usize) -> u64 {
    u64::from_le_bytes(bytes[at..at + 8].try_into().unwrap())
}

fn populated() -> Simulation {
    let mut sim = Simulation::new(SimulationConfig::default()).unwrap();
    sim.register_component(ComponentDesc::of::<u32>(HEALTH, "health"))
        .unwrap();
    sim.register_event(EventDesc::of::<u32>(HIT, "hit")).unwrap();
    let e = sim.create_entity().unwrap();
    sim.set_component_as(e, HEALTH, &100u32).unwrap();
    sim.emit_as(e, HIT, &5u32, 3).unwrap();
    sim
}

#[test]
fn header_layout() {
    let bytes = to_bytes(&populated()).unwrap();

    assert_eq!(&bytes[..6], &MAGIC);
    assert_eq!(u16::from_le_bytes([bytes[6], bytes[7]]), VERSION);
    assert_eq!(bytes[8], ENDIAN_LITTLE);
    assert_eq!(&bytes[9..12], &[0, 0, 0]);
    assert_eq!(u32_at(&bytes, 12), 7);
    assert_eq!(u64_at(&bytes, 16), HEADER_LEN as u64);
    assert_eq!(u64_at(&bytes, 24), (HEADER_LEN + 7 * SECTION_ENTRY_LEN) as u64);
    assert_eq!(u64_at(&bytes, 32), bytes.len() as u64);
    assert_eq!(u32_at(&bytes, 44), 0);

    let payload_offset = HEADER_LEN + 7 * SECTION_ENTRY_LEN;
    assert_eq!(
        u32_at(&bytes, CHECKSUM_OFFSET),
        checksum(&bytes[payload_offset..])
    );
}

#[test]
fn sections_are_ordered_and_contiguous() {
    let bytes = to_bytes(&populated()).unwrap();
    let mut cursor = u64_at(&bytes, 24);

    for (i, kind) in SectionKind::ALL.into_iter().enumerate() {
        let entry = HEADER_LEN + i * SECTION_ENTRY_LEN;
        assert_eq!(u32_at(&bytes, entry), kind.raw());
        assert_eq!(u32_at(&bytes, entry + 4), 0);
        assert_eq!(u64_at(&bytes, entry + 8), cursor);
        cursor += u64_at(&bytes, entry + 16);
    }
    assert_eq!(cursor, bytes.len() as u64);
}

#[test]
fn config_and_tick_sections() {
    let mut sim = populated();
    sim.step(2);
    let bytes = to_bytes(&sim).unwrap();

    let config = u64_at(&bytes, HEADER_LEN + 8) as usize;
    assert_eq!(u32_at(&bytes, config), 4096);
    assert_eq!(u32_at(&bytes, config + 4), 16);
    assert_eq!(u32_at(&bytes, config + 8), 4096);
    assert_eq!(u32_at(&bytes, config + 12), 1024 * 1024);
    assert_eq!(f32::from_bits(u32_at(&bytes, config + 16)), 1.0 / 60.0);

    let tick = u64_at(&bytes, HEADER_LEN + SECTION_ENTRY_LEN + 8) as usize;
    assert_eq!(u64_at(&bytes, tick), 2);
    assert_eq!(u64_at(&bytes, tick + 8), 2);
}

#[test]
fn registry_names_are_nul_padded() {
    let bytes = to_bytes(&populated()).unwrap();
    let entry = HEADER_LEN + 3 * SECTION_ENTRY_LEN;
    let registry = u64_at(&bytes, entry + 8) as usize;

    assert_eq!(u32_at(&bytes, registry), 1);
    assert_eq!(u32_at(&bytes, registry + 4), HEALTH.raw());
    assert_eq!(u32_at(&bytes, registry + 8), 4);
    assert_eq!(u32_at(&bytes, registry + 12), 4);
    let name = &bytes[registry + 16..registry + 80];
    assert_eq!(&name[..7], b"health\0");
    assert!(name[6..].iter().all(|&b| b == 0));
}

#[test]
fn empty_simulation_encodes() {
    let sim = Simulation::new(SimulationConfig::default()).unwrap();
    let bytes = to_bytes(&sim).unwrap();
    assert_eq!(u64_at(&bytes, 32), bytes.len() as u64);
    // 20 config + 16 tick + 8 entity table + 4 + 4 + 4 registries/payloads + 8 queues
    assert_eq!(bytes.len(), HEADER_LEN + 7 * SECTION_ENTRY_LEN + 64);
}
