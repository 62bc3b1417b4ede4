//! Parsing of snapshot bytes into a staged simulation state.
//!
//! Nothing here touches the live simulation. Every section is parsed into a
//! fresh [`SimulationState`] built from the live configuration; the caller
//! swaps it in only when the whole buffer has been accepted.

use tickwork_engine::{EventDesc, EventRecord, EventRegistry, Simulation, SimulationState};
use tickwork_foundation::{
    CapacityLimit, ComponentType, EntityId, Error, EventType, NAME_CAPACITY, Name, Result,
};
use tickwork_storage::ComponentDesc;

use super::bytes::ByteReader;
use super::format::{HEADER_LEN, Header, SECTION_ENTRY_LEN, SectionKind, checksum};

/// Validates `data` and parses it into a state ready to replace `live`'s.
pub(crate) fn decode(live: &Simulation, data: &[u8]) -> Result<SimulationState> {
    let header = Header::read(data)?;
    #[allow(clippy::cast_possible_truncation)]
    let payload_offset = header.payload_offset as usize;
    let actual = checksum(&data[payload_offset..]);
    if actual != header.checksum {
        return Err(Error::corrupt(format!(
            "checksum mismatch: header {:#010x}, computed {actual:#010x}",
            header.checksum
        )));
    }

    let sections = locate_sections(data, &header)?;
    let section = |kind: SectionKind| ByteReader::new(sections[kind.slot()], kind.label());

    let mut staged = live.staging_state()?;
    read_config(&mut staged, section(SectionKind::Config))?;
    read_component_registry(&mut staged, section(SectionKind::ComponentRegistry))?;
    read_event_registry(&mut staged, section(SectionKind::EventRegistry))?;
    let counts = read_entity_table(&mut staged, section(SectionKind::EntityTable))?;
    read_component_payloads(&mut staged, section(SectionKind::ComponentPayloads), &counts)?;
    read_tick(&mut staged, section(SectionKind::Tick))?;
    read_event_queues(&mut staged, section(SectionKind::EventQueues))?;
    Ok(staged)
}

/// Resolves the section table into one slice per section kind.
///
/// Sections must follow each other without gaps from the payload offset to
/// the end of the buffer, and each kind must appear exactly once.
fn locate_sections<'a>(data: &'a [u8], header: &Header) -> Result<[&'a [u8]; 7]> {
    let mut found: [Option<&[u8]>; 7] = [None; 7];
    let total = data.len() as u64;
    let mut cursor = header.payload_offset;

    for i in 0..header.section_count as usize {
        let start = HEADER_LEN + i * SECTION_ENTRY_LEN;
        let mut entry = ByteReader::new(&data[start..start + SECTION_ENTRY_LEN], "section table");
        let raw_kind = entry.u32()?;
        entry.reserved(4)?;
        let offset = entry.u64()?;
        let len = entry.u64()?;
        entry.finish()?;

        if offset != cursor || len > total - cursor {
            return Err(Error::corrupt(format!(
                "section {i} spans {offset}+{len}, expected to start at {cursor} within {total} bytes"
            ))
            .with_context("section table"));
        }
        let kind = SectionKind::from_raw(raw_kind).ok_or_else(|| {
            Error::corrupt(format!("unknown section type {raw_kind}")).with_context("section table")
        })?;
        let slot = &mut found[kind.slot()];
        if slot.is_some() {
            return Err(Error::corrupt(format!("duplicate {}", kind.label()))
                .with_context("section table"));
        }
        #[allow(clippy::cast_possible_truncation)]
        let range = offset as usize..(offset + len) as usize;
        *slot = Some(&data[range]);
        cursor += len;
    }

    if cursor != total {
        return Err(Error::corrupt(format!(
            "sections end at {cursor}, snapshot is {total} bytes"
        ))
        .with_context("section table"));
    }

    let mut sections: [&[u8]; 7] = [&[]; 7];
    for kind in SectionKind::ALL {
        sections[kind.slot()] = found[kind.slot()]
            .ok_or_else(|| Error::corrupt(format!("missing {}", kind.label())))?;
    }
    Ok(sections)
}

fn read_config(staged: &mut SimulationState, mut r: ByteReader<'_>) -> Result<()> {
    let max_entities = r.u32()?;
    let max_components_per_entity = r.u32()?;
    let max_events = r.u32()?;
    let max_event_payload_bytes = r.u32()?;
    let fixed_dt = f32::from_bits(r.u32()?);
    r.finish()?;

    let live = staged.config();
    for (field, snapshot, limit) in [
        ("max_entities", max_entities, live.max_entities),
        (
            "max_components_per_entity",
            max_components_per_entity,
            live.max_components_per_entity,
        ),
        ("max_events", max_events, live.max_events),
        (
            "max_event_payload_bytes",
            max_event_payload_bytes,
            live.max_event_payload_bytes,
        ),
    ] {
        if snapshot > limit {
            return Err(Error::capacity_exceeded(CapacityLimit::SnapshotConfig {
                field,
                limit,
                snapshot,
            }));
        }
    }

    staged
        .set_fixed_dt(fixed_dt)
        .map_err(|e| e.with_context(SectionKind::Config.label()))
}

fn read_name(r: &mut ByteReader<'_>) -> Result<Name> {
    let bytes: [u8; NAME_CAPACITY] = r.array()?;
    Ok(Name::from_bytes(&bytes))
}

fn read_component_registry(staged: &mut SimulationState, mut r: ByteReader<'_>) -> Result<()> {
    let count = r.u32()?;
    for _ in 0..count {
        let desc = ComponentDesc {
            component: ComponentType::new(r.u32()?),
            size: r.u32()?,
            alignment: r.u32()?,
            name: read_name(&mut r)?,
        };
        staged
            .world_mut()
            .register_component(desc)
            .map_err(|e| e.with_context(SectionKind::ComponentRegistry.label()))?;
    }
    r.finish()
}

fn read_event_registry(staged: &mut SimulationState, mut r: ByteReader<'_>) -> Result<()> {
    let count = r.u32()?;
    for _ in 0..count {
        let desc = EventDesc {
            event: EventType::new(r.u32()?),
            payload_size: r.u32()?,
            name: read_name(&mut r)?,
        };
        staged
            .event_registry_mut()
            .register(desc)
            .map_err(|e| e.with_context(SectionKind::EventRegistry.label()))?;
    }
    r.finish()
}

/// Rebuilds the slots and returns the component count each one declares.
fn read_entity_table(staged: &mut SimulationState, mut r: ByteReader<'_>) -> Result<Vec<u32>> {
    let slot_count = r.u32()?;
    let alive_count = r.u32()?;
    let limit = staged.config().max_entities;
    if slot_count > limit {
        return Err(Error::capacity_exceeded(CapacityLimit::Entities { limit })
            .with_context(SectionKind::EntityTable.label()));
    }

    let mut counts = Vec::new();
    let mut alive_seen = 0u32;
    for index in 0..slot_count {
        let generation = r.u32()?;
        let alive = match r.u8()? {
            0 => false,
            1 => true,
            other => return Err(r.corrupt(format!("slot {index} alive flag is {other}"))),
        };
        r.reserved(3)?;
        let component_count = r.u32()?;
        if !alive && component_count != 0 {
            return Err(r.corrupt(format!(
                "dead slot {index} declares {component_count} components"
            )));
        }

        staged.world_mut().push_restored_slot(generation, alive)?;
        counts.push(component_count);
        alive_seen += u32::from(alive);
    }
    r.finish()?;

    if alive_seen != alive_count {
        return Err(Error::corrupt(format!(
            "{alive_seen} alive slots, header says {alive_count}"
        ))
        .with_context(SectionKind::EntityTable.label()));
    }
    Ok(counts)
}

fn read_component_payloads(
    staged: &mut SimulationState,
    mut r: ByteReader<'_>,
    counts: &[u32],
) -> Result<()> {
    let record_count = r.u32()?;
    for _ in 0..record_count {
        let slot = r.u32()?;
        let component = ComponentType::new(r.u32()?);
        let size = r.u32()?;
        let data = r.take(size as usize)?;
        staged
            .world_mut()
            .insert_restored(slot, component, data)
            .map_err(|e| e.with_context(SectionKind::ComponentPayloads.label()))?;
    }
    r.finish()?;

    let slots = staged.world().entities().slots();
    for (index, (slot, &declared)) in slots.iter().zip(counts).enumerate() {
        if slot.components().len() != declared as usize {
            return Err(Error::corrupt(format!(
                "slot {index} declares {declared} components, {} stored",
                slot.components().len()
            ))
            .with_context(SectionKind::ComponentPayloads.label()));
        }
    }
    Ok(())
}

fn read_tick(staged: &mut SimulationState, mut r: ByteReader<'_>) -> Result<()> {
    let tick = r.u64()?;
    let next_sequence = r.u64()?;
    r.finish()?;
    staged.set_clock(tick, next_sequence);
    Ok(())
}

fn read_event_queues(staged: &mut SimulationState, mut r: ByteReader<'_>) -> Result<()> {
    let pending_count = r.u32()?;
    let ready_count = r.u32()?;
    let limit = staged.config().max_events;
    if u64::from(pending_count) + u64::from(ready_count) > u64::from(limit) {
        return Err(Error::capacity_exceeded(CapacityLimit::Events { limit })
            .with_context(SectionKind::EventQueues.label()));
    }

    let mut max_sequence = 0u64;
    for i in 0..pending_count + ready_count {
        let record = read_event_record(&mut r, staged.event_registry())?;
        max_sequence = max_sequence.max(record.sequence);
        let events = staged.events_mut();
        let pushed = if i < pending_count {
            events.push_pending(record)
        } else {
            events.push_ready(record)
        };
        pushed.map_err(|e| e.with_context(SectionKind::EventQueues.label()))?;
    }
    r.finish()?;

    let next_sequence = staged.next_sequence().max(max_sequence.saturating_add(1));
    let tick = staged.tick();
    staged.set_clock(tick, next_sequence);
    Ok(())
}

fn read_event_record(r: &mut ByteReader<'_>, registry: &EventRegistry) -> Result<EventRecord> {
    let target = EntityId::from_bits(r.u64()?);
    let event = EventType::new(r.u32()?);
    let deliver_at = r.u64()?;
    let sequence = r.u64()?;
    let len = r.u32()?;
    let payload = r.take(len as usize)?;

    match registry.get(event) {
        Some(meta) if meta.payload_size == len => {}
        Some(meta) => {
            return Err(r.corrupt(format!(
                "{event} record has {len} payload bytes, registered size is {}",
                meta.payload_size
            )));
        }
        None => return Err(r.corrupt(format!("record of unregistered {event}"))),
    }

    Ok(EventRecord {
        target,
        event,
        deliver_at,
        sequence,
        payload: payload.to_vec(),
    })
}
