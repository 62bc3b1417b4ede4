//! Serialization of a simulation into snapshot bytes.

use tickwork_engine::{EventRecord, SimulationState};
use tickwork_foundation::{Error, ErrorKind, Result};

use super::bytes::ByteWriter;
use super::format::{CHECKSUM_OFFSET, HEADER_LEN, Header, SectionKind, checksum};

/// Encodes the full state into a new buffer.
pub(crate) fn encode(state: &SimulationState) -> Result<Vec<u8>> {
    let sections: Vec<(SectionKind, Vec<u8>)> = SectionKind::ALL
        .into_iter()
        .map(|kind| (kind, encode_section(state, kind)))
        .collect();

    #[allow(clippy::cast_possible_truncation)]
    let section_count = sections.len() as u32;
    let payload_offset = Header::payload_offset_for(section_count);
    let payload_len: u64 = sections.iter().map(|(_, bytes)| bytes.len() as u64).sum();
    let total_size = payload_offset + payload_len;
    let total = usize::try_from(total_size)
        .map_err(|_| Error::new(ErrorKind::OutOfMemory(usize::MAX)))?;

    let mut buf = Vec::new();
    buf.try_reserve_exact(total)
        .map_err(|_| Error::new(ErrorKind::OutOfMemory(total)))?;
    let mut out = ByteWriter::from_vec(buf);

    Header {
        section_count,
        section_table_offset: HEADER_LEN as u64,
        payload_offset,
        total_size,
        checksum: 0,
    }
    .write(&mut out);

    let mut cursor = payload_offset;
    for (kind, bytes) in &sections {
        out.put_u32(kind.raw());
        out.put_u32(0);
        out.put_u64(cursor);
        out.put_u64(bytes.len() as u64);
        cursor += bytes.len() as u64;
    }
    for (_, bytes) in &sections {
        out.put_bytes(bytes);
    }

    let mut buf = out.into_inner();
    #[allow(clippy::cast_possible_truncation)]
    let sum = checksum(&buf[payload_offset as usize..]);
    buf[CHECKSUM_OFFSET..CHECKSUM_OFFSET + 4].copy_from_slice(&sum.to_le_bytes());
    Ok(buf)
}

fn encode_section(state: &SimulationState, kind: SectionKind) -> Vec<u8> {
    let mut out = ByteWriter::new();
    match kind {
        SectionKind::Config => write_config(state, &mut out),
        SectionKind::Tick => {
            out.put_u64(state.tick());
            out.put_u64(state.next_sequence());
        }
        SectionKind::EntityTable => write_entity_table(state, &mut out),
        SectionKind::ComponentRegistry => write_component_registry(state, &mut out),
        SectionKind::ComponentPayloads => write_component_payloads(state, &mut out),
        SectionKind::EventRegistry => write_event_registry(state, &mut out),
        SectionKind::EventQueues => write_event_queues(state, &mut out),
    }
    out.into_inner()
}

fn write_config(state: &SimulationState, out: &mut ByteWriter) {
    let config = state.config();
    out.put_u32(config.max_entities);
    out.put_u32(config.max_components_per_entity);
    out.put_u32(config.max_events);
    out.put_u32(config.max_event_payload_bytes);
    out.put_u32(config.fixed_dt.to_bits());
}

fn write_entity_table(state: &SimulationState, out: &mut ByteWriter) {
    let table = state.world().entities();
    out.put_u32(table.slot_count());
    out.put_u32(table.len());
    for slot in table.slots() {
        out.put_u32(slot.generation());
        out.put_u8(u8::from(slot.is_alive()));
        out.put_bytes(&[0; 3]);
        if slot.is_alive() {
            out.put_len(slot.components().len());
        } else {
            out.put_u32(0);
        }
    }
}

fn write_component_registry(state: &SimulationState, out: &mut ByteWriter) {
    let registry = state.world().registry();
    out.put_len(registry.len());
    for meta in registry.iter() {
        out.put_u32(meta.component.raw());
        out.put_u32(meta.size);
        out.put_u32(meta.alignment);
        out.put_bytes(&meta.name.to_bytes());
    }
}

fn write_component_payloads(state: &SimulationState, out: &mut ByteWriter) {
    let slots = state.world().entities().slots();
    let record_count: usize = slots
        .iter()
        .filter(|slot| slot.is_alive())
        .map(|slot| slot.components().len())
        .sum();
    out.put_len(record_count);

    for (index, slot) in slots.iter().enumerate().filter(|(_, s)| s.is_alive()) {
        for blob in slot.components() {
            out.put_len(index);
            out.put_u32(blob.component().raw());
            out.put_len(blob.data().len());
            out.put_bytes(blob.data());
        }
    }
}

fn write_event_registry(state: &SimulationState, out: &mut ByteWriter) {
    let registry = state.event_registry();
    out.put_len(registry.len());
    for meta in registry.iter() {
        out.put_u32(meta.event.raw());
        out.put_u32(meta.payload_size);
        out.put_bytes(&meta.name.to_bytes());
    }
}

fn write_event_queues(state: &SimulationState, out: &mut ByteWriter) {
    let events = state.events();
    out.put_len(events.pending_len());
    out.put_len(events.ready_len());
    for record in events.pending().chain(events.ready()) {
        write_event_record(record, out);
    }
}

fn write_event_record(record: &EventRecord, out: &mut ByteWriter) {
    out.put_u64(record.target.to_bits());
    out.put_u32(record.event.raw());
    out.put_u64(record.deliver_at);
    out.put_u64(record.sequence);
    out.put_len(record.payload.len());
    out.put_bytes(&record.payload);
}
