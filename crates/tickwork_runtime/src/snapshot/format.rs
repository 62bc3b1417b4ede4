//! Snapshot layout constants, header, and checksum.
//!
//! ```text
//! +--------------------+ 0
//! | header (48 bytes)  |
//! +--------------------+ 48
//! | section table      |  24 bytes per section
//! +--------------------+ payload offset
//! | section payloads   |  contiguous, in table order
//! +--------------------+ total size
//! ```
//!
//! All integers are little-endian. The checksum is 32-bit FNV-1a over every
//! byte from the payload offset to the end.

use tickwork_foundation::{Error, Result};

use super::bytes::{ByteReader, ByteWriter};

/// File magic, including the trailing NUL.
pub const MAGIC: [u8; 6] = *b"SESIM\0";
/// Current format version.
pub const VERSION: u16 = 1;
/// Byte order marker for little-endian.
pub const ENDIAN_LITTLE: u8 = 1;
/// Size of the fixed header.
pub const HEADER_LEN: usize = 48;
/// Size of one section table entry.
pub const SECTION_ENTRY_LEN: usize = 24;
/// Byte offset of the checksum field within the header.
pub const CHECKSUM_OFFSET: usize = 40;

const FNV_OFFSET_BASIS: u32 = 2_166_136_261;
const FNV_PRIME: u32 = 16_777_619;

/// Section type tags, in the order they are written.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum SectionKind {
    /// Capacity limits and timestep.
    Config = 1,
    /// Tick and sequence counters.
    Tick = 2,
    /// Entity slots.
    EntityTable = 3,
    /// Component schemas.
    ComponentRegistry = 4,
    /// Component blobs.
    ComponentPayloads = 5,
    /// Event schemas.
    EventRegistry = 6,
    /// Pending and ready events.
    EventQueues = 7,
}

impl SectionKind {
    /// Every section, in write order.
    pub const ALL: [SectionKind; 7] = [
        SectionKind::Config,
        SectionKind::Tick,
        SectionKind::EntityTable,
        SectionKind::ComponentRegistry,
        SectionKind::ComponentPayloads,
        SectionKind::EventRegistry,
        SectionKind::EventQueues,
    ];

    /// Decodes a type tag.
    #[must_use]
    pub fn from_raw(raw: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.raw() == raw)
    }

    /// Returns the type tag.
    #[must_use]
    pub fn raw(self) -> u32 {
        self as u32
    }

    /// Returns the position of this kind in [`SectionKind::ALL`].
    #[must_use]
    pub fn slot(self) -> usize {
        self as usize - 1
    }

    /// Name used in error context.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Config => "config section",
            Self::Tick => "tick section",
            Self::EntityTable => "entity table section",
            Self::ComponentRegistry => "component registry section",
            Self::ComponentPayloads => "component payloads section",
            Self::EventRegistry => "event registry section",
            Self::EventQueues => "event queues section",
        }
    }
}

/// 32-bit FNV-1a.
#[must_use]
pub fn checksum(data: &[u8]) -> u32 {
    data.iter().fold(FNV_OFFSET_BASIS, |hash, &byte| {
        (hash ^ u32::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

/// Decoded fixed header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Header {
    pub section_count: u32,
    pub section_table_offset: u64,
    pub payload_offset: u64,
    pub total_size: u64,
    pub checksum: u32,
}

impl Header {
    /// Payload offset implied by a section count.
    pub(crate) fn payload_offset_for(section_count: u32) -> u64 {
        HEADER_LEN as u64 + u64::from(section_count) * SECTION_ENTRY_LEN as u64
    }

    pub(crate) fn write(&self, out: &mut ByteWriter) {
        out.put_bytes(&MAGIC);
        out.put_u16(VERSION);
        out.put_u8(ENDIAN_LITTLE);
        out.put_bytes(&[0; 3]);
        out.put_u32(self.section_count);
        out.put_u64(self.section_table_offset);
        out.put_u64(self.payload_offset);
        out.put_u64(self.total_size);
        out.put_u32(self.checksum);
        out.put_u32(0);
    }

    /// Parses and validates the header at the start of `data`.
    ///
    /// Checks are ordered: format identity (unsupported), then size and
    /// offset consistency (io). The checksum is only read here.
    pub(crate) fn read(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_LEN {
            return Err(Error::invalid_argument(format!(
                "snapshot of {} bytes is shorter than the {HEADER_LEN}-byte header",
                data.len()
            )));
        }
        let mut reader = ByteReader::new(&data[..HEADER_LEN], "snapshot header");

        let magic: [u8; 6] = reader.array()?;
        let version = reader.u16()?;
        let endianness = reader.u8()?;
        if magic != MAGIC {
            return Err(Error::unsupported("bad snapshot magic"));
        }
        if version != VERSION {
            return Err(Error::unsupported(format!(
                "snapshot version {version}, expected {VERSION}"
            )));
        }
        if endianness != ENDIAN_LITTLE {
            return Err(Error::unsupported(format!(
                "snapshot byte order marker {endianness}"
            )));
        }
        reader.reserved(3)?;

        let header = Self {
            section_count: reader.u32()?,
            section_table_offset: reader.u64()?,
            payload_offset: reader.u64()?,
            total_size: reader.u64()?,
            checksum: reader.u32()?,
        };
        reader.reserved(4)?;
        reader.finish()?;

        if header.total_size != data.len() as u64 {
            return Err(Error::corrupt(format!(
                "header declares {} bytes, buffer has {}",
                header.total_size,
                data.len()
            )));
        }
        if header.section_table_offset != HEADER_LEN as u64 {
            return Err(Error::corrupt(format!(
                "section table at {}, expected {HEADER_LEN}",
                header.section_table_offset
            )));
        }
        if header.section_count == 0 {
            return Err(Error::corrupt("snapshot has no sections"));
        }
        if header.payload_offset != Self::payload_offset_for(header.section_count)
            || header.payload_offset > header.total_size
        {
            return Err(Error::corrupt(format!(
                "payload offset {} does not follow {} section entries",
                header.payload_offset, header.section_count
            )));
        }
        Ok(header)
    }
}
