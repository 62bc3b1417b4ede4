//! Little-endian byte writer and bounds-checked reader.

use tickwork_foundation::{Error, Result};

/// Appends little-endian values to a growable buffer.
#[derive(Debug, Default)]
pub(crate) struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Writes into `buf`, keeping its existing contents and capacity.
    pub(crate) fn from_vec(buf: Vec<u8>) -> Self {
        Self { buf }
    }

    pub(crate) fn put_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub(crate) fn put_u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub(crate) fn put_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub(crate) fn put_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub(crate) fn put_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Writes a length prefix for a collection that is known to fit in u32.
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn put_len(&mut self, len: usize) {
        self.put_u32(len as u32);
    }

    pub(crate) fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

/// Reads little-endian values from one section, failing on truncation.
#[derive(Debug)]
pub(crate) struct ByteReader<'a> {
    data: &'a [u8],
    cursor: usize,
    section: &'static str,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(data: &'a [u8], section: &'static str) -> Self {
        Self {
            data,
            cursor: 0,
            section,
        }
    }

    /// Builds a corrupt-data error naming this reader's section.
    pub(crate) fn corrupt(&self, message: impl Into<String>) -> Error {
        Error::corrupt(message).with_context(self.section)
    }

    pub(crate) fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .cursor
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| {
                self.corrupt(format!(
                    "truncated: need {len} bytes at offset {}, {} left",
                    self.cursor,
                    self.data.len() - self.cursor
                ))
            })?;
        let bytes = &self.data[self.cursor..end];
        self.cursor = end;
        Ok(bytes)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub(crate) fn u8(&mut self) -> Result<u8> {
        Ok(self.take_array::<1>()?[0])
    }

    pub(crate) fn u16(&mut self) -> Result<u16> {
        self.take_array().map(u16::from_le_bytes)
    }

    pub(crate) fn u32(&mut self) -> Result<u32> {
        self.take_array().map(u32::from_le_bytes)
    }

    pub(crate) fn u64(&mut self) -> Result<u64> {
        self.take_array().map(u64::from_le_bytes)
    }

    pub(crate) fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        self.take_array()
    }

    /// Reads bytes that must all be zero.
    pub(crate) fn reserved(&mut self, len: usize) -> Result<()> {
        if self.take(len)?.iter().any(|&b| b != 0) {
            return Err(self.corrupt("reserved bytes are not zero"));
        }
        Ok(())
    }

    /// Fails unless every byte has been consumed.
    pub(crate) fn finish(self) -> Result<()> {
        if self.cursor == self.data.len() {
            Ok(())
        } else {
            Err(self.corrupt(format!(
                "{} trailing bytes",
                self.data.len() - self.cursor
            )))
        }
    }
}
