//! Byte-level reader for WOBA records.

use crate::{DecodeError, Result};

/// A bounds-checked reader over the raw record bytes.
///
/// All multi-byte integers in a WOBA record are big-endian.
#[derive(Debug, Clone)]
pub(crate) struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    #[inline(always)]
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// The current absolute byte position in the record.
    #[inline(always)]
    pub(crate) fn byte_pos(&self) -> usize {
        self.pos
    }

    /// Read a single byte.
    #[inline(always)]
    pub(crate) fn read_byte(&mut self) -> Result<u8> {
        let byte = *self.data.get(self.pos).ok_or(DecodeError::TruncatedStream)?;
        self.pos += 1;
        Ok(byte)
    }

    /// Read the given number of bytes.
    #[inline(always)]
    pub(crate) fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .ok_or(DecodeError::TruncatedStream)?;
        let bytes = self
            .data
            .get(self.pos..end)
            .ok_or(DecodeError::TruncatedStream)?;
        self.pos = end;
        Ok(bytes)
    }

    /// Skip the given number of bytes.
    #[inline(always)]
    pub(crate) fn skip_bytes(&mut self, len: usize) -> Result<()> {
        self.read_bytes(len).map(|_| ())
    }

    /// Read a big-endian u16.
    #[inline(always)]
    pub(crate) fn read_u16(&mut self) -> Result<u16> {
        let bytes = self
            .read_bytes(2)?
            .try_into()
            .map_err(|_| DecodeError::TruncatedStream)?;
        Ok(u16::from_be_bytes(bytes))
    }

    /// Read a big-endian u32.
    #[inline(always)]
    pub(crate) fn read_u32(&mut self) -> Result<u32> {
        let bytes = self
            .read_bytes(4)?
            .try_into()
            .map_err(|_| DecodeError::TruncatedStream)?;
        Ok(u32::from_be_bytes(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_are_sequential_and_big_endian() {
        let data = [0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0xDE];
        let mut reader = Reader::new(&data);

        assert_eq!(reader.read_u16(), Ok(0x1234));
        assert_eq!(reader.read_u32(), Ok(0x5678_9ABC));
        assert_eq!(reader.read_byte(), Ok(0xDE));
        assert_eq!(reader.byte_pos(), 7);
        assert_eq!(reader.read_byte(), Err(DecodeError::TruncatedStream));
    }

    #[test]
    fn over_read_is_truncated_stream() {
        let data = [0x00, 0x01];
        let mut reader = Reader::new(&data);

        assert_eq!(reader.read_bytes(3), Err(DecodeError::TruncatedStream));
        // A failed read must not move the cursor.
        assert_eq!(reader.byte_pos(), 0);
        assert_eq!(reader.read_bytes(2), Ok(&data[..]));
    }
}
