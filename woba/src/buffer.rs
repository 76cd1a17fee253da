//! The row accumulation buffer.
//!
//! Decoded scanlines are assembled here byte by byte before being committed
//! to the output plane. All operations are bounds-checked: an out-of-range
//! access is a hard decode failure, not a recoverable condition, so callers
//! must size the buffer to the packed row width before accumulating into it.

use crate::{DecodeError, Result};

/// A resizable, bounds-checked byte buffer holding one packed scanline.
#[derive(Debug, Clone, Default)]
pub(crate) struct RowBuffer {
    data: Vec<u8>,
}

impl RowBuffer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Replace the contents with `len` zero bytes, discarding the old data.
    pub(crate) fn reset(&mut self, len: usize) {
        self.data.clear();
        self.data.resize(len, 0);
    }

    pub(crate) fn len(&self) -> usize {
        self.data.len()
    }

    pub(crate) fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Write a single byte at `idx`.
    #[inline]
    pub(crate) fn set(&mut self, idx: usize, value: u8) -> Result<()> {
        let byte = self.data.get_mut(idx).ok_or(DecodeError::OutOfBounds)?;
        *byte = value;
        Ok(())
    }

    /// Copy `src` into the buffer starting at `offset`.
    pub(crate) fn copy_from(&mut self, offset: usize, src: &[u8]) -> Result<()> {
        self.region_mut(offset, src.len())?.copy_from_slice(src);
        Ok(())
    }

    /// Exclusive-or `src` into the buffer starting at `offset`.
    pub(crate) fn xor_from(&mut self, offset: usize, src: &[u8]) -> Result<()> {
        for (dest, s) in self.region_mut(offset, src.len())?.iter_mut().zip(src) {
            *dest ^= *s;
        }
        Ok(())
    }

    /// Shift the whole buffer right by `shift` bits, treating it as one
    /// continuous bit stream: bits shifted out of a byte carry into the next.
    ///
    /// The carry is tracked with a 24-bit fixed-point accumulator whose high
    /// byte holds the previous byte's spill-over scaled by 2^16. A shift of 0
    /// is an identity operation.
    pub(crate) fn shift_right(&mut self, shift: u32) {
        let divisor = 1_u32 << shift;
        let mut acc = 0_u32;

        for byte in &mut self.data {
            acc += (u32::from(*byte) * 65536) / divisor;
            *byte = (acc / 65536) as u8;
            acc = (acc % 65536) * 256;
        }
    }

    fn region_mut(&mut self, offset: usize, len: usize) -> Result<&mut [u8]> {
        let end = offset.checked_add(len).ok_or(DecodeError::OutOfBounds)?;
        self.data.get_mut(offset..end).ok_or(DecodeError::OutOfBounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer_with(bytes: &[u8]) -> RowBuffer {
        let mut buf = RowBuffer::new();
        buf.reset(bytes.len());
        buf.copy_from(0, bytes).unwrap();
        buf
    }

    #[test]
    fn reset_zeroes_contents() {
        let mut buf = buffer_with(&[0xFF, 0xFF]);
        buf.reset(3);
        assert_eq!(buf.as_slice(), &[0, 0, 0]);
    }

    #[test]
    fn shift_by_zero_is_identity() {
        let mut buf = buffer_with(&[0x12, 0x80, 0xFF, 0x01]);
        buf.shift_right(0);
        assert_eq!(buf.as_slice(), &[0x12, 0x80, 0xFF, 0x01]);
    }

    #[test]
    fn shift_carries_across_byte_boundaries() {
        let mut buf = buffer_with(&[0x01, 0x00]);
        buf.shift_right(1);
        assert_eq!(buf.as_slice(), &[0x00, 0x80]);

        let mut buf = buffer_with(&[0x80, 0x00]);
        buf.shift_right(1);
        assert_eq!(buf.as_slice(), &[0x40, 0x00]);

        // A 3-bit pattern straddling the boundary after the shift.
        let mut buf = buffer_with(&[0x07, 0x00]);
        buf.shift_right(2);
        assert_eq!(buf.as_slice(), &[0x01, 0xC0]);
    }

    #[test]
    fn shifted_copies_extend_a_run_to_the_right_edge() {
        // The predictive filter accumulates successively shifted copies of a
        // row onto itself; for a single leading bit and a 1-bit shift this
        // fills the row completely.
        let mut row = buffer_with(&[0x80, 0x00]);
        let mut scratch = row.clone();

        for _ in 0..16 {
            scratch.shift_right(1);
            row.xor_from(0, scratch.as_slice()).unwrap();
        }

        assert_eq!(row.as_slice(), &[0xFF, 0xFF]);
    }

    #[test]
    fn xor_is_self_inverse() {
        let mut buf = buffer_with(&[0xDE, 0xAD, 0xBE, 0xEF]);
        let other = [0x0F, 0xF0, 0x55, 0xAA];

        buf.xor_from(0, &other).unwrap();
        assert_ne!(buf.as_slice(), &[0xDE, 0xAD, 0xBE, 0xEF]);

        buf.xor_from(0, &other).unwrap();
        assert_eq!(buf.as_slice(), &[0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn out_of_range_accesses_fail() {
        let mut buf = buffer_with(&[0, 0]);

        assert_eq!(buf.set(2, 1), Err(DecodeError::OutOfBounds));
        assert_eq!(buf.copy_from(1, &[1, 2]), Err(DecodeError::OutOfBounds));
        assert_eq!(buf.xor_from(3, &[1]), Err(DecodeError::OutOfBounds));
        // The failed operations must not have touched the contents.
        assert_eq!(buf.as_slice(), &[0, 0]);
    }
}
