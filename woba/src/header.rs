//! Record header parsing.
//!
//! A WOBA record starts with a fixed-layout header; the offsets below are
//! relative to the start of the record, after the outer block size/ID header
//! has been stripped by the caller.
//!
//! | Offset | Size | Field                                   |
//! |--------|------|-----------------------------------------|
//! | 12     | 8    | total rectangle (4 x u16)               |
//! | 20     | 8    | mask bounds rectangle (4 x u16)         |
//! | 28     | 8    | picture bounds rectangle (4 x u16)      |
//! | 44     | 4    | mask data length (u32)                  |
//! | 48     | 4    | picture data length (u32)               |
//! | 52     | ...  | mask opcode stream, then picture stream |

use crate::Result;
use crate::reader::Reader;

/// Offset of the first opcode stream (the mask stream, when present).
pub(crate) const STREAM_START: usize = 52;

/// A pixel-space rectangle with exclusive right and bottom edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    /// The top edge, inclusive.
    pub top: i32,
    /// The left edge, inclusive.
    pub left: i32,
    /// The bottom edge, exclusive.
    pub bottom: i32,
    /// The right edge, exclusive.
    pub right: i32,
}

impl Rect {
    /// The width of the rectangle in pixels.
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    /// The height of the rectangle in pixels.
    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// An all-zero mask rectangle signals "no mask data".
    pub fn is_zero(&self) -> bool {
        self.top == 0 && self.left == 0 && self.bottom == 0 && self.right == 0
    }

    fn parse(reader: &mut Reader<'_>) -> Result<Self> {
        Ok(Self {
            top: i32::from(reader.read_u16()?),
            left: i32::from(reader.read_u16()?),
            bottom: i32::from(reader.read_u16()?),
            right: i32::from(reader.read_u16()?),
        })
    }
}

/// The fixed-layout portion of a WOBA record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Header {
    /// The rectangle of the whole card image; the output surface is sized
    /// to it.
    pub(crate) total: Rect,
    /// The bounding rectangle of the mask plane's decoded region.
    pub(crate) mask_bounds: Rect,
    /// The bounding rectangle of the image plane's decoded region.
    pub(crate) picture_bounds: Rect,
    /// The length of the mask opcode stream in bytes.
    pub(crate) mask_len: usize,
    /// The length of the picture opcode stream in bytes.
    pub(crate) picture_len: usize,
}

impl Header {
    /// Parse the header fields at their fixed offsets.
    ///
    /// No consistency checks are performed on the rectangles or lengths;
    /// a malformed record surfaces later as a decode error or as corrupted
    /// pixels, never here.
    pub(crate) fn parse(data: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(data);

        reader.skip_bytes(12)?;
        let total = Rect::parse(&mut reader)?;
        let mask_bounds = Rect::parse(&mut reader)?;
        let picture_bounds = Rect::parse(&mut reader)?;
        reader.skip_bytes(8)?;
        let mask_len = reader.read_u32()? as usize;
        let picture_len = reader.read_u32()? as usize;

        Ok(Self {
            total,
            mask_bounds,
            picture_bounds,
            mask_len,
            picture_len,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DecodeError;

    #[test]
    fn parses_fields_at_fixed_offsets() {
        let mut data = vec![0_u8; STREAM_START];
        // Total rect (1, 2, 3, 4).
        data[12..20].copy_from_slice(&[0, 1, 0, 2, 0, 3, 0, 4]);
        // Mask rect (10, 0, 20, 16).
        data[20..28].copy_from_slice(&[0, 10, 0, 0, 0, 20, 0, 16]);
        // Picture rect (0, 0, 0x0102, 0x0304).
        data[28..36].copy_from_slice(&[0, 0, 0, 0, 1, 2, 3, 4]);
        data[44..48].copy_from_slice(&0x0000_00AB_u32.to_be_bytes());
        data[48..52].copy_from_slice(&0x0001_0000_u32.to_be_bytes());

        let header = Header::parse(&data).unwrap();
        assert_eq!(
            header.total,
            Rect {
                top: 1,
                left: 2,
                bottom: 3,
                right: 4
            }
        );
        assert_eq!(
            header.mask_bounds,
            Rect {
                top: 10,
                left: 0,
                bottom: 20,
                right: 16
            }
        );
        assert_eq!(header.picture_bounds.bottom, 0x0102);
        assert_eq!(header.picture_bounds.right, 0x0304);
        assert_eq!(header.mask_len, 0xAB);
        assert_eq!(header.picture_len, 0x1_0000);
        assert!(!header.mask_bounds.is_zero());
        assert!(Rect::default().is_zero());
    }

    #[test]
    fn short_record_is_truncated_stream() {
        let data = vec![0_u8; STREAM_START - 1];
        assert_eq!(Header::parse(&data), Err(DecodeError::TruncatedStream));
    }
}
