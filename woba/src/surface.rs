//! The output raster.
//!
//! A decoded record produces two independent bilevel planes of identical
//! geometry: the card image itself and its transparency mask. Rows are packed
//! one bit per pixel, MSB-first, and padded to a 32-bit boundary. The padding
//! matches the row widths the opcode stream is encoded against, so in-range
//! writes computed from well-formed bounds always land inside a row.

use crate::{DecodeError, Result};

/// One packed bilevel plane. A set bit means black.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plane {
    width: u32,
    height: u32,
    row_bytes: usize,
    data: Vec<u8>,
}

impl Plane {
    /// Create a plane filled with white pixels.
    fn new(width: u32, height: u32) -> Self {
        let row_bytes = width.div_ceil(32) as usize * 4;
        Self {
            width,
            height,
            row_bytes,
            data: vec![0; row_bytes * height as usize],
        }
    }

    /// The width of the plane in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// The height of the plane in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The packed stride of one row in bytes, padded to a 32-bit boundary.
    pub fn row_bytes(&self) -> usize {
        self.row_bytes
    }

    /// The raw packed pixel data, `row_bytes` bytes per row.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get a pixel value at (x, y). `true` means black.
    ///
    /// Out-of-range coordinates read as white.
    #[inline]
    pub fn get_pixel(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }

        let byte = self.data[y as usize * self.row_bytes + (x / 8) as usize];
        (byte >> (7 - (x & 7))) & 1 != 0
    }

    /// Fill `len` bytes of row `y`, starting at byte offset `x`, with `value`.
    pub(crate) fn fill_row(&mut self, value: u8, x: usize, y: i32, len: usize) -> Result<()> {
        self.row_mut(y, x, len)?.fill(value);
        Ok(())
    }

    /// Copy `bytes` into row `y` at byte offset `x`.
    pub(crate) fn write_row(&mut self, bytes: &[u8], x: usize, y: i32) -> Result<()> {
        self.row_mut(y, x, bytes.len())?.copy_from_slice(bytes);
        Ok(())
    }

    /// Read `len` bytes of row `y`, starting at byte offset `x`.
    pub(crate) fn read_row(&self, x: usize, y: i32, len: usize) -> Result<&[u8]> {
        let range = self.row_range(y, x, len)?;
        Ok(&self.data[range])
    }

    /// Copy the whole row `src` into the row `dest`.
    pub(crate) fn copy_row(&mut self, dest: i32, src: i32) -> Result<()> {
        let src_range = self.row_range(src, 0, self.row_bytes)?;
        let dest_range = self.row_range(dest, 0, self.row_bytes)?;
        self.data.copy_within(src_range, dest_range.start);
        Ok(())
    }

    fn row_mut(&mut self, y: i32, x: usize, len: usize) -> Result<&mut [u8]> {
        let range = self.row_range(y, x, len)?;
        Ok(&mut self.data[range])
    }

    fn row_range(&self, y: i32, x: usize, len: usize) -> Result<core::ops::Range<usize>> {
        let y = usize::try_from(y).map_err(|_| DecodeError::OutOfBounds)?;
        let end = x.checked_add(len).ok_or(DecodeError::OutOfBounds)?;

        if y >= self.height as usize || end > self.row_bytes {
            return Err(DecodeError::OutOfBounds);
        }

        let start = y * self.row_bytes + x;
        Ok(start..start + len)
    }
}

#[cfg(feature = "image")]
impl Plane {
    /// Convert the plane to an 8-bit grayscale image (black = 0, white = 255).
    pub fn to_gray_image(&self) -> image::GrayImage {
        image::GrayImage::from_fn(self.width, self.height, |x, y| {
            image::Luma([if self.get_pixel(x, y) { 0 } else { 255 }])
        })
    }
}

/// A decoded WOBA record: the image plane and the mask plane.
///
/// This is the only state that outlives a decode call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    width: u32,
    height: u32,
    pub(crate) image: Plane,
    pub(crate) mask: Plane,
}

impl Surface {
    /// Create a surface with both planes white.
    pub(crate) fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            image: Plane::new(width, height),
            mask: Plane::new(width, height),
        }
    }

    /// The width of the surface in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// The height of the surface in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The image plane.
    pub fn image(&self) -> &Plane {
        &self.image
    }

    /// The mask plane.
    pub fn mask(&self) -> &Plane {
        &self.mask
    }

    /// Replace the mask plane with a copy of the image plane.
    pub(crate) fn copy_image_to_mask(&mut self) {
        self.mask.data.copy_from_slice(&self.image.data);
    }
}
