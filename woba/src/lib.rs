/*!
A memory-safe, pure-Rust decoder for WOBA, the compressed bilevel bitmap
format embedded in legacy card-stack documents.

A WOBA record carries two independently compressed 1-bit planes: the card
image itself and its transparency mask. Both are reconstructed by the same
byte-oriented opcode interpreter, which combines run-length coding, a
multi-row repeat mechanism and a predictive shift+xor row filter.

# Example
```rust,no_run
let data = std::fs::read("card.bmap").unwrap();
let surface = woba::decode(&data).unwrap();

println!("{}x{} image", surface.width(), surface.height());
```

`data` must start at the record's fixed header, i.e. after any outer block
size/ID header has been stripped by the caller.

# Safety
This crate forbids unsafe code via a crate-level attribute.
*/

#![forbid(unsafe_code)]

mod buffer;
mod decode;
mod error;
mod header;
mod reader;
mod surface;

pub use error::{DecodeError, Result};
pub use header::Rect;
pub use surface::{Plane, Surface};

use decode::{PlaneKind, decode_plane, fill_rect_mask};
use header::{Header, STREAM_START};
use reader::Reader;

/// Decode a WOBA record into its image and mask planes.
///
/// The output surface is sized to the record's total rectangle. The mask
/// plane is produced from its own opcode stream when one is present, from
/// the mask bounding rectangle when the stream is absent, or as a copy of
/// the decoded image plane when both are absent.
///
/// No validation beyond bounds checking is performed; the format has no
/// invalid opcode, so a malformed record either fails with a
/// [`DecodeError`] or decodes to corrupted pixels.
pub fn decode(data: &[u8]) -> Result<Surface> {
    let header = Header::parse(data)?;

    let width = header.total.width().max(0) as u32;
    let height = header.total.height().max(0) as u32;
    let mut surface = Surface::new(width, height);

    let mut reader = Reader::new(data);
    reader.skip_bytes(STREAM_START)?;

    if header.mask_len > 0 {
        decode_plane(
            &mut reader,
            &mut surface.mask,
            PlaneKind::Mask,
            header.mask_bounds,
            header.mask_len,
        )?;
    } else if !header.mask_bounds.is_zero() {
        fill_rect_mask(&mut surface.mask, header.mask_bounds)?;
    }

    if header.picture_len > 0 {
        decode_plane(
            &mut reader,
            &mut surface.image,
            PlaneKind::Image,
            header.picture_bounds,
            header.picture_len,
        )?;
    }

    // Neither a mask stream nor a mask rectangle: the image doubles as its
    // own mask.
    if header.mask_len == 0 && header.mask_bounds.is_zero() {
        surface.copy_image_to_mask();
    }

    Ok(surface)
}
