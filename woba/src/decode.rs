//! The opcode interpreter.
//!
//! Each plane of a record is compressed as a stream of single-byte opcodes.
//! Three opcode categories append bytes to a row accumulation buffer (zero
//! runs, literal runs and block forms of both), one multiplies the effect of
//! the opcode after it, and the explicit `0x80..=0x8F` opcodes emit whole
//! rows directly or select the predictive filter parameters. A full
//! accumulation buffer is run through the filter (horizontal shift+xor
//! continuation and/or an xor against an earlier output row) and committed
//! as the next scanline.
//!
//! A plane's loop terminates exactly when its declared byte budget has been
//! consumed; no opcode marks the end of a stream.

use log::warn;

use crate::Result;
use crate::buffer::RowBuffer;
use crate::header::Rect;
use crate::reader::Reader;
use crate::surface::Plane;

/// Which plane a decoder invocation writes to.
///
/// The two passes run the identical state machine, but they disagree on how
/// block opcodes that overrun the row buffer are handled (see
/// [`PlaneDecoder::step`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PlaneKind {
    Image,
    Mask,
}

/// The `(dx, dy)` presets selected by opcodes `0x88..=0x8F`.
const DELTA_PRESETS: [(i32, i32); 8] = [
    (16, 0),
    (0, 0),
    (0, 1),
    (0, 2),
    (1, 0),
    (1, 1),
    (2, 2),
    (8, 0),
];

/// One classified opcode byte.
///
/// Every byte value `0x00..=0xFF` classifies to exactly one variant; the
/// format has no invalid opcode, so malformed streams surface as corrupted
/// pixels or bounds errors rather than a recognized error opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Opcode {
    /// `0x00..=0x7F`: append `zeros` zero bytes, then `literals` bytes copied
    /// from the stream.
    Run { zeros: u8, literals: u8 },
    /// `0x80`: an uncompressed row, read straight from the stream.
    RawRow,
    /// `0x81`: an all-white row.
    WhiteRow,
    /// `0x82`: an all-black row.
    BlackRow,
    /// `0x83`: fill with an operand byte and remember it for the row phase.
    PatternRow,
    /// `0x84`: fill with the byte remembered for the row phase.
    LastPatternRow,
    /// `0x85..=0x87`: copy the row `back` rows up.
    CopyRow { back: i32 },
    /// `0x88..=0x8F`: select the predictive filter parameters.
    SetDelta { dx: i32, dy: i32 },
    /// `0x90..=0x9F`: nothing beyond the end-of-row check.
    Nop,
    /// `0xA0..=0xBF`: multiply the next opcode's effect.
    RepeatPrefix { count: u32 },
    /// `0xC0..=0xDF`: append `(op & 0x1F) * 8` literal bytes.
    BlockLiteral { literals: usize },
    /// `0xE0..=0xFF`: append `(op & 0x1F) * 16` zero bytes.
    BlockZeros { zeros: usize },
}

impl Opcode {
    fn classify(byte: u8) -> Self {
        match byte {
            0x00..=0x7F => Self::Run {
                zeros: byte & 0x0F,
                literals: byte >> 4,
            },
            0x80 => Self::RawRow,
            0x81 => Self::WhiteRow,
            0x82 => Self::BlackRow,
            0x83 => Self::PatternRow,
            0x84 => Self::LastPatternRow,
            0x85..=0x87 => Self::CopyRow {
                back: i32::from(byte - 0x84),
            },
            0x88..=0x8F => {
                let (dx, dy) = DELTA_PRESETS[usize::from(byte - 0x88)];
                Self::SetDelta { dx, dy }
            }
            0x90..=0x9F => Self::Nop,
            0xA0..=0xBF => Self::RepeatPrefix {
                count: u32::from(byte & 0x1F),
            },
            0xC0..=0xDF => Self::BlockLiteral {
                literals: usize::from(byte & 0x1F) * 8,
            },
            0xE0..=0xFF => Self::BlockZeros {
                zeros: usize::from(byte & 0x1F) * 16,
            },
        }
    }
}

/// Decoder state for a single plane pass.
///
/// All of this is discarded when the pass ends; nothing crosses the boundary
/// between the mask pass and the image pass.
struct PlaneDecoder<'p> {
    plane: &'p mut Plane,
    kind: PlaneKind,
    /// Byte offset of the decoded region within an output row.
    bx: usize,
    /// Packed row width in bits, rounded up to a 32-bit boundary.
    rowwidth8: i32,
    /// Packed row width in bytes.
    rowwidth: usize,
    /// The output row the next completed scanline lands in.
    y: i32,
    /// Bytes accumulated into the current row buffer so far.
    x: usize,
    /// Effect multiplier armed by a repeat prefix; 1 when unarmed.
    repeat: u32,
    /// Horizontal bit-shift amount of the predictive filter.
    dx: i32,
    /// Vertical row offset of the predictive filter.
    dy: i32,
    row: RowBuffer,
    scratch: RowBuffer,
    /// Fill bytes remembered per `y mod 8` row phase.
    patterns: [u8; 8],
}

/// Run one plane's opcode stream until `data_len` bytes have been consumed.
pub(crate) fn decode_plane(
    reader: &mut Reader<'_>,
    plane: &mut Plane,
    kind: PlaneKind,
    bounds: Rect,
    data_len: usize,
) -> Result<()> {
    let mut decoder = PlaneDecoder::new(plane, kind, bounds);
    let start = reader.byte_pos();

    while reader.byte_pos() - start < data_len {
        decoder.step(reader)?;
    }

    Ok(())
}

impl<'p> PlaneDecoder<'p> {
    fn new(plane: &'p mut Plane, kind: PlaneKind, bounds: Rect) -> Self {
        // The decoded region is aligned outward to 32-bit boundaries: the
        // left edge rounds down, the right edge rounds up.
        let bx8 = bounds.left & !31;
        let right8 = if bounds.right & 31 != 0 {
            (bounds.right | 31) + 1
        } else {
            bounds.right
        };

        let mut rowwidth8 = right8 - bx8;
        if rowwidth8 < 0 {
            warn!("bounds {bounds:?} give a negative row width");
            rowwidth8 = 0;
        }
        let rowwidth = (rowwidth8 / 8) as usize;

        let mut row = RowBuffer::new();
        let mut scratch = RowBuffer::new();
        row.reset(rowwidth);
        scratch.reset(rowwidth);

        Self {
            plane,
            kind,
            bx: usize::try_from(bx8 / 8).unwrap_or(0),
            rowwidth8,
            rowwidth,
            y: bounds.top,
            x: 0,
            repeat: 1,
            dx: 0,
            dy: 0,
            row,
            scratch,
            patterns: [0xAA, 0x55, 0xAA, 0x55, 0xAA, 0x55, 0xAA, 0x55],
        }
    }

    /// Read and execute a single opcode.
    fn step(&mut self, reader: &mut Reader<'_>) -> Result<()> {
        let opcode = Opcode::classify(reader.read_byte()?);
        let repeat = self.repeat;

        match opcode {
            Opcode::RepeatPrefix { count } => {
                // Arms the multiplier for the next opcode. The prefix byte
                // itself performs no end-of-row check.
                self.repeat = count;
                return Ok(());
            }
            Opcode::Run { zeros, literals } => {
                // The operand bytes are consumed once; a repeat appends the
                // same decoded run again at the then-current position.
                let data = reader.read_bytes(usize::from(literals))?;
                for _ in 0..repeat {
                    for _ in 0..zeros {
                        self.row.set(self.x, 0)?;
                        self.x += 1;
                    }
                    self.row.copy_from(self.x, data)?;
                    self.x += data.len();
                }
                self.repeat = 1;
                self.finish_row_if_full()?;
            }
            Opcode::BlockLiteral { literals } => {
                let data = reader.read_bytes(literals)?;
                for _ in 0..repeat {
                    match self.kind {
                        // The image pass truncates an overrunning block copy
                        // to the remaining row-buffer space; the mask pass
                        // treats the same overrun as an error. The asymmetry
                        // is inherited from the format's reference decoder
                        // and deliberately not unified.
                        PlaneKind::Image => {
                            let take = self.row.len().saturating_sub(self.x).min(data.len());
                            if take < data.len() {
                                warn!("block literal overruns the row buffer, copy truncated");
                            }
                            self.row.copy_from(self.x, &data[..take])?;
                        }
                        PlaneKind::Mask => {
                            self.row.copy_from(self.x, data)?;
                        }
                    }
                    self.x += literals;
                }
                self.repeat = 1;
                self.finish_row_if_full()?;
            }
            Opcode::BlockZeros { zeros } => {
                for _ in 0..repeat {
                    for _ in 0..zeros {
                        match self.kind {
                            // Same inherited asymmetry as the block literal:
                            // the mask pass skips out-of-range zero writes,
                            // the image pass pins them to the final byte.
                            PlaneKind::Mask => {
                                if self.x < self.row.len() {
                                    self.row.set(self.x, 0)?;
                                }
                            }
                            PlaneKind::Image => {
                                if let Some(last) = self.row.len().checked_sub(1) {
                                    self.row.set(self.x.min(last), 0)?;
                                }
                            }
                        }
                        self.x += 1;
                    }
                }
                self.repeat = 1;
                self.finish_row_if_full()?;
            }
            Opcode::Nop => {
                self.finish_row_if_full()?;
            }
            Opcode::RawRow => {
                self.x = 0;
                for _ in 0..repeat {
                    let data = reader.read_bytes(self.rowwidth)?;
                    self.plane.write_row(data, self.bx, self.y)?;
                    self.y += 1;
                }
                self.repeat = 1;
            }
            Opcode::WhiteRow => {
                self.fill_rows(0x00, repeat)?;
            }
            Opcode::BlackRow => {
                self.fill_rows(0xFF, repeat)?;
            }
            Opcode::PatternRow => {
                let operand = reader.read_byte()?;
                self.x = 0;
                for _ in 0..repeat {
                    self.patterns[self.phase()] = operand;
                    self.plane.fill_row(operand, self.bx, self.y, self.rowwidth)?;
                    self.y += 1;
                }
                self.repeat = 1;
            }
            Opcode::LastPatternRow => {
                self.x = 0;
                for _ in 0..repeat {
                    // The cache slot is looked up per row; consecutive rows
                    // may fill with different bytes.
                    let operand = self.patterns[self.phase()];
                    self.plane.fill_row(operand, self.bx, self.y, self.rowwidth)?;
                    self.y += 1;
                }
                self.repeat = 1;
            }
            Opcode::CopyRow { back } => {
                self.x = 0;
                for _ in 0..repeat {
                    self.plane.copy_row(self.y, self.y - back)?;
                    self.y += 1;
                }
                self.repeat = 1;
            }
            Opcode::SetDelta { dx, dy } => {
                // Selects the filter parameters. Does not consume the armed
                // repeat count; an armed prefix still applies to the next
                // row or data opcode.
                self.dx = dx;
                self.dy = dy;
            }
        }

        Ok(())
    }

    fn fill_rows(&mut self, value: u8, repeat: u32) -> Result<()> {
        self.x = 0;
        for _ in 0..repeat {
            self.plane.fill_row(value, self.bx, self.y, self.rowwidth)?;
            self.y += 1;
        }
        self.repeat = 1;
        Ok(())
    }

    /// The pattern cache slot for the current output row.
    fn phase(&self) -> usize {
        (self.y & 7) as usize
    }

    /// If the accumulation buffer holds a complete row, run the predictive
    /// filter over it and commit it to the output plane.
    fn finish_row_if_full(&mut self) -> Result<()> {
        if self.x < self.rowwidth {
            return Ok(());
        }
        self.x = 0;

        if self.dx != 0 {
            // Accumulate rowwidth8/dx successively shifted copies of the row
            // onto itself. This continues horizontal runs: each set bit
            // repeats every dx bits to the right edge.
            self.scratch.copy_from(0, self.row.as_slice())?;
            for _ in 0..(self.rowwidth8 / self.dx) {
                self.scratch.shift_right(self.dx as u32);
                self.row.xor_from(0, self.scratch.as_slice())?;
            }
        }
        if self.dy != 0 {
            // Vertical prediction: the accumulated row is a delta against
            // the output row dy rows up.
            let reference = self.plane.read_row(self.bx, self.y - self.dy, self.rowwidth)?;
            self.row.xor_from(0, reference)?;
        }

        self.plane.write_row(self.row.as_slice(), self.bx, self.y)?;
        self.y += 1;
        Ok(())
    }
}

/// Synthesize a solid rectangular mask.
///
/// Used when the record declares no mask opcode stream but carries a
/// non-degenerate mask bounding rectangle.
pub(crate) fn fill_rect_mask(mask: &mut Plane, bounds: Rect) -> Result<()> {
    let rowwidth = (bounds.right - bounds.left) / 8;
    if rowwidth <= 0 {
        return Ok(());
    }

    let row = vec![0xFF; rowwidth as usize];
    for y in bounds.top..bounds.bottom {
        mask.write_row(&row, 0, y)?;
    }

    Ok(())
}
