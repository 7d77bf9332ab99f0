/// Bitstream plumbing between generators and the synthesizer
pub mod buffer;
pub mod exchange;
pub mod feeder;

pub use buffer::CircularBuffer;
pub use exchange::{ExchangeReader, ExchangeWriter, Pull, stream_exchange};
pub use feeder::StreamReaderThread;

use crate::error::Result;

/// Pull-based bit generator.
///
/// Bits are packed MSB first starting at bit 0 of `buffer`. Producing zero
/// bits without an error means end of stream.
pub trait Reader: Send {
    /// Fill up to `max_bits` bits (bounded by the buffer size) and return
    /// how many were written.
    fn read(&mut self, buffer: &mut [u8], max_bits: usize) -> Result<usize>;

    /// Rewind so the next read repeats the stream from the start.
    fn reset(&mut self) -> Result<()>;

    /// Total bits the stream will produce, used to size progress.
    fn length(&self) -> u64;
}

/// Pack bits from `next` into `buffer` until it is full, `max_bits` is
/// reached or `next` reports the end.
pub(crate) fn fill_bits<F>(
    buffer: &mut [u8],
    max_bits: usize,
    mut next: F,
) -> Result<usize>
where
    F: FnMut() -> Result<Option<bool>>,
{
    let max_bits = max_bits.min(buffer.len() * 8);
    let mut written = 0;

    while written < max_bits {
        let Some(bit) = next()? else {
            break;
        };

        let mask = 0x80u8 >> (written & 7);
        let byte = &mut buffer[written >> 3];
        if bit {
            *byte |= mask;
        } else {
            *byte &= !mask;
        }
        written += 1;
    }

    Ok(written)
}

/// Read bit `index` (MSB first) of a packed buffer
#[inline]
pub fn bit_at(buffer: &[u8], index: usize) -> bool {
    (buffer[index >> 3] << (index & 7)) & 0x80 != 0
}

/// Re-packs bit blocks of arbitrary length into whole bytes.
#[derive(Debug, Default)]
pub struct BitPacker {
    pending: u8,
    pending_bits: u32,
}

impl BitPacker {
    /// Append the first `bits` bits of `block` and move every completed
    /// byte to `out`.
    pub fn pack(&mut self, block: &[u8], bits: usize, out: &mut Vec<u8>) {
        if self.pending_bits == 0 {
            let whole = bits / 8;
            out.extend_from_slice(&block[..whole]);
            for i in whole * 8..bits {
                self.push(bit_at(block, i), out);
            }
            return;
        }

        for i in 0..bits {
            self.push(bit_at(block, i), out);
        }
    }

    /// Emit the trailing partial byte, zero padded.
    pub fn flush(&mut self, out: &mut Vec<u8>) {
        if self.pending_bits > 0 {
            out.push(self.pending << (8 - self.pending_bits));
            self.pending = 0;
            self.pending_bits = 0;
        }
    }

    #[inline]
    fn push(&mut self, bit: bool, out: &mut Vec<u8>) {
        self.pending = (self.pending << 1) | bit as u8;
        self.pending_bits += 1;
        if self.pending_bits == 8 {
            out.push(self.pending);
            self.pending = 0;
            self.pending_bits = 0;
        }
    }
}
