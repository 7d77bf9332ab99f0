//! Bitstream generators feeding the stream exchange
pub mod debruijn;
pub mod file;
pub mod frame;

pub use debruijn::{DebruijnReader, DebruijnState};
pub use file::FileReader;
pub use frame::{CompleteHook, FrameReader, FrameState};

use crate::error::Result;
use crate::stream::Reader;

/// Any of the transmit sources, dispatched statically
pub enum BitstreamReader {
    Frame(FrameReader),
    DeBruijn(DebruijnReader),
    File(FileReader),
}

impl Reader for BitstreamReader {
    fn read(&mut self, buffer: &mut [u8], max_bits: usize) -> Result<usize> {
        match self {
            Self::Frame(reader) => reader.read(buffer, max_bits),
            Self::DeBruijn(reader) => reader.read(buffer, max_bits),
            Self::File(reader) => reader.read(buffer, max_bits),
        }
    }

    fn reset(&mut self) -> Result<()> {
        match self {
            Self::Frame(reader) => reader.reset(),
            Self::DeBruijn(reader) => reader.reset(),
            Self::File(reader) => reader.reset(),
        }
    }

    fn length(&self) -> u64 {
        match self {
            Self::Frame(reader) => reader.length(),
            Self::DeBruijn(reader) => reader.length(),
            Self::File(reader) => reader.length(),
        }
    }
}

impl From<FrameReader> for BitstreamReader {
    fn from(reader: FrameReader) -> Self {
        Self::Frame(reader)
    }
}

impl From<DebruijnReader> for BitstreamReader {
    fn from(reader: DebruijnReader) -> Self {
        Self::DeBruijn(reader)
    }
}

impl From<FileReader> for BitstreamReader {
    fn from(reader: FileReader) -> Self {
        Self::File(reader)
    }
}
