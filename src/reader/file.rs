use std::fs::File;
use std::io::{BufReader, ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;

use tracing::debug;

use crate::error::Result;
use crate::stream::{Reader, bit_at, fill_bits};
use crate::utils::Cursor;
use crate::utils::consts::READ_BLOCK_BYTES;

/// Raw OOK bitstream file, 8 bits per byte, MSB first
pub struct FileReader {
    inner: BufReader<File>,
    size: u64,
    chunk: [u8; READ_BLOCK_BYTES],
    /// Position within `chunk`, in bits
    bit_cursor: Cursor,
}

impl FileReader {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let size = file.metadata()?.len();
        debug!("Opened {} ({} bytes)", path.display(), size);

        Ok(Self {
            inner: BufReader::new(file),
            size,
            chunk: [0; READ_BLOCK_BYTES],
            bit_cursor: Cursor::default(),
        })
    }

    fn next_bit(&mut self) -> Result<Option<bool>> {
        if self.bit_cursor.is_done() && !self.refill()? {
            return Ok(None);
        }

        let bit = bit_at(&self.chunk, self.bit_cursor.index as usize);
        self.bit_cursor.bump();
        Ok(Some(bit))
    }

    /// False at end of file
    fn refill(&mut self) -> Result<bool> {
        loop {
            match self.inner.read(&mut self.chunk) {
                Ok(n) => {
                    self.bit_cursor = Cursor::new(n as u32 * 8);
                    return Ok(n > 0);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => {}
                Err(err) => return Err(err.into()),
            }
        }
    }
}

impl Reader for FileReader {
    fn read(&mut self, buffer: &mut [u8], max_bits: usize) -> Result<usize> {
        fill_bits(buffer, max_bits, || self.next_bit())
    }

    fn reset(&mut self) -> Result<()> {
        self.inner.seek(SeekFrom::Start(0))?;
        self.bit_cursor.reset();
        Ok(())
    }

    fn length(&self) -> u64 {
        self.size * 8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_reads_whole_bytes() {
        let path = std::env::temp_dir().join("ooktx_file_reader_unit.ask");
        std::fs::write(&path, [0xAA, 0x0F, 0x80]).unwrap();

        let mut reader = FileReader::open(&path).unwrap();
        assert_eq!(reader.length(), 24);

        let mut buffer = [0u8; 2];
        assert_eq!(reader.read(&mut buffer, 16).unwrap(), 16);
        assert_eq!(buffer, [0xAA, 0x0F]);
        assert_eq!(reader.read(&mut buffer, 16).unwrap(), 8);
        assert_eq!(buffer[0], 0x80);
        assert_eq!(reader.read(&mut buffer, 16).unwrap(), 0);

        reader.reset().unwrap();
        assert_eq!(reader.read(&mut buffer, 8).unwrap(), 8);
        assert_eq!(buffer[0], 0xAA);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_short_reads_split_bytes() {
        let path = std::env::temp_dir().join("ooktx_file_reader_short.ask");
        std::fs::write(&path, [0xA5, 0x3C]).unwrap();

        let mut reader = FileReader::open(&path).unwrap();
        let mut buffer = [0u8; 1];

        assert_eq!(reader.read(&mut buffer, 4).unwrap(), 4);
        assert_eq!(buffer[0] & 0xF0, 0xA0);

        assert_eq!(reader.read(&mut buffer, 7).unwrap(), 7);
        assert_eq!(buffer[0] & 0xFE, 0b0101_0010);

        assert_eq!(reader.read(&mut buffer, 3).unwrap(), 3);
        assert_eq!(buffer[0] & 0xE0, 0b1110_0000);

        assert_eq!(reader.read(&mut buffer, 8).unwrap(), 2);
        assert_eq!(buffer[0] & 0xC0, 0);
        assert_eq!(reader.read(&mut buffer, 1).unwrap(), 0);

        // Rewinding mid-byte restarts at the first bit
        reader.reset().unwrap();
        assert_eq!(reader.read(&mut buffer, 1).unwrap(), 1);
        reader.reset().unwrap();
        assert_eq!(reader.read(&mut buffer, 5).unwrap(), 5);
        assert_eq!(buffer[0] & 0xF8, 0b1010_0000);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let path = std::env::temp_dir().join("ooktx_does_not_exist.ask");
        assert!(matches!(FileReader::open(path), Err(Error::Read(_))));
    }
}
