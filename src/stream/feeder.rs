//! Worker that pulls blocks from a [`Reader`] and pushes them into the
//! exchange.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

use super::exchange::ExchangeWriter;
use super::{BitPacker, Reader};
use crate::error::{Error, Result};

/// Feeder thread owning a reader for the length of one transmission.
///
/// `on_done` is called exactly once from the worker: `Ok(bits)` when the
/// reader hit end of stream, `Err(_)` when it failed or was cancelled.
pub struct StreamReaderThread<R: Reader + 'static> {
    cancel: Arc<AtomicBool>,
    handle: Option<JoinHandle<R>>,
}

impl<R: Reader + 'static> StreamReaderThread<R> {
    pub fn spawn<F>(
        reader: R,
        writer: ExchangeWriter,
        block_bytes: usize,
        on_done: F,
    ) -> Result<Self>
    where
        F: FnOnce(Result<u64>) + Send + 'static,
    {
        let cancel = Arc::new(AtomicBool::new(false));
        let flag = cancel.clone();
        let block_bytes = block_bytes.max(1);

        let handle = thread::Builder::new()
            .name("stream-reader".into())
            .spawn(move || {
                let mut reader = reader;
                let mut writer = writer;
                let outcome =
                    feed(&mut reader, &mut writer, block_bytes, &flag);

                match &outcome {
                    Ok(bits) => info!("Stream reader finished: {} bits", bits),
                    Err(Error::Terminated) => debug!("Stream reader cancelled"),
                    Err(err) => warn!("Stream reader failed: {}", err),
                }

                // Close the stream before notifying so the consumer drains
                drop(writer);
                on_done(outcome);
                reader
            })
            .map_err(Error::Spawn)?;

        Ok(Self {
            cancel,
            handle: Some(handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Cancel the worker, wait for it and hand the reader back.
    pub fn stop(&mut self) -> Option<R> {
        self.cancel.store(true, Ordering::Release);
        let handle = self.handle.take()?;
        match handle.join() {
            Ok(reader) => Some(reader),
            Err(_) => {
                warn!("Stream reader thread panicked");
                None
            }
        }
    }
}

impl<R: Reader + 'static> Drop for StreamReaderThread<R> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn feed<R: Reader>(
    reader: &mut R,
    writer: &mut ExchangeWriter,
    block_bytes: usize,
    cancel: &AtomicBool,
) -> Result<u64> {
    let mut block = vec![0u8; block_bytes];
    let mut packed = Vec::with_capacity(block_bytes + 1);
    let mut packer = BitPacker::default();
    let mut total_bits = 0u64;

    loop {
        if cancel.load(Ordering::Acquire) {
            return Err(Error::Terminated);
        }

        let bits = reader.read(&mut block, block_bytes * 8)?;
        if bits == 0 {
            break;
        }
        total_bits += bits as u64;

        packed.clear();
        packer.pack(&block, bits, &mut packed);
        writer.write_all(&packed, cancel)?;
    }

    packed.clear();
    packer.flush(&mut packed);
    writer.write_all(&packed, cancel)?;
    writer.finish(total_bits);

    Ok(total_bits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{Pull, stream_exchange};
    use crossbeam_channel::unbounded;
    use std::time::Duration;

    struct Pattern {
        bits: Vec<bool>,
        pos: usize,
        fail_at: Option<usize>,
    }

    impl Reader for Pattern {
        fn read(&mut self, buffer: &mut [u8], max_bits: usize) -> Result<usize> {
            if self.fail_at == Some(self.pos) {
                return Err(Error::Read(std::io::Error::other("boom")));
            }
            let bits = &self.bits;
            let pos = &mut self.pos;
            // Short blocks on purpose to exercise re-packing
            crate::stream::fill_bits(buffer, max_bits.min(5), || {
                let bit = bits.get(*pos).copied();
                *pos += 1;
                Ok(bit)
            })
        }

        fn reset(&mut self) -> Result<()> {
            self.pos = 0;
            Ok(())
        }

        fn length(&self) -> u64 {
            self.bits.len() as u64
        }
    }

    fn drain(reader: &mut crate::stream::ExchangeReader) -> Vec<u8> {
        let mut received = Vec::new();
        let mut out = [0u8; 7];
        loop {
            match reader.read(&mut out) {
                Pull::Data(n) => received.extend_from_slice(&out[..n]),
                Pull::Starved => thread::sleep(Duration::from_millis(1)),
                Pull::Finished => return received,
            }
        }
    }

    #[test]
    fn test_feeder_packs_and_declares_exact_length() {
        let bits: Vec<bool> = (0..21).map(|i| i % 3 == 0).collect();
        let (writer, mut reader) = stream_exchange(4);
        let (tx, rx) = unbounded();

        let mut feeder = StreamReaderThread::spawn(
            Pattern { bits: bits.clone(), pos: 0, fail_at: None },
            writer,
            2,
            move |outcome| {
                let _ = tx.send(outcome.map_err(|err| err.to_string()));
            },
        )
        .unwrap();

        let bytes = drain(&mut reader);
        assert_eq!(reader.total_bits(), Some(21));
        assert_eq!(bytes.len(), 3);
        for (i, bit) in bits.iter().enumerate() {
            assert_eq!(crate::stream::bit_at(&bytes, i), *bit, "bit {i}");
        }

        assert_eq!(rx.recv().unwrap(), Ok(21));
        assert!(rx.try_recv().is_err());
        assert!(feeder.stop().is_some());
    }

    #[test]
    fn test_reader_error_reported_once() {
        let (writer, mut reader) = stream_exchange(64);
        let (tx, rx) = unbounded();

        let mut feeder = StreamReaderThread::spawn(
            Pattern { bits: vec![true; 40], pos: 0, fail_at: Some(10) },
            writer,
            8,
            move |outcome| {
                let _ = tx.send(matches!(outcome, Err(Error::Read(_))));
            },
        )
        .unwrap();

        drain(&mut reader);
        assert!(rx.recv().unwrap());
        feeder.stop();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_stop_unblocks_full_exchange() {
        let (writer, _reader) = stream_exchange(2);
        let (tx, rx) = unbounded();

        let mut feeder = StreamReaderThread::spawn(
            Pattern { bits: vec![false; 4096], pos: 0, fail_at: None },
            writer,
            16,
            move |outcome| {
                let _ = tx.send(matches!(outcome, Err(Error::Terminated)));
            },
        )
        .unwrap();

        thread::sleep(Duration::from_millis(20));
        assert!(feeder.is_running());

        let reader = feeder.stop().unwrap();
        assert!(reader.pos > 0);
        assert!(rx.recv().unwrap());
    }
}
