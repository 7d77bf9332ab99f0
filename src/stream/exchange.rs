//! Bounded byte channel between the feeder thread and the real-time
//! synthesizer.
//!
//! ```text
//! StreamReaderThread ──▶ ExchangeWriter ══ CircularBuffer ══ ExchangeReader ──▶ OokSynthesizer
//!   (may sleep)               ▲                                    │   (never blocks)
//!                             └──────────── doorbell ◀─────────────┘
//! ```
//!
//! The writer sleeps on a doorbell while the ring is full; the reader rings
//! it with a non-blocking `try_send` whenever it frees space. Both handles
//! are created together by [`stream_exchange`] and are not `Clone`, which
//! keeps the ring single-producer / single-consumer.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use tracing::trace;

use super::buffer::CircularBuffer;
use crate::error::{Error, Result};
use crate::utils::consts::EXCHANGE_WAIT_MS;

struct Shared {
    buffer: CircularBuffer,
    finished: AtomicBool,
    total_bits: AtomicU64,
    bytes_written: AtomicU64,
    bytes_read: AtomicU64,
}

/// Producer half, owned by the feeder thread
pub struct ExchangeWriter {
    shared: Arc<Shared>,
    doorbell: Receiver<()>,
    wait: Duration,
}

/// Consumer half, owned by the real-time synthesizer
pub struct ExchangeReader {
    shared: Arc<Shared>,
    doorbell: Sender<()>,
}

/// Create a connected writer/reader pair over a ring of `capacity` bytes.
pub fn stream_exchange(capacity: usize) -> (ExchangeWriter, ExchangeReader) {
    let shared = Arc::new(Shared {
        buffer: CircularBuffer::new(capacity),
        finished: AtomicBool::new(false),
        total_bits: AtomicU64::new(0),
        bytes_written: AtomicU64::new(0),
        bytes_read: AtomicU64::new(0),
    });
    let (ring, wake) = crossbeam_channel::bounded(1);

    (
        ExchangeWriter {
            shared: shared.clone(),
            doorbell: wake,
            wait: Duration::from_millis(EXCHANGE_WAIT_MS),
        },
        ExchangeReader {
            shared,
            doorbell: ring,
        },
    )
}

impl ExchangeWriter {
    /// Write as much of `data` as fits without wrapping, sleeping while the
    /// ring is full. Returns [`Error::Terminated`] once `cancel` is raised or
    /// the reader is gone.
    pub fn write(&mut self, data: &[u8], cancel: &AtomicBool) -> Result<usize> {
        if data.is_empty() {
            return Ok(0);
        }

        loop {
            if cancel.load(Ordering::Acquire) {
                return Err(Error::Terminated);
            }

            // SAFETY: this handle is the only producer and is not `Clone`
            let written = unsafe { self.shared.buffer.write_shared(data) };
            if written > 0 {
                self.shared
                    .bytes_written
                    .fetch_add(written as u64, Ordering::Relaxed);
                return Ok(written);
            }

            trace!("Exchange full, waiting for the consumer");
            match self.doorbell.recv_timeout(self.wait) {
                Ok(()) | Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(Error::Terminated);
                }
            }
        }
    }

    /// Write all of `data`, retrying short writes.
    pub fn write_all(
        &mut self,
        mut data: &[u8],
        cancel: &AtomicBool,
    ) -> Result<()> {
        while !data.is_empty() {
            let written = self.write(data, cancel)?;
            data = &data[written..];
        }
        Ok(())
    }

    /// Declare end of stream. `total_bits` is the exact number of payload
    /// bits; padding in the last byte is never synthesized.
    pub fn finish(&self, total_bits: u64) {
        self.shared
            .total_bits
            .store(total_bits, Ordering::Relaxed);
        self.shared
            .finished
            .store(true, Ordering::Release);
    }

    pub fn is_finished(&self) -> bool {
        self.shared.finished.load(Ordering::Acquire)
    }

    pub fn bytes_written(&self) -> u64 {
        self.shared
            .bytes_written
            .load(Ordering::Relaxed)
    }
}

impl Drop for ExchangeWriter {
    fn drop(&mut self) {
        // A writer that goes away without finishing still closes the stream
        if !self.is_finished() {
            self.finish(self.bytes_written() * 8);
        }
    }
}

/// Result of a non-blocking pull from the exchange
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pull {
    /// This many bytes were copied
    Data(usize),
    /// Nothing buffered yet, producer still running
    Starved,
    /// Nothing buffered and the producer declared end of stream
    Finished,
}

impl ExchangeReader {
    /// Copy buffered bytes without ever blocking.
    ///
    /// # Timing
    ///
    /// O(1) apart from the copy; no locks, no allocation.
    #[inline]
    pub fn read(&mut self, out: &mut [u8]) -> Pull {
        // Load the flag before reading so late bytes are never mistaken for the end
        let finished = self.shared.finished.load(Ordering::Acquire);

        // SAFETY: this handle is the only consumer and is not `Clone`
        let read = unsafe { self.shared.buffer.read_shared(out) };
        if read > 0 {
            self.shared
                .bytes_read
                .fetch_add(read as u64, Ordering::Relaxed);
            self.ring();
            return Pull::Data(read);
        }

        if finished { Pull::Finished } else { Pull::Starved }
    }

    /// Exact payload length, known once the producer has finished.
    #[inline]
    pub fn total_bits(&self) -> Option<u64> {
        if self.shared.finished.load(Ordering::Acquire) {
            Some(self.shared.total_bits.load(Ordering::Relaxed))
        } else {
            None
        }
    }

    pub fn is_finished(&self) -> bool {
        self.shared.finished.load(Ordering::Acquire)
    }

    pub fn bytes_read(&self) -> u64 {
        self.shared.bytes_read.load(Ordering::Relaxed)
    }

    /// Bytes waiting in the ring
    pub fn buffered(&self) -> usize {
        self.shared.buffer.used()
    }

    #[inline]
    fn ring(&self) {
        // Full: a ring is already pending. Disconnected: no writer to wake.
        let _ = self.doorbell.try_send(());
    }
}
