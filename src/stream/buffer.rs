//! Fixed-capacity byte ring.
//!
//! Reads and writes are "short": a single call never wraps past the end of
//! the storage, so callers retry to move the remainder. Overflow is refused,
//! never dropped.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicUsize, Ordering};

pub struct CircularBuffer {
    data: Box<[UnsafeCell<u8>]>,
    mask: usize,
    /// Total bytes ever written (wraps via mask)
    write_idx: AtomicUsize,
    /// Total bytes ever read (wraps via mask)
    read_idx: AtomicUsize,
}

// SAFETY: the shared-reference accessors are `unsafe` and require one
// producer and one consumer. The producer only touches the free region
// `[write, read + cap)`, the consumer only the used region `[read, write)`,
// and each publishes its index with Release after copying.
unsafe impl Sync for CircularBuffer {}
unsafe impl Send for CircularBuffer {}

impl CircularBuffer {
    /// Create an empty ring. The capacity is rounded up to a power of two.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1).next_power_of_two();
        let data = (0..capacity)
            .map(|_| UnsafeCell::new(0u8))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            data,
            mask: capacity - 1,
            write_idx: AtomicUsize::new(0),
            read_idx: AtomicUsize::new(0),
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.mask + 1
    }

    #[inline]
    pub fn used(&self) -> usize {
        let write = self.write_idx.load(Ordering::Acquire);
        let read = self.read_idx.load(Ordering::Acquire);
        write.wrapping_sub(read)
    }

    #[inline]
    pub fn available(&self) -> usize {
        self.capacity() - self.used()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.used() == self.capacity()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.used() == 0
    }

    /// Copy up to the contiguous free run; returns bytes accepted.
    pub fn write(&mut self, data: &[u8]) -> usize {
        // SAFETY: `&mut self` excludes any concurrent reader or writer
        unsafe { self.write_shared(data) }
    }

    /// Copy up to the contiguous used run; returns bytes delivered.
    pub fn read(&mut self, out: &mut [u8]) -> usize {
        // SAFETY: `&mut self` excludes any concurrent reader or writer
        unsafe { self.read_shared(out) }
    }

    /// Forget all buffered bytes.
    pub fn reset(&mut self) {
        self.write_idx.store(0, Ordering::Release);
        self.read_idx.store(0, Ordering::Release);
    }

    /// Producer side of [`CircularBuffer::write`].
    ///
    /// # Safety
    ///
    /// At most one thread may call this at a time.
    pub(crate) unsafe fn write_shared(&self, data: &[u8]) -> usize {
        let write = self.write_idx.load(Ordering::Relaxed);
        let read = self.read_idx.load(Ordering::Acquire);

        let free = self.capacity() - write.wrapping_sub(read);
        let offset = write & self.mask;
        let run = free.min(self.capacity() - offset).min(data.len());
        if run == 0 {
            return 0;
        }

        // SAFETY: `[offset, offset + run)` lies in the free region, which the
        // consumer does not touch until `write_idx` is published below.
        unsafe {
            let dst = UnsafeCell::raw_get(self.data.as_ptr().add(offset));
            std::ptr::copy_nonoverlapping(data.as_ptr(), dst, run);
        }

        self.write_idx
            .store(write.wrapping_add(run), Ordering::Release);
        run
    }

    /// Consumer side of [`CircularBuffer::read`].
    ///
    /// # Safety
    ///
    /// At most one thread may call this at a time.
    pub(crate) unsafe fn read_shared(&self, out: &mut [u8]) -> usize {
        let read = self.read_idx.load(Ordering::Relaxed);
        let write = self.write_idx.load(Ordering::Acquire);

        let used = write.wrapping_sub(read);
        let offset = read & self.mask;
        let run = used.min(self.capacity() - offset).min(out.len());
        if run == 0 {
            return 0;
        }

        // SAFETY: `[offset, offset + run)` lies in the used region, which the
        // producer does not touch until `read_idx` is published below.
        unsafe {
            let src = UnsafeCell::raw_get(self.data.as_ptr().add(offset));
            std::ptr::copy_nonoverlapping(src, out.as_mut_ptr(), run);
        }

        self.read_idx
            .store(read.wrapping_add(run), Ordering::Release);
        run
    }
}
