use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::utils::consts::{DE_BRUIJN_BUFFER_SIZE, DE_BRUIJN_MAX_ORDER};

/// Bits in the binary de Bruijn sequence of `order`, including the
/// `order - 1` wrap-around bits appended at the end.
pub const fn target_length(order: u8) -> u64 {
    (1u64 << order) + order as u64 - 1
}

fn check_order(order: u8) -> Result<()> {
    if order == 0 || order > DE_BRUIJN_MAX_ORDER {
        return Err(Error::InvalidOrder(order));
    }
    Ok(())
}

/// Necklace recursion state for radix 2
struct Necklace<'a, F> {
    order: usize,
    a: [u8; DE_BRUIJN_MAX_ORDER as usize + 1],
    prefix: Vec<bool>,
    cancel: &'a AtomicBool,
    sink: F,
}

impl<F> Necklace<'_, F>
where
    F: FnMut(bool) -> ControlFlow<()>,
{
    fn db(&mut self, t: usize, p: usize) -> ControlFlow<()> {
        if self.cancel.load(Ordering::Relaxed) {
            return ControlFlow::Break(());
        }

        if t > self.order {
            if self.order % p == 0 {
                for i in 1..=p {
                    self.emit(self.a[i] != 0)?;
                }
            }
            return ControlFlow::Continue(());
        }

        self.a[t] = self.a[t - p];
        self.db(t + 1, p)?;

        if self.a[t - p] == 0 {
            self.a[t] = 1;
            self.db(t + 1, t)?;
        }

        ControlFlow::Continue(())
    }

    #[inline]
    fn emit(&mut self, bit: bool) -> ControlFlow<()> {
        if self.prefix.len() < self.order - 1 {
            self.prefix.push(bit);
        }
        (self.sink)(bit)
    }
}

/// Generate the lexicographically smallest binary de Bruijn sequence of
/// `order`, followed by its first `order - 1` bits.
///
/// Nothing is buffered beyond the recursion stack, so the sequence is
/// streamed straight into `sink`. Returns [`Error::Terminated`] when
/// `cancel` is raised or `sink` breaks.
pub fn generate<F>(order: u8, cancel: &AtomicBool, sink: F) -> Result<()>
where
    F: FnMut(bool) -> ControlFlow<()>,
{
    check_order(order)?;

    let mut necklace = Necklace {
        order: order as usize,
        a: [0; DE_BRUIJN_MAX_ORDER as usize + 1],
        prefix: Vec::with_capacity(order as usize),
        cancel,
        sink,
    };

    if necklace.db(1, 1).is_break() {
        return Err(Error::Terminated);
    }

    let prefix = std::mem::take(&mut necklace.prefix);
    for bit in prefix {
        if (necklace.sink)(bit).is_break() {
            return Err(Error::Terminated);
        }
    }

    Ok(())
}

/// First `count` bits of the sequence, computed on the calling thread
pub fn preview(order: u8, count: usize) -> Result<Vec<bool>> {
    check_order(order)?;
    let mut bits = Vec::with_capacity(count);
    if count == 0 {
        return Ok(bits);
    }

    let cancel = AtomicBool::new(false);
    let outcome = generate(order, &cancel, |bit| {
        bits.push(bit);
        if bits.len() >= count {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    });

    match outcome {
        Ok(()) | Err(Error::Terminated) => Ok(bits),
        Err(err) => Err(err),
    }
}

/// Background de Bruijn generator feeding a bounded FIFO.
///
/// The worker blocks on `send` while the FIFO is full and the consumer
/// blocks on `recv` while it is empty. [`DeBruijnSequencer::stop`] raises
/// the cancel flag and drops the receiving end, which wakes a blocked
/// worker, then joins it.
pub struct DeBruijnSequencer {
    order: u8,
    capacity: usize,
    target_length: u64,
    consumed_length: u64,
    bits: Option<Receiver<bool>>,
    cancel: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl DeBruijnSequencer {
    pub fn new(capacity: usize) -> Self {
        Self {
            order: 0,
            capacity: capacity.max(1),
            target_length: 0,
            consumed_length: 0,
            bits: None,
            cancel: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    /// (Re)start generation for `order`. Calling it again with the order of
    /// a sequence that is still being read does nothing.
    pub fn init(&mut self, order: u8) -> Result<u64> {
        check_order(order)?;

        if order == self.order && self.is_live() {
            return Ok(self.target_length);
        }

        self.stop();
        self.order = order;
        self.target_length = target_length(order);
        self.spawn()?;

        info!(
            "De Bruijn sequencer started: order {}, {} bits",
            order, self.target_length
        );
        Ok(self.target_length)
    }

    /// Restart the current order from its first bit
    pub fn restart(&mut self) -> Result<()> {
        if self.order == 0 {
            return Err(Error::InvalidOrder(0));
        }
        self.stop();
        self.spawn()
    }

    /// Pop the next bit, blocking while the worker catches up.
    ///
    /// `None` once the whole sequence has been read, or if the worker was
    /// stopped before producing it.
    pub fn read_bit(&mut self) -> Option<bool> {
        if self.consumed() {
            return None;
        }
        let bit = self.bits.as_ref()?.recv().ok()?;
        self.consumed_length += 1;
        Some(bit)
    }

    /// Non-blocking [`Self::read_bit`]
    pub fn try_read_bit(&mut self) -> Option<bool> {
        if self.consumed() {
            return None;
        }
        let bit = self.bits.as_ref()?.try_recv().ok()?;
        self.consumed_length += 1;
        Some(bit)
    }

    /// Unread bits remain and the worker can still deliver all of them
    fn is_live(&self) -> bool {
        let Some(handle) = &self.handle else {
            return false;
        };
        if self.consumed() {
            return false;
        }
        !handle.is_finished()
            || self.consumed_length + self.buffered() as u64 >= self.target_length
    }

    /// True once every bit of the sequence has been popped
    pub fn consumed(&self) -> bool {
        self.target_length > 0 && self.consumed_length >= self.target_length
    }

    pub fn length(&self) -> u64 {
        self.target_length
    }

    pub fn order(&self) -> u8 {
        self.order
    }

    pub fn consumed_length(&self) -> u64 {
        self.consumed_length
    }

    /// Bits waiting in the FIFO
    pub fn buffered(&self) -> usize {
        self.bits
            .as_ref()
            .map_or(0, Receiver::len)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Cancel and join the worker. The order is kept so the sequencer can
    /// be restarted.
    pub fn stop(&mut self) {
        self.cancel.store(true, Ordering::Release);
        self.bits = None;

        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("De Bruijn worker panicked");
            }
            debug!("De Bruijn worker joined");
        }

        self.consumed_length = 0;
    }

    fn spawn(&mut self) -> Result<()> {
        let (tx, rx) = crossbeam_channel::bounded(self.capacity);
        let cancel = Arc::new(AtomicBool::new(false));
        let flag = cancel.clone();
        let order = self.order;

        let handle = thread::Builder::new()
            .name("debruijn".into())
            .spawn(move || run(order, &flag, tx))
            .map_err(Error::Spawn)?;

        self.bits = Some(rx);
        self.cancel = cancel;
        self.handle = Some(handle);
        self.consumed_length = 0;
        Ok(())
    }
}

impl Default for DeBruijnSequencer {
    fn default() -> Self {
        Self::new(DE_BRUIJN_BUFFER_SIZE)
    }
}

impl Drop for DeBruijnSequencer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(order: u8, cancel: &AtomicBool, tx: Sender<bool>) {
    let outcome = generate(order, cancel, |bit| match tx.send(bit) {
        Ok(()) => ControlFlow::Continue(()),
        Err(_) => ControlFlow::Break(()),
    });

    match outcome {
        Ok(()) => debug!("De Bruijn order {} generated", order),
        Err(Error::Terminated) => debug!("De Bruijn order {} cancelled", order),
        Err(err) => warn!("De Bruijn generation failed: {}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn collect(order: u8) -> Vec<bool> {
        let cancel = AtomicBool::new(false);
        let mut bits = Vec::new();
        generate(order, &cancel, |bit| {
            bits.push(bit);
            ControlFlow::Continue(())
        })
        .unwrap();
        bits
    }

    fn to_string(bits: &[bool]) -> String {
        bits.iter()
            .map(|&b| if b { '1' } else { '0' })
            .collect()
    }

    #[test]
    fn test_known_sequences() {
        assert_eq!(to_string(&collect(1)), "01");
        assert_eq!(to_string(&collect(2)), "00110");
        assert_eq!(to_string(&collect(3)), "0001011100");
        assert_eq!(to_string(&collect(4)), "0000100110101111000");
    }

    #[test]
    fn test_every_window_once() {
        for order in 1..=12u8 {
            let bits = collect(order);
            assert_eq!(bits.len() as u64, target_length(order));

            let n = order as usize;
            let mut seen = HashSet::new();
            for window in bits.windows(n) {
                let value = window
                    .iter()
                    .fold(0u32, |acc, &b| (acc << 1) | b as u32);
                assert!(seen.insert(value), "order {order}: {value} repeated");
            }
            assert_eq!(seen.len(), 1 << n);
        }
    }

    #[test]
    fn test_invalid_orders() {
        let cancel = AtomicBool::new(false);
        assert!(matches!(
            generate(0, &cancel, |_| ControlFlow::Continue(())),
            Err(Error::InvalidOrder(0))
        ));
        assert!(matches!(
            DeBruijnSequencer::default().init(33),
            Err(Error::InvalidOrder(33))
        ));
    }

    #[test]
    fn test_preview_prefix() {
        let full = collect(6);
        let head = preview(6, 16).unwrap();
        assert_eq!(head, &full[..16]);
        assert_eq!(preview(2, 64).unwrap(), collect(2));
    }

    #[test]
    fn test_cancel_mid_recursion() {
        let cancel = AtomicBool::new(false);
        let mut count = 0;
        let outcome = generate(20, &cancel, |_| {
            count += 1;
            if count == 100 {
                cancel.store(true, Ordering::Relaxed);
            }
            ControlFlow::Continue(())
        });
        assert!(matches!(outcome, Err(Error::Terminated)));
        assert!(count < 200);
    }

    fn wait_buffered(sequencer: &DeBruijnSequencer, count: usize) {
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        while sequencer.buffered() < count {
            assert!(std::time::Instant::now() < deadline, "worker stalled");
            thread::yield_now();
        }
    }

    #[test]
    fn test_try_read_bit_on_empty_fifo() {
        let (tx, rx) = crossbeam_channel::bounded(4);
        let (step_tx, step_rx) = crossbeam_channel::unbounded::<bool>();
        // Stand-in worker that only produces a bit when told to
        let handle = thread::spawn(move || {
            for bit in step_rx {
                if tx.send(bit).is_err() {
                    return;
                }
            }
        });

        let mut sequencer = DeBruijnSequencer {
            order: 2,
            capacity: 4,
            target_length: target_length(2),
            consumed_length: 0,
            bits: Some(rx),
            cancel: Arc::new(AtomicBool::new(false)),
            handle: Some(handle),
        };

        assert_eq!(sequencer.try_read_bit(), None);
        assert_eq!(sequencer.try_read_bit(), None);
        assert_eq!(sequencer.consumed_length(), 0);

        step_tx.send(true).unwrap();
        wait_buffered(&sequencer, 1);
        assert_eq!(sequencer.try_read_bit(), Some(true));
        assert_eq!(sequencer.consumed_length(), 1);
        assert_eq!(sequencer.try_read_bit(), None);
        assert_eq!(sequencer.consumed_length(), 1);

        step_tx.send(false).unwrap();
        step_tx.send(true).unwrap();
        wait_buffered(&sequencer, 2);
        assert_eq!(sequencer.try_read_bit(), Some(false));
        assert_eq!(sequencer.try_read_bit(), Some(true));
        assert_eq!(sequencer.consumed_length(), 3);

        drop(step_tx);
        sequencer.stop();
    }
}
