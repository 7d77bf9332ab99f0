//! Real-time OOK sample synthesizer
//!
//! Runs inside the audio/RF callback. It drains the exchange one bit at a
//! time and expands every bit into `samples_per_bit` output samples:
//! carrier for a one, silence for a zero.

use serde::{Deserialize, Serialize};

use super::lut::{iq_at, phase_increment};
use crate::stream::{ExchangeReader, Pull, bit_at};
use crate::utils::Cursor;
use crate::utils::consts::SYNTH_LOCAL_BYTES;

/// Signed 8-bit IQ sample
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Iq8 {
    pub re: i8,
    pub im: i8,
}

impl Iq8 {
    pub const ZERO: Self = Self { re: 0, im: 0 };

    pub fn is_silent(&self) -> bool {
        self.re == 0 && self.im == 0
    }

    /// Normalized to [-1.0, 1.0]
    pub fn to_f32(self) -> (f32, f32) {
        (self.re as f32 / 127.0, self.im as f32 / 127.0)
    }
}

/// What a starved synthesizer does while the exchange is empty but the
/// producer has not finished yet
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StarvePolicy {
    /// Emit silence and keep polling
    #[default]
    Silence,
    /// Treat the gap as end of transmission
    End,
}

/// Progress snapshot, produced once per output buffer
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TxProgress {
    /// Bytes pulled out of the exchange so far
    pub bytes: u64,
    /// Bits synthesized so far
    pub bits: u64,
    /// Samples of the last buffer produced before completion
    pub active_samples: usize,
    pub done: bool,
}

pub struct OokSynthesizer {
    exchange: ExchangeReader,
    policy: StarvePolicy,
    /// Samples left for the current bit
    bit_sampling: Cursor,
    /// Position within `local`
    bit_cursor: Cursor,
    local: [u8; SYNTH_LOCAL_BYTES],
    cur_bit: bool,
    phase: u32,
    phase_inc: u32,
    bits_consumed: u64,
    done: bool,
}

impl OokSynthesizer {
    pub fn new(
        exchange: ExchangeReader,
        samples_per_bit: u32,
        carrier_hz: u32,
        sample_rate: u32,
        policy: StarvePolicy,
    ) -> Self {
        let samples_per_bit = samples_per_bit.max(1);
        Self {
            exchange,
            policy,
            bit_sampling: Cursor {
                index: samples_per_bit,
                total: samples_per_bit,
            },
            bit_cursor: Cursor::default(),
            local: [0; SYNTH_LOCAL_BYTES],
            cur_bit: false,
            phase: 0,
            phase_inc: phase_increment(carrier_hz, sample_rate),
            bits_consumed: 0,
            done: false,
        }
    }

    pub fn samples_per_bit(&self) -> u32 {
        self.bit_sampling.total
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn progress(&self) -> TxProgress {
        TxProgress {
            bytes: self.exchange.bytes_read(),
            bits: self.bits_consumed,
            active_samples: 0,
            done: self.done,
        }
    }

    /// Fill `out` and report progress.
    ///
    /// # Timing
    ///
    /// Never blocks. A starved exchange yields silence (or ends the
    /// transmission under [`StarvePolicy::End`]).
    pub fn execute(&mut self, out: &mut [Iq8]) -> TxProgress {
        let end_on_starve = self.policy == StarvePolicy::End;
        let mut active = 0;
        for (i, sample) in out.iter_mut().enumerate() {
            *sample = self.next_sample(end_on_starve).unwrap_or(Iq8::ZERO);
            if !self.done {
                active = i + 1;
            }
        }

        TxProgress {
            active_samples: active,
            ..self.progress()
        }
    }

    /// Fill `out` up to the first sample that would starve.
    ///
    /// Nothing is padded: `active_samples` is the number of samples written
    /// to the front of `out`. Used by sample clocks that can wait for the
    /// feeder, such as offline rendering. The starve policy does not apply.
    pub fn render(&mut self, out: &mut [Iq8]) -> TxProgress {
        let mut produced = 0;
        for sample in out.iter_mut() {
            match self.next_sample(false) {
                Some(iq) => *sample = iq,
                None => break,
            }
            produced += 1;
        }

        TxProgress {
            active_samples: produced,
            ..self.progress()
        }
    }

    /// `None` when done or starved; the bit clock does not advance then.
    #[inline]
    fn next_sample(&mut self, end_on_starve: bool) -> Option<Iq8> {
        if self.done {
            return None;
        }

        if self.bit_sampling.is_done() {
            self.cur_bit = self.next_bit(end_on_starve)?;
            self.bit_sampling.start_over();
        }
        self.bit_sampling.bump();

        let (re, im) = iq_at(self.phase);
        self.phase = self.phase.wrapping_add(self.phase_inc);

        Some(if self.cur_bit { Iq8 { re, im } } else { Iq8::ZERO })
    }

    fn next_bit(&mut self, end_on_starve: bool) -> Option<bool> {
        if let Some(total) = self.exchange.total_bits() {
            if self.bits_consumed >= total {
                self.done = true;
                return None;
            }
        }

        if self.bit_cursor.is_done() && !self.refill(end_on_starve) {
            return None;
        }

        let bit = bit_at(&self.local, self.bit_cursor.index as usize);
        self.bit_cursor.bump();
        self.bits_consumed += 1;
        Some(bit)
    }

    fn refill(&mut self, end_on_starve: bool) -> bool {
        match self.exchange.read(&mut self.local) {
            Pull::Data(bytes) => {
                self.bit_cursor = Cursor::new(bytes as u32 * 8);
                true
            }
            Pull::Starved => {
                if end_on_starve {
                    self.done = true;
                }
                false
            }
            Pull::Finished => {
                self.done = true;
                false
            }
        }
    }
}
