use crate::error::{Error, Result};
use crate::sequencer::DeBruijnSequencer;
use crate::stream::{Reader, fill_bits};
use crate::utils::Cursor;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DebruijnState {
    ReadingBit,
    ReadingSymbolFragment,
    Completed,
}

/// Expands every de Bruijn bit into the "on" or "off" symbol fragment.
pub struct DebruijnReader {
    sequencer: DeBruijnSequencer,
    on_fragment: Vec<bool>,
    off_fragment: Vec<bool>,
    reversed: bool,
    symbol_cursor: Cursor,
    current: bool,
    state: DebruijnState,
}

impl DebruijnReader {
    /// Both fragments must have the same non-zero length.
    pub fn new(
        sequencer: DeBruijnSequencer,
        on_fragment: Vec<bool>,
        off_fragment: Vec<bool>,
        reversed: bool,
    ) -> Result<Self> {
        if on_fragment.len() != off_fragment.len() || on_fragment.is_empty() {
            return Err(Error::FragmentMismatch {
                on: on_fragment.len(),
                off: off_fragment.len(),
            });
        }

        Ok(Self {
            symbol_cursor: Cursor::new(on_fragment.len() as u32),
            sequencer,
            on_fragment,
            off_fragment,
            reversed,
            current: false,
            state: DebruijnState::ReadingBit,
        })
    }

    pub fn state(&self) -> DebruijnState {
        self.state
    }

    pub fn sequencer(&self) -> &DeBruijnSequencer {
        &self.sequencer
    }

    /// Stop the generator and hand it back
    pub fn into_sequencer(mut self) -> DeBruijnSequencer {
        self.sequencer.stop();
        self.sequencer
    }

    fn next_bit(&mut self) -> Result<Option<bool>> {
        loop {
            match self.state {
                DebruijnState::ReadingBit => {
                    let Some(bit) = self.sequencer.read_bit() else {
                        if self.sequencer.consumed() {
                            self.state = DebruijnState::Completed;
                            continue;
                        }
                        return Err(Error::Terminated);
                    };
                    self.current = bit;
                    self.symbol_cursor.start_over();
                    self.state = DebruijnState::ReadingSymbolFragment;
                }
                DebruijnState::ReadingSymbolFragment => {
                    let fragment = if self.current {
                        &self.on_fragment
                    } else {
                        &self.off_fragment
                    };
                    let bit = fragment[self.symbol_cursor.index as usize];
                    self.symbol_cursor.bump();

                    if self.symbol_cursor.is_done() {
                        self.state = if self.sequencer.consumed() {
                            DebruijnState::Completed
                        } else {
                            DebruijnState::ReadingBit
                        };
                    }
                    return Ok(Some(bit ^ self.reversed));
                }
                DebruijnState::Completed => return Ok(None),
            }
        }
    }
}

impl Reader for DebruijnReader {
    fn read(&mut self, buffer: &mut [u8], max_bits: usize) -> Result<usize> {
        fill_bits(buffer, max_bits, || self.next_bit())
    }

    fn reset(&mut self) -> Result<()> {
        self.sequencer.restart()?;
        self.symbol_cursor.start_over();
        self.state = DebruijnState::ReadingBit;
        Ok(())
    }

    fn length(&self) -> u64 {
        self.sequencer.length() * self.on_fragment.len() as u64
    }
}
