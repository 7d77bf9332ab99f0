use std::sync::Arc;

use crate::error::Result;
use crate::stream::{Reader, fill_bits};
use crate::utils::Cursor;

/// Hook run when the last repeat has been emitted. It may swap the frame
/// and call [`FrameReader::reset`] to keep the stream going.
pub type CompleteHook = Box<dyn FnMut(&mut FrameReader) + Send>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameState {
    ReadingFragment,
    ReadingPauses,
    Completed,
}

/// Emits `repetitions` copies of a frame separated by zero-bit pauses.
pub struct FrameReader {
    frame_fragments: Arc<Vec<bool>>,
    pub fragments_cursor: Cursor,
    pub pauses_cursor: Cursor,
    pub repetitions_cursor: Cursor,
    /// Also pause after the last repeat
    pub pause_after_last: bool,
    state: FrameState,
    on_complete: Option<CompleteHook>,
}

impl FrameReader {
    pub fn new(frame_fragments: Arc<Vec<bool>>, repeat: u32, pause: u32) -> Self {
        let mut reader = Self {
            frame_fragments: Arc::new(Vec::new()),
            fragments_cursor: Cursor::default(),
            pauses_cursor: Cursor::new(pause),
            repetitions_cursor: Cursor::new(repeat.max(1)),
            pause_after_last: false,
            state: FrameState::ReadingFragment,
            on_complete: None,
        };
        reader.set_frame_fragments(frame_fragments);
        reader
    }

    /// Replace the frame. Takes effect from the next fragment read.
    pub fn set_frame_fragments(&mut self, frame_fragments: Arc<Vec<bool>>) {
        self.fragments_cursor.total = frame_fragments.len() as u32;
        self.frame_fragments = frame_fragments;
    }

    pub fn frame_fragments(&self) -> &Arc<Vec<bool>> {
        &self.frame_fragments
    }

    pub fn set_on_complete(&mut self, hook: CompleteHook) {
        self.on_complete = Some(hook);
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    /// Rewind every cursor and start again with the first fragment
    pub fn rewind(&mut self) {
        self.fragments_cursor.start_over();
        self.pauses_cursor.start_over();
        self.repetitions_cursor.start_over();
        self.state = FrameState::ReadingFragment;
    }

    fn next_bit(&mut self) -> Option<bool> {
        loop {
            match self.state {
                FrameState::ReadingFragment => {
                    if !self.fragments_cursor.is_done() {
                        let bit = self.frame_fragments
                            [self.fragments_cursor.index as usize];
                        self.fragments_cursor.bump();
                        return Some(bit);
                    }
                    self.finish_fragment();
                }
                FrameState::ReadingPauses => {
                    if !self.pauses_cursor.is_done() {
                        self.pauses_cursor.bump();
                        return Some(false);
                    }
                    self.finish_pauses();
                }
                FrameState::Completed => return None,
            }
        }
    }

    fn finish_fragment(&mut self) {
        self.repetitions_cursor.bump();

        if self.repetitions_cursor.is_done() && !self.pause_after_last {
            self.complete();
            return;
        }

        self.fragments_cursor.start_over();
        self.pauses_cursor.start_over();
        self.state = FrameState::ReadingPauses;
    }

    fn finish_pauses(&mut self) {
        if self.repetitions_cursor.is_done() {
            self.complete();
        } else {
            self.state = FrameState::ReadingFragment;
        }
    }

    fn complete(&mut self) {
        self.state = FrameState::Completed;

        if let Some(mut hook) = self.on_complete.take() {
            hook(self);
            // Keep the hook unless it installed a new one
            if self.on_complete.is_none() {
                self.on_complete = Some(hook);
            }
        }
    }
}

impl Reader for FrameReader {
    fn read(&mut self, buffer: &mut [u8], max_bits: usize) -> Result<usize> {
        fill_bits(buffer, max_bits, || Ok(self.next_bit()))
    }

    fn reset(&mut self) -> Result<()> {
        self.rewind();
        Ok(())
    }

    fn length(&self) -> u64 {
        let frame = self.frame_fragments.len() as u64;
        let repeat = self.repetitions_cursor.total as u64;
        let pause = self.pauses_cursor.total as u64;
        let pauses = if self.pause_after_last {
            repeat
        } else {
            repeat.saturating_sub(1)
        };
        frame * repeat + pause * pauses
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(reader: &mut FrameReader) -> Vec<bool> {
        let mut bits = Vec::new();
        let mut buffer = [0u8; 3];
        loop {
            let n = reader.read(&mut buffer, 24).unwrap();
            if n == 0 {
                return bits;
            }
            bits.extend((0..n).map(|i| crate::stream::bit_at(&buffer, i)));
        }
    }

    #[test]
    fn test_repeats_with_pauses_between() {
        let frame = Arc::new(vec![true, true, false]);
        let mut reader = FrameReader::new(frame, 3, 2);

        let bits = drain(&mut reader);
        let expected = [
            true, true, false, false, false, //
            true, true, false, false, false, //
            true, true, false,
        ];
        assert_eq!(bits, expected);
        assert_eq!(reader.length(), 13);
        assert_eq!(reader.state(), FrameState::Completed);
    }

    #[test]
    fn test_trailing_pause() {
        let mut reader = FrameReader::new(Arc::new(vec![true]), 2, 3);
        reader.pause_after_last = true;
        assert_eq!(drain(&mut reader), [true, false, false, false, true, false, false, false]);
        assert_eq!(reader.length(), 8);
    }

    #[test]
    fn test_completed_stays_silent() {
        let mut reader = FrameReader::new(Arc::new(vec![true]), 1, 0);
        assert_eq!(drain(&mut reader), [true]);
        let mut buffer = [0u8; 1];
        assert_eq!(reader.read(&mut buffer, 8).unwrap(), 0);
        assert_eq!(reader.read(&mut buffer, 8).unwrap(), 0);
    }

    #[test]
    fn test_hook_runs_once_and_can_restart() {
        let mut reader = FrameReader::new(Arc::new(vec![true, false]), 1, 0);
        let mut runs = 0;
        reader.set_on_complete(Box::new(move |reader: &mut FrameReader| {
            runs += 1;
            if runs < 3 {
                reader.set_frame_fragments(Arc::new(vec![false; runs]));
                reader.rewind();
            }
        }));

        assert_eq!(drain(&mut reader), [true, false, false, false, false]);
    }
}
