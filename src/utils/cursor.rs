/// Repeating position counter shared by every bitstream state machine.
///
/// `total` is assigned by the owner before use; `index` walks from 0 to
/// `total` and is rewound with [`Cursor::start_over`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cursor {
    pub index: u32,
    pub total: u32,
}

impl Cursor {
    pub const fn new(total: u32) -> Self {
        Self { index: 0, total }
    }

    /// Zero both the position and the total
    pub fn reset(&mut self) {
        self.index = 0;
        self.total = 0;
    }

    /// Rewind the position, keep the total
    pub fn start_over(&mut self) {
        self.index = 0;
    }

    pub fn bump(&mut self) {
        self.index = self.index.saturating_add(1);
    }

    pub fn is_last(&self) -> bool {
        self.index.wrapping_add(1) == self.total || self.is_done()
    }

    pub fn is_done(&self) -> bool {
        self.index >= self.total
    }
}
