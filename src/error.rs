use std::io;

/// Errors surfaced by the bitstream pipeline and its collaborators.
///
/// End of stream is not an error: readers signal it by producing zero bits.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("read error: {0}")]
    Read(#[from] io::Error),

    #[error("stream terminated before completion")]
    Terminated,

    #[error("invalid de Bruijn order {0} (expected 1..=32)")]
    InvalidOrder(u8),

    #[error("on/off symbol fragments differ in length ({on} vs {off})")]
    FragmentMismatch { on: usize, off: usize },

    #[error("invalid bit fragment: {0:?}")]
    InvalidFragment(String),

    #[error("unknown encoder: {0}")]
    UnknownEncoder(String),

    #[error("symbol {symbol:?} not allowed at position {position}")]
    InvalidSymbol { position: usize, symbol: char },

    #[error("word has {actual} symbols, expected {expected}")]
    WordLength { expected: usize, actual: usize },

    #[error("failed to spawn worker: {0}")]
    Spawn(io::Error),

    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("device error: {0}")]
    Device(String),
}

pub type Result<T> = std::result::Result<T, Error>;
