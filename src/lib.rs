//! OOK bitstream synthesis: frame, bruteforce and de Bruijn generators
//! feeding a real-time IQ synthesizer over a bounded exchange.

pub mod config;
pub mod device;
pub mod encoder;
pub mod error;
pub mod reader;
pub mod sequencer;
pub mod stream;
pub mod synth;
pub mod transmission;
pub mod ui;
pub mod utils;

pub use error::{Error, Result};
