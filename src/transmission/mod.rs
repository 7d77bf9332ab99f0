/// Transmission control: session lifecycle, modes and events
pub mod bruteforce;
pub mod transmitter;

pub use bruteforce::{bruteforce_hook, combinations};
pub use transmitter::*;
