pub mod lut;
pub mod ook;

pub use ook::{Iq8, OokSynthesizer, StarvePolicy, TxProgress};
