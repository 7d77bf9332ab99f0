pub mod debruijn;

pub use debruijn::{DeBruijnSequencer, generate, preview, target_length};
