//! Fixed-code remote encoders and frame generation
pub mod builtin;
pub mod symbols;

pub use builtin::builtin_encoders;
pub use symbols::SymbolField;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One encoder chip: word layout, symbol pulse shapes and timing.
///
/// `word_format` holds one character per word position: `A` address
/// symbol, `D` data symbol, `S` sync fragment. `symbol_fragments[i]` is
/// the pulse shape of the i-th symbol of `address_symbols`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderDef {
    pub name: String,
    /// Default repeat count
    pub repeat_min: u32,
    pub word_format: String,
    pub address_symbols: String,
    pub data_symbols: String,
    pub symbol_fragments: Vec<String>,
    #[serde(default)]
    pub sync_fragment: String,
    /// Samples per fragment bit at the OOK sample rate
    pub pulse_period: u32,
    /// Zero bits between repeats
    #[serde(default)]
    pub pause_bits: u32,
}

impl EncoderDef {
    /// Number of symbols in a word, sync excluded
    pub fn word_length(&self) -> usize {
        self.word_format
            .chars()
            .filter(|&c| c != 'S')
            .count()
    }

    pub fn fragment_length(&self) -> usize {
        self.symbol_fragments
            .first()
            .map_or(0, String::len)
    }

    /// Bits in one generated frame
    pub fn frame_length(&self) -> usize {
        let syncs = self
            .word_format
            .chars()
            .filter(|&c| c == 'S')
            .count();
        self.word_length() * self.fragment_length()
            + syncs * self.sync_fragment.len()
    }

    /// Encoders framed by a sync pattern cannot be hit by a raw de Bruijn
    /// sweep.
    pub fn is_debruijn_vulnerable(&self) -> bool {
        !self.word_format.contains('S') || self.sync_fragment.is_empty()
    }

    /// Symbol alphabet of word position `position` (sync excluded)
    pub fn alphabet(&self, position: usize) -> Option<&str> {
        let kind = self
            .word_format
            .chars()
            .filter(|&c| c != 'S')
            .nth(position)?;
        match kind {
            'D' => Some(&self.data_symbols),
            _ => Some(&self.address_symbols),
        }
    }

    fn fragment_row(&self, symbol: char) -> Option<&str> {
        let row = self
            .address_symbols
            .chars()
            .position(|c| c == symbol)
            .or_else(|| {
                self.data_symbols
                    .chars()
                    .position(|c| c == symbol)
            })?;
        self.symbol_fragments
            .get(row)
            .map(String::as_str)
    }

    /// Check the layout and every fragment string.
    pub fn validate(&self) -> Result<()> {
        if let Some(c) = self
            .word_format
            .chars()
            .find(|c| !matches!(c, 'A' | 'D' | 'S'))
        {
            return Err(Error::InvalidFragment(format!(
                "{}: word format character {c:?}",
                self.name
            )));
        }

        let rows = self
            .address_symbols
            .chars()
            .count()
            .max(self.data_symbols.chars().count());
        if self.symbol_fragments.len() < rows {
            return Err(Error::InvalidFragment(format!(
                "{}: {} symbols but {} fragments",
                self.name,
                rows,
                self.symbol_fragments.len()
            )));
        }

        let expected = self.fragment_length();
        for fragment in &self.symbol_fragments {
            let bits = parse_fragment(fragment)?;
            if bits.len() != expected {
                return Err(Error::FragmentMismatch {
                    on: expected,
                    off: bits.len(),
                });
            }
        }
        parse_fragment(&self.sync_fragment)?;

        Ok(())
    }
}

/// Parse a `"1000"` style pulse shape
pub fn parse_fragment(fragment: &str) -> Result<Vec<bool>> {
    fragment
        .chars()
        .map(|c| match c {
            '0' => Ok(false),
            '1' => Ok(true),
            _ => Err(Error::InvalidFragment(fragment.to_string())),
        })
        .collect()
}

/// Render bits as a `"1000"` style string
pub fn format_fragment(bits: &[bool]) -> String {
    bits.iter()
        .map(|&bit| if bit { '1' } else { '0' })
        .collect()
}

/// Find an encoder by name, ignoring case
pub fn find<'a>(encoders: &'a [EncoderDef], name: &str) -> Result<&'a EncoderDef> {
    encoders
        .iter()
        .find(|def| def.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| Error::UnknownEncoder(name.to_string()))
}

/// Concatenate the pulse shapes of one word.
///
/// `S` positions emit the sync fragment, `A`/`D` positions the fragment of
/// the symbol currently selected in `field`. With `reversed` every pulse
/// level is inverted.
pub fn generate_frame_fragments(
    def: &EncoderDef,
    field: &SymbolField,
    reversed: bool,
) -> Result<Vec<bool>> {
    let mut fragments = Vec::with_capacity(def.frame_length());
    let mut position = 0;

    for kind in def.word_format.chars() {
        let shape = if kind == 'S' {
            def.sync_fragment.as_str()
        } else {
            let symbol = field
                .symbol(position)
                .ok_or(Error::InvalidSymbol { position, symbol: kind })?;
            let row = def
                .fragment_row(symbol)
                .ok_or(Error::InvalidSymbol { position, symbol })?;
            position += 1;
            row
        };

        for bit in parse_fragment(shape)? {
            fragments.push(bit ^ reversed);
        }
    }

    Ok(fragments)
}
