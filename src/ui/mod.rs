pub mod progress;

use crate::encoder::EncoderDef;

pub use progress::{TxProgressBar, templates};

pub fn print_banner() {
    println!("ooktx-rs");
}

/// One table row per encoder
pub fn print_encoders(encoders: &[EncoderDef]) {
    println!(
        "{:<10} {:>6} {:>6} {:>7} {:>6}  {}",
        "NAME", "WORD", "REPEAT", "PERIOD", "PAUSE", "FORMAT"
    );
    for def in encoders {
        let vuln = if def.is_debruijn_vulnerable() {
            ""
        } else {
            "  (Not vuln to DeBruijn)"
        };
        println!(
            "{:<10} {:>6} {:>6} {:>7} {:>6}  {}{}",
            def.name,
            def.word_length(),
            def.repeat_min,
            def.pulse_period,
            def.pause_bits,
            def.word_format,
            vuln
        );
    }
}

/// Text waveform of the first `limit` bits, `▔` high and `▁` low
pub fn waveform(bits: &[bool], limit: usize) -> String {
    let shown = &bits[..bits.len().min(limit)];
    let mut line: String = shown
        .iter()
        .map(|&bit| if bit { '▔' } else { '▁' })
        .collect();
    if bits.len() > limit {
        line.push('…');
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_waveform_truncates() {
        assert_eq!(waveform(&[true, false], 8), "▔▁");
        assert_eq!(waveform(&[true, true, false], 2), "▔▔…");
    }
}
