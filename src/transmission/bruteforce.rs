use std::sync::Arc;

use tracing::{debug, error};

use crate::encoder::{EncoderDef, SymbolField, generate_frame_fragments};
use crate::reader::{CompleteHook, FrameReader};
use crate::utils::Cursor;

/// Completion hook that walks every combination of `field`.
///
/// The frame already loaded in the reader counts as the first combination.
/// Each call moves to the next word and rewinds the reader; the call after
/// the last of `total` combinations leaves the reader completed, so the
/// hook runs exactly `total` times.
pub fn bruteforce_hook(
    def: EncoderDef,
    mut field: SymbolField,
    reversed: bool,
    total: u32,
) -> CompleteHook {
    let mut cursor = Cursor::new(total);

    Box::new(move |reader: &mut FrameReader| {
        cursor.bump();
        if cursor.is_done() {
            debug!("Bruteforce exhausted after {} combinations", cursor.total);
            return;
        }

        field.set_next_possibility();
        match generate_frame_fragments(&def, &field, reversed) {
            Ok(frame) => {
                reader.set_frame_fragments(Arc::new(frame));
                reader.rewind();
            }
            Err(err) => error!("Bruteforce frame generation failed: {}", err),
        }
    })
}

/// Combination count as a cursor total
pub fn combinations(field: &SymbolField) -> u32 {
    field
        .possibilities_count()
        .min(u32::MAX as u64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::Reader;

    fn toy_encoder() -> EncoderDef {
        EncoderDef {
            name: "toy".into(),
            repeat_min: 1,
            word_format: "AA".into(),
            address_symbols: "01".into(),
            data_symbols: "01".into(),
            symbol_fragments: vec!["10".into(), "11".into()],
            sync_fragment: String::new(),
            pulse_period: 1,
            pause_bits: 0,
        }
    }

    #[test]
    fn test_walks_every_combination_once() {
        let def = toy_encoder();
        let field = SymbolField::from_encoder(&def);
        let total = combinations(&field);
        assert_eq!(total, 4);

        let frame = generate_frame_fragments(&def, &field, false).unwrap();
        let mut reader = FrameReader::new(Arc::new(frame), 1, 1);
        reader.pause_after_last = true;
        let per_frame = reader.length();
        reader.set_on_complete(bruteforce_hook(def, field, false, total));

        let mut buffer = [0u8; 64];
        let bits = reader.read(&mut buffer, 512).unwrap();
        assert_eq!(bits as u64, per_frame * total as u64);

        let text: String = (0..bits)
            .map(|i| if crate::stream::bit_at(&buffer, i) { '1' } else { '0' })
            .collect();
        assert_eq!(text, ["10100", "10110", "11100", "11110"].concat());
    }
}
