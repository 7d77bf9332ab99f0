use super::EncoderDef;

/// Leading one followed by `zeros` zero bits
fn mark_then_space(zeros: usize) -> String {
    format!("1{}", "0".repeat(zeros))
}

/// `zeros` zero bits followed by `tail`
fn space_then(zeros: usize, tail: &str) -> String {
    format!("{}{tail}", "0".repeat(zeros))
}

#[allow(clippy::too_many_arguments)]
fn def(
    name: &str,
    repeat_min: u32,
    word_format: &str,
    address_symbols: &str,
    data_symbols: &str,
    symbol_fragments: &[&str],
    sync_fragment: String,
    pulse_period: u32,
    pause_bits: u32,
) -> EncoderDef {
    EncoderDef {
        name: name.to_string(),
        repeat_min,
        word_format: word_format.to_string(),
        address_symbols: address_symbols.to_string(),
        data_symbols: data_symbols.to_string(),
        symbol_fragments: symbol_fragments
            .iter()
            .map(|s| s.to_string())
            .collect(),
        sync_fragment,
        pulse_period,
        pause_bits,
    }
}

/// Encoders known out of the box
pub fn builtin_encoders() -> Vec<EncoderDef> {
    vec![
        def("8-bits", 50, "AAAAAAAA", "01", "01", &["1000", "1110"], String::new(), 8, 0),
        def(
            "16-bits",
            50,
            "AAAAAAAAAAAAAAAA",
            "01",
            "01",
            &["1000", "1110"],
            String::new(),
            8,
            0,
        ),
        def(
            "Doorbell",
            32,
            "AAAAAAAAAAAAAAAAAAAAAAAA",
            "01",
            "01",
            &["1000", "1110"],
            String::new(),
            57,
            32 * 4,
        ),
        def(
            "OH200DC",
            8,
            "AAAAAAAA",
            "01",
            "01",
            &["11110000", "10000000"],
            String::new(),
            115,
            70 * 8,
        ),
        def(
            "2260-R2",
            2,
            "AAAAAAAAAADDS",
            "01F",
            "01",
            &["10001000", "11101110", "10001110"],
            mark_then_space(31),
            128,
            0,
        ),
        def(
            "2260-R4",
            2,
            "AAAAAAAADDDDS",
            "01F",
            "01",
            &["10010000", "11101110", "10001110"],
            mark_then_space(31),
            128,
            0,
        ),
        def(
            "2262",
            4,
            "AAAAAAAAAAAAS",
            "01F",
            "01F",
            &["10001000", "11101110", "10001110"],
            mark_then_space(31),
            4,
            0,
        ),
        def(
            "16-bit",
            50,
            "AAAAAAAAAAAAAAAAS",
            "01",
            "01",
            &["1110", "1000"],
            mark_then_space(20),
            8,
            0,
        ),
        def(
            "1527",
            4,
            "SAAAAAAAAAAAAAAAAAAAADDDD",
            "01",
            "01",
            &["1000", "1110"],
            mark_then_space(31),
            32,
            10 * 4,
        ),
        def("526E", 4, "AAAAAAAAAAAA", "01", "01", &["110", "100"], String::new(), 8, 10 * 3),
        def(
            "12E",
            4,
            "SAAAAAAAADDDD",
            "01",
            "01",
            &["011", "001"],
            space_then(36, "1"),
            1,
            10 * 3,
        ),
        def(
            "5026",
            4,
            "SAAAAAAAAAAAA",
            "0123",
            "0123",
            &[
                "1000000010000000",
                "1111111011111110",
                "1111111010000000",
                "1000000011111110",
            ],
            space_then(47, "1"),
            8,
            10 * 16,
        ),
        def(
            "UM3750",
            4,
            "SAAAAAAAAAAAA",
            "01",
            "01",
            &["011", "001"],
            "001".to_string(),
            32,
            ((3 * 12) - 6) * 3,
        ),
        def(
            "UM3758",
            4,
            "SAAAAAAAAAADDDDDDDD",
            "01F",
            "01",
            &["011011", "001001", "011001"],
            "1".to_string(),
            16,
            10,
        ),
        def(
            "BA5104",
            4,
            "SDDAAAAAAA",
            "01",
            "01",
            &["1000", "1110"],
            String::new(),
            768,
            10 * 4,
        ),
        def(
            "145026",
            2,
            "SAAAAADDDD",
            "01F",
            "01",
            &[
                "0111111101111111",
                "0100000001000000",
                "0111111101000000",
            ],
            space_then(18, ""),
            1,
            2 * 16,
        ),
        def(
            "HT6***",
            3,
            "SAAAAAAAAAAAADDDDDD",
            "01F",
            "01",
            &["011011", "001001", "001011"],
            space_then(36, "1011001011001"),
            33,
            10 * 6,
        ),
        def(
            "TC9148",
            3,
            "AAAAAAAAAAAA",
            "01",
            "01",
            &["1000", "1110"],
            String::new(),
            12,
            10 * 4,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_lengths() {
        let all = builtin_encoders();
        let sync_len = |name: &str| {
            all.iter()
                .find(|d| d.name == name)
                .map(|d| d.sync_fragment.len())
                .unwrap()
        };
        assert_eq!(sync_len("2262"), 32);
        assert_eq!(sync_len("16-bit"), 21);
        assert_eq!(sync_len("12E"), 37);
        assert_eq!(sync_len("5026"), 48);
        assert_eq!(sync_len("145026"), 18);
        assert_eq!(sync_len("HT6***"), 49);
    }

    #[test]
    fn test_names_are_unique() {
        let all = builtin_encoders();
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert!(!a.name.eq_ignore_ascii_case(&b.name));
            }
        }
    }
}
