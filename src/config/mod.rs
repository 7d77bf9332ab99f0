//! Transmission settings, loadable from JSON
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::encoder::{EncoderDef, builtin_encoders};
use crate::error::Result;
use crate::synth::StarvePolicy;
use crate::utils::consts::{
    DE_BRUIJN_BUFFER_SIZE, EXCHANGE_CAPACITY, OOK_CARRIER_HZ,
    OOK_SAMPLE_RATE, OUTPUT_BLOCK_SAMPLES, READ_BLOCK_BYTES,
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TxConfig {
    pub sample_rate: u32,
    pub carrier_hz: u32,
    /// Bytes in the feeder -> synthesizer ring
    pub exchange_capacity: usize,
    /// Bits buffered ahead by the de Bruijn worker
    pub sequencer_capacity: usize,
    /// Block size the feeder pulls from a reader
    pub read_block_bytes: usize,
    /// Samples per synthesizer call in offline rendering
    pub output_block_samples: usize,
    pub starve_policy: StarvePolicy,
    /// Extra encoders, merged after the built-in table
    pub encoders: Vec<EncoderDef>,
}

impl Default for TxConfig {
    fn default() -> Self {
        Self {
            sample_rate: OOK_SAMPLE_RATE,
            carrier_hz: OOK_CARRIER_HZ,
            exchange_capacity: EXCHANGE_CAPACITY,
            sequencer_capacity: DE_BRUIJN_BUFFER_SIZE,
            read_block_bytes: READ_BLOCK_BYTES,
            output_block_samples: OUTPUT_BLOCK_SAMPLES,
            starve_policy: StarvePolicy::default(),
            encoders: Vec::new(),
        }
    }
}

impl TxConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        for def in &config.encoders {
            def.validate()?;
        }
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json(&text)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Built-in encoders followed by the configured ones. A configured
    /// encoder replaces a built-in one of the same name.
    pub fn encoder_library(&self) -> Vec<EncoderDef> {
        let mut library = builtin_encoders();
        for def in &self.encoders {
            match library
                .iter_mut()
                .find(|d| d.name.eq_ignore_ascii_case(&def.name))
            {
                Some(existing) => {
                    debug!("Overriding encoder {}", def.name);
                    *existing = def.clone();
                }
                None => library.push(def.clone()),
            }
        }
        library
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config = TxConfig::from_json(r#"{ "carrier_hz": 1000 }"#).unwrap();
        assert_eq!(config.carrier_hz, 1000);
        assert_eq!(config.sample_rate, OOK_SAMPLE_RATE);
        assert_eq!(config.starve_policy, StarvePolicy::Silence);
    }

    #[test]
    fn test_starve_policy_lowercase() {
        let config =
            TxConfig::from_json(r#"{ "starve_policy": "end" }"#).unwrap();
        assert_eq!(config.starve_policy, StarvePolicy::End);
    }

    #[test]
    fn test_custom_encoder_merged() {
        let json = r#"{
            "encoders": [{
                "name": "Gate",
                "repeat_min": 3,
                "word_format": "AAAA",
                "address_symbols": "01",
                "data_symbols": "01",
                "symbol_fragments": ["100", "110"],
                "pulse_period": 20
            }]
        }"#;
        let config = TxConfig::from_json(json).unwrap();
        let library = config.encoder_library();
        assert_eq!(library.len(), builtin_encoders().len() + 1);
        let gate = crate::encoder::find(&library, "gate").unwrap();
        assert_eq!(gate.pause_bits, 0);
        assert!(gate.sync_fragment.is_empty());
    }

    #[test]
    fn test_bad_fragment_rejected() {
        let json = r#"{
            "encoders": [{
                "name": "Bad",
                "repeat_min": 1,
                "word_format": "A",
                "address_symbols": "01",
                "data_symbols": "01",
                "symbol_fragments": ["1z", "10"],
                "pulse_period": 1
            }]
        }"#;
        assert!(matches!(
            TxConfig::from_json(json),
            Err(Error::InvalidFragment(_))
        ));
    }
}
