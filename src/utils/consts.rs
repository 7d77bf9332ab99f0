/// 日志级别（可被 RUST_LOG 覆盖）
pub const LOG_LEVEL: &str = "info";

/// JACK 客户端名称
pub const JACK_CLIENT_NAME: &str = "ooktx";

/// I channel output port
pub const OUTPUT_I_PORT_NAME: &str = "ook_i";

/// Q channel output port
pub const OUTPUT_Q_PORT_NAME: &str = "ook_q";

/// 进度更新间隔（毫秒）
pub const PROGRESS_UPDATE_INTERVAL_MS: u64 = 50;

/// Progress snapshots queued from an output sink to the controller
pub const PROGRESS_QUEUE_CAPACITY: usize = 16;

// ============================================================================
// Baseband Parameters
// ============================================================================

/// Baseband sample rate (Hz) used when rendering offline
pub const OOK_SAMPLE_RATE: u32 = 2_280_000;

/// Carrier offset from the tuned frequency (Hz)
pub const OOK_CARRIER_HZ: u32 = 70_000;

/// Carrier used for audible playback through JACK (Hz)
pub const JACK_CARRIER_HZ: u32 = 1_000;

/// Samples handled per synthesizer call in the offline renderer
pub const OUTPUT_BLOCK_SAMPLES: usize = 2048;

/// Local bit buffer of the synthesizer (bytes)
pub const SYNTH_LOCAL_BYTES: usize = 32;

// ============================================================================
// Stream Parameters
// ============================================================================

/// Capacity of the application -> synthesizer byte ring
pub const EXCHANGE_CAPACITY: usize = 512;

/// Bytes pulled from a reader per feeder iteration
pub const READ_BLOCK_BYTES: usize = 128;

/// Bounded wait of the feeder on a full exchange before re-checking cancellation
pub const EXCHANGE_WAIT_MS: u64 = 50;

/// De Bruijn generator FIFO capacity (bits)
pub const DE_BRUIJN_BUFFER_SIZE: usize = 64;

/// Bits of the de Bruijn sequence kept for waveform previews
pub const DE_BRUIJN_PREVIEW_BITS: usize = 64;

/// Largest supported de Bruijn order
pub const DE_BRUIJN_MAX_ORDER: u8 = 32;

/// Frame fragments drawn by the waveform preview
pub const WAVEFORM_PREVIEW_BITS: usize = 550;
