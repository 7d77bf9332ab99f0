use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, bounded, select, unbounded};
use tracing::{debug, info, warn};

use super::bruteforce::{bruteforce_hook, combinations};
use crate::config::TxConfig;
use crate::encoder::{EncoderDef, SymbolField, generate_frame_fragments};
use crate::error::{Error, Result};
use crate::reader::{BitstreamReader, DebruijnReader, FileReader, FrameReader};
use crate::sequencer::DeBruijnSequencer;
use crate::stream::{Reader, StreamReaderThread, stream_exchange};
use crate::synth::{OokSynthesizer, TxProgress};
use crate::utils::consts::PROGRESS_QUEUE_CAPACITY;

pub const STATUS_READY: &str = "Ready";
pub const ERR_STREAMING: &str = "Streaming error";
pub const ERR_OPEN_FILE: &str = "Error opening file.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxMode {
    Idle,
    Manual,
    Bruteforce,
    DeBruijn,
    File,
}

/// Encoder word to transmit in manual or bruteforce mode
#[derive(Clone, Debug)]
pub struct GeneratorSettings {
    pub encoder: EncoderDef,
    pub field: SymbolField,
    pub repeat: u32,
    pub pause: u32,
    pub reversed: bool,
}

impl GeneratorSettings {
    /// Encoder defaults, first word of the symbol space
    pub fn from_encoder(encoder: EncoderDef) -> Self {
        Self {
            field: SymbolField::from_encoder(&encoder),
            repeat: encoder.repeat_min,
            pause: encoder.pause_bits,
            reversed: false,
            encoder,
        }
    }
}

/// What to transmit
#[derive(Clone, Debug)]
pub enum TxSource {
    Manual(GeneratorSettings),
    Bruteforce(GeneratorSettings),
    DeBruijn {
        order: u8,
        on_fragment: Vec<bool>,
        off_fragment: Vec<bool>,
        reversed: bool,
    },
    File(PathBuf),
}

impl TxSource {
    pub fn mode(&self) -> TxMode {
        match self {
            Self::Manual(_) => TxMode::Manual,
            Self::Bruteforce(_) => TxMode::Bruteforce,
            Self::DeBruijn { .. } => TxMode::DeBruijn,
            Self::File(_) => TxMode::File,
        }
    }
}

/// Messages flowing back to the controller
#[derive(Debug)]
pub enum TxEvent {
    /// Snapshot from the output sink, relayed from the progress queue
    Progress(TxProgress),
    /// Sent once by the feeder thread when it ends
    ReaderFinished(Result<u64>),
}

/// Owns one transmission session at a time: the feeder thread on the
/// producing side and the bookkeeping for progress and errors.
pub struct Transmitter {
    config: TxConfig,
    mode: TxMode,
    events_tx: Sender<TxEvent>,
    events_rx: Receiver<TxEvent>,
    /// Bounded so real-time sinks never allocate when reporting
    progress_tx: Sender<TxProgress>,
    progress_rx: Receiver<TxProgress>,
    feeder: Option<StreamReaderThread<BitstreamReader>>,
    sequencer: Option<DeBruijnSequencer>,
    max_bits: u64,
    progress: TxProgress,
    err: Option<String>,
}

impl Transmitter {
    pub fn new(config: TxConfig) -> Self {
        let (events_tx, events_rx) = unbounded();
        let (progress_tx, progress_rx) = bounded(PROGRESS_QUEUE_CAPACITY);
        Self {
            config,
            mode: TxMode::Idle,
            events_tx,
            events_rx,
            progress_tx,
            progress_rx,
            feeder: None,
            sequencer: None,
            max_bits: 0,
            progress: TxProgress::default(),
            err: None,
        }
    }

    pub fn config(&self) -> &TxConfig {
        &self.config
    }

    pub fn mode(&self) -> TxMode {
        self.mode
    }

    /// Bits the session will synthesize, for sizing progress
    pub fn max_bits(&self) -> u64 {
        self.max_bits
    }

    pub fn progress(&self) -> TxProgress {
        self.progress
    }

    pub fn error(&self) -> Option<&str> {
        self.err.as_deref()
    }

    /// Queue for output sinks to report progress on. Sinks use
    /// `try_send` and may drop intermediate snapshots when it is full.
    pub fn progress_sender(&self) -> Sender<TxProgress> {
        self.progress_tx.clone()
    }

    /// Feeder notifications
    pub fn events(&self) -> &Receiver<TxEvent> {
        &self.events_rx
    }

    /// Wait up to `timeout` for the next feeder event or progress snapshot
    /// and apply it. Returns true when the session has ended.
    pub fn poll(&mut self, timeout: Duration) -> bool {
        let event = select! {
            recv(self.events_rx) -> event => event.ok(),
            recv(self.progress_rx) -> progress => progress.ok().map(TxEvent::Progress),
            default(timeout) => None,
        };

        match event {
            Some(event) => self.handle_event(event),
            None => false,
        }
    }

    /// Build the reader for `source`, start the feeder and return the
    /// synthesizer to drive from the real-time side.
    pub fn start(
        &mut self,
        source: TxSource,
        samples_per_bit: u32,
    ) -> Result<OokSynthesizer> {
        if self.mode != TxMode::Idle {
            self.stop();
        }
        // Snapshots left over from the previous session
        while self.progress_rx.try_recv().is_ok() {}
        self.err = None;
        self.progress = TxProgress::default();

        let mode = source.mode();
        let (reader, max_bits) = match self.build_reader(source) {
            Ok(built) => built,
            Err(err) => {
                if mode == TxMode::File {
                    self.err = Some(ERR_OPEN_FILE.to_string());
                }
                return Err(err);
            }
        };

        let (writer, exchange) = stream_exchange(self.config.exchange_capacity);
        let events = self.events_tx.clone();
        let feeder = StreamReaderThread::spawn(
            reader,
            writer,
            self.config.read_block_bytes,
            move |outcome| {
                let _ = events.send(TxEvent::ReaderFinished(outcome));
            },
        )?;

        info!(
            "Transmission started: {:?}, {} bits, {} samples/bit",
            mode, max_bits, samples_per_bit
        );

        self.feeder = Some(feeder);
        self.max_bits = max_bits;
        self.mode = mode;

        Ok(OokSynthesizer::new(
            exchange,
            samples_per_bit,
            self.config.carrier_hz,
            self.config.sample_rate,
            self.config.starve_policy,
        ))
    }

    fn build_reader(&mut self, source: TxSource) -> Result<(BitstreamReader, u64)> {
        match source {
            TxSource::Manual(settings) => {
                let frame = generate_frame_fragments(
                    &settings.encoder,
                    &settings.field,
                    settings.reversed,
                )?;
                let reader =
                    FrameReader::new(Arc::new(frame), settings.repeat, settings.pause);
                let length = reader.length();
                Ok((reader.into(), length))
            }
            TxSource::Bruteforce(settings) => {
                let total = combinations(&settings.field);
                let frame = generate_frame_fragments(
                    &settings.encoder,
                    &settings.field,
                    settings.reversed,
                )?;
                let mut reader =
                    FrameReader::new(Arc::new(frame), settings.repeat, settings.pause);
                reader.pause_after_last = true;
                let length = reader.length() * total as u64;
                reader.set_on_complete(bruteforce_hook(
                    settings.encoder,
                    settings.field,
                    settings.reversed,
                    total,
                ));
                debug!("Bruteforce over {} combinations", total);
                Ok((reader.into(), length))
            }
            TxSource::DeBruijn {
                order,
                on_fragment,
                off_fragment,
                reversed,
            } => {
                let capacity = self.config.sequencer_capacity;
                let mut sequencer = self
                    .sequencer
                    .take()
                    .unwrap_or_else(|| DeBruijnSequencer::new(capacity));

                let same_order = sequencer.order() == order;
                sequencer.init(order)?;
                if same_order {
                    // A kept sequencer may be part way through
                    sequencer.restart()?;
                }

                let reader =
                    DebruijnReader::new(sequencer, on_fragment, off_fragment, reversed)?;
                let length = reader.length();
                Ok((reader.into(), length))
            }
            TxSource::File(path) => {
                let reader = FileReader::open(&path)?;
                let length = reader.length();
                Ok((reader.into(), length))
            }
        }
    }

    /// Apply one event. Returns true when the session has ended.
    pub fn handle_event(&mut self, event: TxEvent) -> bool {
        if self.mode == TxMode::Idle {
            return false;
        }

        match event {
            TxEvent::Progress(progress) => {
                self.progress = progress;
                if progress.done {
                    info!("Transmission complete: {} bits", progress.bits);
                    self.stop();
                    return true;
                }
                false
            }
            TxEvent::ReaderFinished(Ok(bits)) => {
                debug!("Reader done after {} bits, draining", bits);
                false
            }
            TxEvent::ReaderFinished(Err(Error::Terminated)) => false,
            TxEvent::ReaderFinished(Err(err)) => {
                warn!("Transmission aborted: {}", err);
                self.err = Some(ERR_STREAMING.to_string());
                self.stop();
                true
            }
        }
    }

    /// Cancel and join the feeder; the synthesizer sees the stream close.
    pub fn stop(&mut self) {
        if let Some(mut feeder) = self.feeder.take() {
            if let Some(BitstreamReader::DeBruijn(reader)) = feeder.stop() {
                self.sequencer = Some(reader.into_sequencer());
            }
        }

        if self.mode != TxMode::Idle {
            info!("Transmission stopped");
        }
        self.mode = TxMode::Idle;
    }

    /// One-line status for the progress display
    pub fn status_text(&self) -> String {
        if let Some(err) = &self.err {
            return err.clone();
        }
        match self.mode {
            TxMode::Idle => STATUS_READY.to_string(),
            _ => format!(
                "Transmitting ({}/{})",
                self.progress.bits, self.max_bits
            ),
        }
    }

    /// Progress in percent, 0 when the size is unknown
    pub fn percent(&self) -> u32 {
        if self.max_bits == 0 {
            return 0;
        }
        (self.progress.bits.saturating_mul(100) / self.max_bits).min(100) as u32
    }
}

impl Drop for Transmitter {
    fn drop(&mut self) {
        self.stop();
    }
}
