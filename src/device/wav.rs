//! Offline rendering of the IQ stream to a two-channel WAV file
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{SendTimeoutError, Sender};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::synth::{Iq8, OokSynthesizer, TxProgress};
use crate::utils::consts::EXCHANGE_WAIT_MS;

/// Offline sample clock: runs the synthesizer block by block and writes
/// I to the left channel and Q to the right one.
///
/// The clock stops instead of starving: a short block means the feeder
/// fell behind, and the renderer waits before asking for more, so the file
/// carries no gaps between bits. Returns the number of IQ samples written.
pub fn render_wav(
    path: &Path,
    synth: &mut OokSynthesizer,
    sample_rate: u32,
    block_samples: usize,
    progress_tx: &Sender<TxProgress>,
    cancel: &AtomicBool,
) -> Result<u64> {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .map_err(|err| Error::Device(format!("{err}")))?;

    let mut block = vec![Iq8::ZERO; block_samples.max(1)];
    let mut written = 0u64;

    loop {
        if cancel.load(Ordering::Acquire) {
            warn!("Rendering cancelled after {} samples", written);
            break;
        }

        let progress = synth.render(&mut block);
        let len = progress.active_samples;

        for sample in &block[..len] {
            writer
                .write_sample(sample.re as i16 * 256)
                .map_err(|err| Error::Device(format!("{err}")))?;
            writer
                .write_sample(sample.im as i16 * 256)
                .map_err(|err| Error::Device(format!("{err}")))?;
        }
        written += len as u64;

        if progress.done {
            report_done(progress_tx, progress, cancel);
            break;
        }
        if len > 0 {
            let _ = progress_tx.try_send(progress);
        }
        if len < block.len() {
            thread::sleep(Duration::from_millis(1));
        }
    }

    writer
        .finalize()
        .map_err(|err| Error::Device(format!("{err}")))?;
    info!("Wrote {} IQ samples to {}", written, path.display());
    Ok(written)
}

/// The final snapshot ends the session, so it is retried until taken
fn report_done(progress_tx: &Sender<TxProgress>, progress: TxProgress, cancel: &AtomicBool) {
    let wait = Duration::from_millis(EXCHANGE_WAIT_MS);
    loop {
        match progress_tx.send_timeout(progress, wait) {
            Ok(()) | Err(SendTimeoutError::Disconnected(_)) => return,
            Err(SendTimeoutError::Timeout(_)) => {
                if cancel.load(Ordering::Acquire) {
                    return;
                }
            }
        }
    }
}

/// Render on a dedicated thread
pub fn spawn_wav_renderer(
    path: PathBuf,
    mut synth: OokSynthesizer,
    sample_rate: u32,
    block_samples: usize,
    progress_tx: Sender<TxProgress>,
    cancel: Arc<AtomicBool>,
) -> Result<JoinHandle<Result<u64>>> {
    debug!("Rendering to {}", path.display());
    thread::Builder::new()
        .name("wav-render".into())
        .spawn(move || {
            render_wav(
                &path,
                &mut synth,
                sample_rate,
                block_samples,
                &progress_tx,
                &cancel,
            )
        })
        .map_err(Error::Spawn)
}
