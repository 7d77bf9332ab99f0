use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tracing::{error, info, warn};

use ooktx_rs::config::TxConfig;
use ooktx_rs::device::jack::{
    build_process_closure, connect_system_playback, open_client,
    print_jack_info, register_outputs,
};
use ooktx_rs::device::wav::spawn_wav_renderer;
use ooktx_rs::encoder::{
    self, EncoderDef, format_fragment, generate_frame_fragments,
    parse_fragment,
};
use ooktx_rs::error::{Error, Result};
use ooktx_rs::sequencer;
use ooktx_rs::synth::StarvePolicy;
use ooktx_rs::transmission::{GeneratorSettings, Transmitter, TxSource};
use ooktx_rs::ui::{TxProgressBar, print_banner, print_encoders, waveform};
use ooktx_rs::utils::consts::*;
use ooktx_rs::utils::logging::init_logging;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Render IQ to this WAV file instead of playing through JACK
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,
    /// End the transmission when the feeder falls behind
    #[arg(long, global = true)]
    starve_end: bool,
    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the known encoders
    Encoders,
    /// Repeat one word of an encoder
    Manual(GeneratorArgs),
    /// Walk every word of an encoder
    Bruteforce(GeneratorArgs),
    /// Sweep a de Bruijn sequence
    Debruijn {
        #[arg(short = 'n', long, default_value_t = 8)]
        order: u8,
        /// Pulse shape of a one bit
        #[arg(long, default_value = "1")]
        on: String,
        /// Pulse shape of a zero bit
        #[arg(long, default_value = "0")]
        off: String,
        #[arg(long)]
        reversed: bool,
        #[arg(long, default_value_t = 256)]
        period: u32,
        /// Warn if this encoder cannot be hit by the sweep
        #[arg(short, long)]
        encoder: Option<String>,
    },
    /// Transmit a raw bitstream file
    File {
        path: PathBuf,
        #[arg(long, default_value_t = 8)]
        period: u32,
    },
}

#[derive(Args)]
struct GeneratorArgs {
    #[arg(short, long)]
    encoder: String,
    /// Word such as "0F01..."; the first word when omitted
    #[arg(short, long)]
    word: Option<String>,
    #[arg(short, long)]
    repeat: Option<u32>,
    #[arg(short, long)]
    pause: Option<u32>,
    /// Samples per fragment bit
    #[arg(long)]
    period: Option<u32>,
    #[arg(long)]
    reversed: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    print_banner();

    if let Err(err) = run(cli) {
        error!("{}", err);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => TxConfig::load(path)?,
        None => TxConfig::default(),
    };
    if cli.starve_end {
        config.starve_policy = StarvePolicy::End;
    }
    let library = config.encoder_library();

    let (source, samples_per_bit) = match cli.command {
        Commands::Encoders => {
            print_encoders(&library);
            return Ok(());
        }
        Commands::Manual(args) => {
            let settings = generator_settings(&library, &args)?;
            let period = args.period.unwrap_or(settings.encoder.pulse_period);
            (TxSource::Manual(settings), period)
        }
        Commands::Bruteforce(args) => {
            let settings = generator_settings(&library, &args)?;
            let period = args.period.unwrap_or(settings.encoder.pulse_period);
            (TxSource::Bruteforce(settings), period)
        }
        Commands::Debruijn {
            order,
            on,
            off,
            reversed,
            period,
            encoder,
        } => {
            if let Some(name) = encoder {
                let def = encoder::find(&library, &name)?;
                if !def.is_debruijn_vulnerable() {
                    warn!("{}: Not vuln to DeBruijn", def.name);
                }
            }
            let preview = sequencer::preview(order, DE_BRUIJN_PREVIEW_BITS)?;
            info!("Sequence: {}", format_fragment(&preview));

            let source = TxSource::DeBruijn {
                order,
                on_fragment: parse_fragment(&on)?,
                off_fragment: parse_fragment(&off)?,
                reversed,
            };
            (source, period)
        }
        Commands::File { path, period } => (TxSource::File(path), period),
    };

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .map_err(|err| Error::Device(format!("{err}")))?;

    match cli.output {
        Some(path) => {
            transmit_to_wav(config, source, samples_per_bit, path, &running)
        }
        None => transmit_to_jack(config, source, samples_per_bit, &running),
    }
}

fn generator_settings(
    library: &[EncoderDef],
    args: &GeneratorArgs,
) -> Result<GeneratorSettings> {
    let def = encoder::find(library, &args.encoder)?.clone();
    let mut settings = GeneratorSettings::from_encoder(def);

    if let Some(word) = &args.word {
        settings.field.set_word(word)?;
    }
    if let Some(repeat) = args.repeat {
        settings.repeat = repeat;
    }
    if let Some(pause) = args.pause {
        settings.pause = pause;
    }
    settings.reversed = args.reversed;

    let frame = generate_frame_fragments(
        &settings.encoder,
        &settings.field,
        settings.reversed,
    )?;
    info!(
        "Word {}: {}",
        settings.field.word(),
        waveform(&frame, WAVEFORM_PREVIEW_BITS)
    );

    Ok(settings)
}

fn transmit_to_wav(
    config: TxConfig,
    source: TxSource,
    samples_per_bit: u32,
    path: PathBuf,
    running: &AtomicBool,
) -> Result<()> {
    let sample_rate = config.sample_rate;
    let block = config.output_block_samples;
    let mut transmitter = Transmitter::new(config);
    let synth = transmitter.start(source, samples_per_bit)?;

    let cancel = Arc::new(AtomicBool::new(false));
    let renderer = spawn_wav_renderer(
        path,
        synth,
        sample_rate,
        block,
        transmitter.progress_sender(),
        cancel.clone(),
    )?;

    watch(&mut transmitter, running);
    cancel.store(true, Ordering::Release);

    match renderer.join() {
        Ok(Ok(samples)) => info!("Rendered {} samples", samples),
        Ok(Err(err)) => return Err(err),
        Err(_) => return Err(Error::Device("renderer panicked".into())),
    }

    finish(&transmitter)
}

fn transmit_to_jack(
    mut config: TxConfig,
    source: TxSource,
    samples_per_bit: u32,
    running: &AtomicBool,
) -> Result<()> {
    let client = open_client()?;
    let (sample_rate, _buffer_size) = print_jack_info(&client);
    config.sample_rate = sample_rate as u32;
    config.carrier_hz = JACK_CARRIER_HZ;

    let (out_i, out_q) = register_outputs(&client)?;
    let port_names = [out_i.name(), out_q.name()]
        .into_iter()
        .collect::<std::result::Result<Vec<String>, _>>()
        .map_err(|err| Error::Device(format!("{err}")))?;

    let mut transmitter = Transmitter::new(config);
    let synth = transmitter.start(source, samples_per_bit)?;

    let process_cb =
        build_process_closure(out_i, out_q, synth, transmitter.progress_sender());
    let process = jack::contrib::ClosureProcessHandler::new(process_cb);
    let active_client = client
        .activate_async((), process)
        .map_err(|err| Error::Device(format!("{err}")))?;

    connect_system_playback(active_client.as_client(), &port_names);

    watch(&mut transmitter, running);

    info!("Exiting gracefully...");
    if let Err(err) = active_client.deactivate() {
        error!("Error deactivating client: {}", err);
    }

    finish(&transmitter)
}

/// Pump transmitter events into the progress bar until the session ends
fn watch(transmitter: &mut Transmitter, running: &AtomicBool) {
    let bar = TxProgressBar::new(transmitter.max_bits(), &transmitter.status_text());

    let wait = Duration::from_millis(PROGRESS_UPDATE_INTERVAL_MS);
    loop {
        if !running.load(Ordering::SeqCst) {
            info!("Interrupted");
            transmitter.stop();
            break;
        }

        if transmitter.poll(wait) {
            break;
        }

        bar.update(&transmitter.progress(), &transmitter.status_text());
    }

    bar.finish(&transmitter.progress(), &transmitter.status_text());
}

fn finish(transmitter: &Transmitter) -> Result<()> {
    match transmitter.error() {
        Some(status) => {
            error!("{}", status);
            Err(Error::Terminated)
        }
        None => Ok(()),
    }
}
