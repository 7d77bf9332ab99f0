use crossbeam_channel::Sender;
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::synth::{Iq8, OokSynthesizer, TxProgress};
use crate::utils::consts::{
    JACK_CLIENT_NAME, OUTPUT_I_PORT_NAME, OUTPUT_Q_PORT_NAME,
};

/// Samples synthesized per chunk inside the process callback
const CHUNK: usize = 256;

pub fn open_client() -> Result<jack::Client> {
    let (client, status) = jack::Client::new(
        JACK_CLIENT_NAME,
        jack::ClientOptions::NO_START_SERVER,
    )
    .map_err(|err| Error::Device(format!("{err}")))?;
    info!("JACK client status: {:?}", status);
    Ok(client)
}

pub fn print_jack_info(client: &jack::Client) -> (usize, usize) {
    let sample_rate = client.sample_rate();
    let buffer_size = client.buffer_size();
    info!("JACK Server Info:");
    info!("  Sample Rate: {} Hz", sample_rate);
    info!("  Buffer Size: {} samples", buffer_size);
    info!(
        "  Buffer Duration: {:.2} ms",
        (buffer_size as f64 / sample_rate as f64) * 1000.0
    );
    (sample_rate as usize, buffer_size as usize)
}

/// Register the I and Q output ports
pub fn register_outputs(
    client: &jack::Client,
) -> Result<(jack::Port<jack::AudioOut>, jack::Port<jack::AudioOut>)> {
    let out_i = client
        .register_port(OUTPUT_I_PORT_NAME, jack::AudioOut::default())
        .map_err(|err| Error::Device(format!("{err}")))?;
    let out_q = client
        .register_port(OUTPUT_Q_PORT_NAME, jack::AudioOut::default())
        .map_err(|err| Error::Device(format!("{err}")))?;
    Ok((out_i, out_q))
}

/// Connect our outputs, in order, to the physical playback ports
pub fn connect_system_playback(client: &jack::Client, out_port_names: &[String]) {
    let system_input_ports = client.ports(
        None,
        None,
        jack::PortFlags::IS_INPUT | jack::PortFlags::IS_PHYSICAL,
    );
    debug!("{} physical input found.", system_input_ports.len());

    if system_input_ports.is_empty() {
        warn!("Missing output");
        return;
    }

    for (out_port, system_in) in out_port_names
        .iter()
        .zip(system_input_ports.iter())
    {
        match client.connect_ports_by_name(out_port, system_in) {
            Ok(_) => info!("Connected Output: {} -> {}", out_port, system_in),
            Err(e) => error!(
                "Failed connecting Output {} -> {}: {}",
                out_port, system_in, e
            ),
        }
    }
}

/// Real-time callback: I on the first port, Q on the second.
///
/// Progress goes out once per period through the bounded progress queue
/// with `try_send`, so the callback never blocks or allocates. A snapshot
/// that does not fit is dropped, except the final "done" one, which is
/// retried on the following periods until it is taken.
pub fn build_process_closure(
    mut out_i: jack::Port<jack::AudioOut>,
    mut out_q: jack::Port<jack::AudioOut>,
    mut synth: OokSynthesizer,
    progress_tx: Sender<TxProgress>,
) -> impl FnMut(&jack::Client, &jack::ProcessScope) -> jack::Control + Send + 'static
{
    let mut scratch = [Iq8::ZERO; CHUNK];
    let mut reported_done = false;

    move |_: &jack::Client, ps: &jack::ProcessScope| -> jack::Control {
        let i_buffer = out_i.as_mut_slice(ps);
        let q_buffer = out_q.as_mut_slice(ps);

        let mut progress = synth.progress();
        for (i_chunk, q_chunk) in i_buffer
            .chunks_mut(CHUNK)
            .zip(q_buffer.chunks_mut(CHUNK))
        {
            let block = &mut scratch[..i_chunk.len()];
            progress = synth.execute(block);

            for ((i_out, q_out), sample) in
                i_chunk.iter_mut().zip(q_chunk.iter_mut()).zip(block.iter())
            {
                let (re, im) = sample.to_f32();
                *i_out = re;
                *q_out = im;
            }
        }

        if !reported_done && progress_tx.try_send(progress).is_ok() {
            reported_done = progress.done;
        }

        jack::Control::Continue
    }
}
