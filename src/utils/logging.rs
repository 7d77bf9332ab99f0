use tracing_subscriber::{EnvFilter, fmt};

use crate::utils::consts::LOG_LEVEL;

/// Install the global subscriber. `RUST_LOG` takes precedence over
/// `verbose`.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { LOG_LEVEL };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    // Worker threads are named (stream-reader, debruijn, wav-render)
    fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .with_writer(std::io::stderr)
        .init();
}
