use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Map `-v` occurrences to a level: none → warn, 1 → info, 2 → debug, more → trace.
pub(crate) fn level_for(verbose: u8) -> Level {
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Install the stderr subscriber. `RUST_LOG` takes precedence over `-v`.
pub(crate) fn init_logging(verbose: u8) {
    let level = level_for(verbose);
    let default_filter = format!("recipebox={level},recipebox_core={level}");
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}
