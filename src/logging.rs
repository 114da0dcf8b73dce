//! Logging setup
//!
//! Diagnostics go to stderr so table and JSON output on stdout stays clean.
//! `RUST_LOG` wins over the `-v` count when set.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter for a `-v` count
fn default_directives(verbosity: u8) -> String {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // reqwest and hyper are only interesting at trace
    let deps = if verbosity >= 3 { "debug" } else { "warn" };
    format!("lims={level},reqwest={deps},hyper={deps},rustls=warn")
}

fn build_env_filter(verbosity: u8) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(verbosity)))
}

/// Install the global subscriber; later calls are ignored
pub fn init(verbosity: u8) {
    let _ = tracing_subscriber::registry()
        .with(build_env_filter(verbosity))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbosity >= 2)
                .without_time(),
        )
        .try_init();
}
