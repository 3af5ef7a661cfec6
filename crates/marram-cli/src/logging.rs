//! Logging initialization for the CLI.
//!
//! Logging is owned by the CLI crate so the core library stays quiet by
//! default; it only emits `tracing` events for whoever subscribes.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber.
///
/// `verbosity`: 0 = WARN, 1 = DEBUG, 2+ = TRACE. `RUST_LOG` still wins when
/// set. With `json`, events go to stderr as JSON lines so stdout stays
/// reserved for build output.
///
/// # Panics
/// Panics if a subscriber is already installed.
pub fn init(verbosity: u8, json: bool) {
    let level = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("marram_core={level},marram_cli={level}")));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}
