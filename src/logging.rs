//! Log output for the `carecache` binary.
//!
//! Library code only emits `tracing` events; installing a subscriber is
//! left to the binary (or the embedding application).

use tracing_subscriber::EnvFilter;

/// Install a stderr `fmt` subscriber.
///
/// `RUST_LOG` takes precedence. Without it, `verbosity` selects the level
/// for this crate: 0 → warn, 1 → info, 2+ → debug.
pub fn init(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("warn,care_cache={level},care_cache_core={level}"))
    });

    // A second init (e.g. from a test harness) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
