//! `tracing` subscriber setup for the binary.

use std::env;

use tracing_subscriber::EnvFilter;

use crate::config::LoggingSettings;

/// Environment variable checked before `RUST_LOG`.
pub const LOG_ENV: &str = "GROOVE_LOG";

/// Filter directive in effect: `GROOVE_LOG`, then `RUST_LOG`, then the setting.
pub fn filter_directive(settings: &LoggingSettings) -> String {
    [LOG_ENV, "RUST_LOG"]
        .iter()
        .filter_map(|name| env::var(name).ok())
        .find(|v| !v.trim().is_empty())
        .unwrap_or_else(|| settings.level.clone())
}

/// Install a stderr `fmt` subscriber. Calling it twice is harmless.
pub fn init(settings: &LoggingSettings) {
    let directive = filter_directive(settings);
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|e| {
        eprintln!("groove: bad log filter {directive:?} ({e}), using \"info\"");
        EnvFilter::new("info")
    });

    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_env_filter(filter)
        .try_init();
}
