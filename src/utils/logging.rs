//! Diagnostic logging for the binary.
//!
//! The library only emits `tracing` events; installing a subscriber is the
//! binary's job. Output goes to stderr so stdout stays clean for JSON.

use std::error::Error;

use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the `--log-level` flag.
pub const LOG_ENV: &str = "RUST_LOG";

/// Pick the filter directive: the environment wins over the CLI default.
pub fn resolve_directive(env_value: Option<String>, default_level: &str) -> String {
    env_value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default_level.to_string())
}

pub fn filter_from(directive: &str) -> Result<EnvFilter, ParseError> {
    EnvFilter::try_new(directive)
}

/// Install the global stderr subscriber.
pub fn init_tracing(default_level: &str) -> Result<(), Box<dyn Error>> {
    let directive = resolve_directive(std::env::var(LOG_ENV).ok(), default_level);
    let filter = filter_from(&directive)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|err| -> Box<dyn Error> { err })?;
    Ok(())
}
