//! Tracing setup for the CLI.
//!
//! Logs go to stderr so `--json` output on stdout stays machine-readable.
use anyhow::{anyhow, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub const LOG_ENV: &str = "LEADCALL_LOG";
const DEFAULT_LOG_FILTER: &str = "leadcall=warn";
const VERBOSE_LOG_FILTER: &str = "leadcall=debug";

/// Pick the filter directive: `LEADCALL_LOG` wins, then `--verbose`.
fn filter_directive(env_value: Option<String>, verbose: bool) -> String {
    match env_value.filter(|value| !value.trim().is_empty()) {
        Some(value) => value,
        None if verbose => VERBOSE_LOG_FILTER.to_string(),
        None => DEFAULT_LOG_FILTER.to_string(),
    }
}

pub fn init_logging(verbose: bool) -> Result<()> {
    let directive = filter_directive(std::env::var(LOG_ENV).ok(), verbose);
    let filter = EnvFilter::try_new(&directive)
        .map_err(|err| anyhow!("invalid {LOG_ENV} filter {directive:?}: {err}"))?;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(filter),
        )
        .try_init()
        .map_err(|err| anyhow!("initialize logging: {err}"))?;
    Ok(())
}
