//! Logging initialization for the claimer binary.
//!
//! The core crates only emit `tracing` events; this module owns the
//! subscriber lifecycle and fans events out to two destinations: the console
//! for the interactive session, and an append-only file for the persistent
//! record of registrations and claims.

use claimer_config::LoggingConfig;
use std::fs::OpenOptions;
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initializes the global subscriber with console and file output.
///
/// The filter honors `RUST_LOG` when set, falling back to the level given
/// on the command line.
pub fn init(default_level: &str, config: &LoggingConfig) -> Result<(), std::io::Error> {
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

	if let Some(parent) = config.file.parent() {
		if !parent.as_os_str().is_empty() {
			std::fs::create_dir_all(parent)?;
		}
	}
	let file = OpenOptions::new()
		.create(true)
		.append(true)
		.open(&config.file)?;

	tracing_subscriber::registry()
		.with(env_filter)
		.with(fmt::layer().with_target(false))
		.with(
			fmt::layer()
				.with_ansi(false)
				.with_target(false)
				.with_writer(Arc::new(file)),
		)
		.init();

	Ok(())
}
