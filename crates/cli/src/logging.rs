//! Tracing setup for the binary.

use tracing_subscriber::EnvFilter;

/// Default filter for a verbosity level; `RUST_LOG` overrides it.
pub fn default_directive(verbosity: u8) -> &'static str {
	match verbosity {
		0 => "warn",
		1 => "info",
		2 => "debug",
		_ => "trace",
	}
}

/// Installs the global subscriber. Logs go to stderr so status output on
/// stdout stays clean.
pub fn init_logging(verbosity: u8) {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));
	let _ = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(verbosity > 1)
		.try_init();
}
