//! Error taxonomy for the controller.
//!
//! Raw RPC codes never leave [`crate::client`]: they are decoded into
//! [`ConnectionError`] there, and the orchestrator refines launch failures
//! into [`NegotiationFailure`]. Everything the dispatcher reports is a
//! [`ControllerError`] whose `Display` is the user-facing diagnosis.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use streamctl_protocol::{
	GS_ERROR, GS_INVALID, GS_NOT_SUPPORTED_4K, GS_NOT_SUPPORTED_MODE, GS_OUT_OF_MEMORY, GS_UNSUPPORTED_VERSION, RpcStatus,
};
use thiserror::Error;

use crate::transport::TransportError;

/// Failures loading or saving configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("failed to read config {}: {source}", .path.display())]
	Read {
		path: PathBuf,
		#[source]
		source: io::Error,
	},

	#[error("malformed config {}:{line}: {message}", .path.display())]
	Malformed { path: PathBuf, line: usize, message: String },

	#[error("failed to write config {}: {source}", .path.display())]
	Write {
		path: PathBuf,
		#[source]
		source: io::Error,
	},
}

/// Normalized result of a GameStream RPC.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
	#[error("Not enough memory")]
	OutOfMemory,

	#[error("Gamestream error: {0}")]
	Protocol(String),

	#[error("Invalid data received from server: {0}")]
	InvalidServerData(String),

	#[error("Unsupported version: {0}")]
	UnsupportedServerVersion(String),

	#[error("Server doesn't support the requested resolution")]
	UnsupportedResolution,

	#[error("Server doesn't support 4K")]
	Unsupported4K,

	#[error("Errorcode {code}{}", fmt_detail(.detail))]
	Other { code: i32, detail: String },
}

fn fmt_detail(detail: &str) -> String {
	if detail.is_empty() { String::new() } else { format!(": {detail}") }
}

impl From<RpcStatus> for ConnectionError {
	fn from(status: RpcStatus) -> Self {
		match status.code {
			GS_OUT_OF_MEMORY => ConnectionError::OutOfMemory,
			GS_ERROR => ConnectionError::Protocol(status.detail),
			GS_INVALID => ConnectionError::InvalidServerData(status.detail),
			GS_UNSUPPORTED_VERSION => ConnectionError::UnsupportedServerVersion(status.detail),
			GS_NOT_SUPPORTED_MODE => ConnectionError::UnsupportedResolution,
			GS_NOT_SUPPORTED_4K => ConnectionError::Unsupported4K,
			code => ConnectionError::Other { code, detail: status.detail },
		}
	}
}

/// The host refused the requested stream shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NegotiationFailure {
	#[error("Server doesn't support 4K")]
	Unsupported4K,

	#[error("Server doesn't support {width}x{height} ({fps} fps) or try --unsupported option")]
	UnsupportedMode { width: u32, height: u32, fps: u32 },
}

/// Every failure the controller can report.
#[derive(Debug, Error)]
pub enum ControllerError {
	#[error(transparent)]
	Config(#[from] ConfigError),

	#[error("Autodiscovery failed after {}ms. Specify an IP address next time.", .timeout.as_millis())]
	DiscoveryTimeout { timeout: Duration },

	#[error("Can't connect to server {address}: {source}")]
	Connect {
		address: String,
		#[source]
		source: ConnectionError,
	},

	#[error("Can't get app list: {0}")]
	Catalog(#[source] ConnectionError),

	#[error("Failed to pair to server: {0}")]
	PairingFailure(#[source] ConnectionError),

	#[error("Failed to unpair from server: {0}")]
	UnpairingFailure(#[source] ConnectionError),

	#[error("Failed to quit app: {0}")]
	QuitApp(#[source] ConnectionError),

	#[error("You must pair with the PC first")]
	PreconditionNotMet,

	#[error("Can't find app {name}")]
	AppNotFound { name: String },

	#[error(transparent)]
	Negotiation(#[from] NegotiationFailure),

	#[error("Error starting app: {0}")]
	Launch(#[source] ConnectionError),

	#[error("Platform '{name}' not found")]
	PlatformNotFound { name: String },

	#[error("Stream failed: {0}")]
	Transport(#[from] TransportError),

	#[error("Gamepad mapping editor is not available in this build")]
	Unsupported,

	#[error(transparent)]
	Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, ControllerError>;
