//! `key = value` settings files.
//!
//! Keys are the long CLI flag names. `#` and `;` start comment lines,
//! values may be wrapped in double quotes. Unknown keys are skipped with a
//! warning so newer files still load.

use std::fmt::Write as _;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use streamctl_protocol::Codec;
use tracing::{debug, warn};

use super::{ConfigLayer, SessionConfig};
use crate::error::ConfigError;

/// Reads and parses `path`. A missing file yields `Ok(None)`.
pub fn load_layer(path: &Path) -> Result<Option<ConfigLayer>, ConfigError> {
	let text = match fs::read_to_string(path) {
		Ok(text) => text,
		Err(err) if err.kind() == ErrorKind::NotFound => {
			debug!(target = "streamctl.config", path = %path.display(), "config file not present");
			return Ok(None);
		}
		Err(source) => {
			return Err(ConfigError::Read {
				path: path.to_path_buf(),
				source,
			});
		}
	};
	parse_layer(&text, path).map(Some)
}

/// Parses settings text. `path` is only used for error messages.
pub fn parse_layer(text: &str, path: &Path) -> Result<ConfigLayer, ConfigError> {
	let mut layer = ConfigLayer::default();

	for (index, raw) in text.lines().enumerate() {
		let line_no = index + 1;
		let line = raw.trim();
		if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
			continue;
		}

		let malformed = |message: String| ConfigError::Malformed {
			path: path.to_path_buf(),
			line: line_no,
			message,
		};

		let Some((key, value)) = line.split_once('=') else {
			return Err(malformed(format!("expected `key = value`, found `{line}`")));
		};
		let key = key.trim();
		let value = unquote(value.trim());
		if key.is_empty() {
			return Err(malformed("missing key before `=`".into()));
		}

		match key {
			"address" => layer.address = Some(value.to_string()),
			"width" => layer.width = Some(parse_value(key, value).map_err(malformed)?),
			"height" => layer.height = Some(parse_value(key, value).map_err(malformed)?),
			"fps" => layer.fps = Some(parse_value(key, value).map_err(malformed)?),
			"bitrate" => layer.bitrate = Some(parse_value(key, value).map_err(malformed)?),
			"packetsize" => layer.packet_size = Some(parse_value(key, value).map_err(malformed)?),
			"codec" => layer.codec = Some(value.parse::<Codec>().map_err(malformed)?),
			"remote" => layer.remote = Some(parse_bool(key, value).map_err(malformed)?),
			"app" => layer.app = Some(value.to_string()),
			"sops" => layer.sops = Some(parse_bool(key, value).map_err(malformed)?),
			"localaudio" => layer.local_audio = Some(parse_bool(key, value).map_err(malformed)?),
			"surround" => layer.surround = Some(parse_bool(key, value).map_err(malformed)?),
			"keydir" => layer.key_dir = Some(PathBuf::from(value)),
			"mapping" => layer.mapping = Some(PathBuf::from(value)),
			"platform" => layer.platform = Some(value.to_string()),
			"unsupported" => layer.unsupported = Some(parse_bool(key, value).map_err(malformed)?),
			"fullscreen" => layer.fullscreen = Some(parse_bool(key, value).map_err(malformed)?),
			"windowed" => layer.fullscreen = Some(!parse_bool(key, value).map_err(malformed)?),
			"audio" => layer.audio_device = Some(value.to_string()),
			"debug" => layer.debug_level = Some(parse_value(key, value).map_err(malformed)?),
			"verbose" => {
				if parse_bool(key, value).map_err(malformed)? {
					layer.debug_level = Some(layer.debug_level.unwrap_or(0).max(1));
				}
			}
			other => {
				warn!(target = "streamctl.config", path = %path.display(), line = line_no, key = other, "ignoring unknown config key");
			}
		}
	}

	Ok(layer)
}

/// Renders a configuration in the format [`parse_layer`] reads. Text values
/// are quoted so surrounding spaces and quotes survive a reload.
pub fn render_config(config: &SessionConfig) -> String {
	let mut out = String::new();
	let _ = writeln!(out, "# streamctl configuration");
	let _ = writeln!(out, "address = \"{}\"", config.address);
	let _ = writeln!(out, "width = {}", config.geometry.width);
	let _ = writeln!(out, "height = {}", config.geometry.height);
	let _ = writeln!(out, "fps = {}", config.geometry.fps);
	let _ = writeln!(out, "bitrate = {}", config.geometry.bitrate);
	let _ = writeln!(out, "packetsize = {}", config.geometry.packet_size);
	let _ = writeln!(out, "codec = {}", config.codec);
	let _ = writeln!(out, "remote = {}", config.remote);
	let _ = writeln!(out, "app = \"{}\"", config.app);
	let _ = writeln!(out, "sops = {}", config.sops);
	let _ = writeln!(out, "localaudio = {}", config.local_audio);
	let _ = writeln!(out, "surround = {}", config.surround);
	let _ = writeln!(out, "keydir = \"{}\"", config.key_dir.display());
	if let Some(mapping) = &config.mapping {
		let _ = writeln!(out, "mapping = \"{}\"", mapping.display());
	}
	let _ = writeln!(out, "platform = \"{}\"", config.platform);
	let _ = writeln!(out, "unsupported = {}", config.unsupported);
	let _ = writeln!(out, "fullscreen = {}", config.fullscreen);
	if let Some(device) = &config.audio_device {
		let _ = writeln!(out, "audio = \"{device}\"");
	}
	let _ = writeln!(out, "debug = {}", config.debug_level);
	out
}

/// Writes `config` to `path`, creating parent directories.
pub fn save_config(path: &Path, config: &SessionConfig) -> Result<(), ConfigError> {
	let write_err = |source: std::io::Error| ConfigError::Write {
		path: path.to_path_buf(),
		source,
	};
	if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
		fs::create_dir_all(parent).map_err(write_err)?;
	}
	fs::write(path, render_config(config)).map_err(write_err)
}

fn unquote(value: &str) -> &str {
	value
		.strip_prefix('"')
		.and_then(|v| v.strip_suffix('"'))
		.unwrap_or(value)
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, String> {
	value.parse::<T>().map_err(|_| format!("invalid value `{value}` for `{key}`"))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, String> {
	match value.to_lowercase().as_str() {
		"true" | "yes" | "on" | "1" => Ok(true),
		"false" | "no" | "off" | "0" => Ok(false),
		_ => Err(format!("invalid boolean `{value}` for `{key}`")),
	}
}
