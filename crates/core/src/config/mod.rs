//! Layered session configuration.
//!
//! Three sources feed one [`SessionConfig`]: the global settings file, the
//! per-host override file and the command line. Each source is parsed into
//! a [`ConfigLayer`] where every field is optional; layers are merged
//! field-by-field with later layers winning, then the result is frozen with
//! defaults filled in.

use std::path::PathBuf;

use serde::Serialize;
use streamctl_protocol::{AudioConfiguration, Codec, DisplayFlags, StreamGeometry};

mod file;
mod resolver;


pub use file::{load_layer, parse_layer, render_config, save_config};
pub use resolver::{ConfigPaths, ConfigResolver, Resolution};

pub const DEFAULT_WIDTH: u32 = 1280;
pub const DEFAULT_HEIGHT: u32 = 720;
pub const DEFAULT_FPS: u32 = 60;
pub const DEFAULT_PACKET_SIZE: u32 = 1392;
pub const REMOTE_PACKET_SIZE: u32 = 1024;
pub const DEFAULT_APP: &str = "Steam";
pub const DEFAULT_PLATFORM: &str = "auto";

/// One source of configuration values. `None` means "inherit".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigLayer {
	pub address: Option<String>,
	pub width: Option<u32>,
	pub height: Option<u32>,
	pub fps: Option<u32>,
	pub bitrate: Option<u32>,
	pub packet_size: Option<u32>,
	pub codec: Option<Codec>,
	pub remote: Option<bool>,
	pub app: Option<String>,
	pub sops: Option<bool>,
	pub local_audio: Option<bool>,
	pub surround: Option<bool>,
	pub key_dir: Option<PathBuf>,
	pub mapping: Option<PathBuf>,
	pub platform: Option<String>,
	pub unsupported: Option<bool>,
	pub fullscreen: Option<bool>,
	pub audio_device: Option<String>,
	pub debug_level: Option<u8>,
}

impl ConfigLayer {
	/// Overlays `over` on top of `self`; every field set in `over` wins.
	pub fn merge(self, over: ConfigLayer) -> ConfigLayer {
		ConfigLayer {
			address: over.address.or(self.address),
			width: over.width.or(self.width),
			height: over.height.or(self.height),
			fps: over.fps.or(self.fps),
			bitrate: over.bitrate.or(self.bitrate),
			packet_size: over.packet_size.or(self.packet_size),
			codec: over.codec.or(self.codec),
			remote: over.remote.or(self.remote),
			app: over.app.or(self.app),
			sops: over.sops.or(self.sops),
			local_audio: over.local_audio.or(self.local_audio),
			surround: over.surround.or(self.surround),
			key_dir: over.key_dir.or(self.key_dir),
			mapping: over.mapping.or(self.mapping),
			platform: over.platform.or(self.platform),
			unsupported: over.unsupported.or(self.unsupported),
			fullscreen: over.fullscreen.or(self.fullscreen),
			audio_device: over.audio_device.or(self.audio_device),
			debug_level: over.debug_level.or(self.debug_level),
		}
	}

	/// Freezes the layer into a [`SessionConfig`] for `address`.
	pub fn into_config(self, address: String, default_key_dir: PathBuf) -> SessionConfig {
		let width = self.width.unwrap_or(DEFAULT_WIDTH);
		let height = self.height.unwrap_or(DEFAULT_HEIGHT);
		let fps = self.fps.unwrap_or(DEFAULT_FPS);
		let remote = self.remote.unwrap_or(false);
		let packet_size = self
			.packet_size
			.unwrap_or(if remote { REMOTE_PACKET_SIZE } else { DEFAULT_PACKET_SIZE });

		SessionConfig {
			address,
			geometry: StreamGeometry {
				width,
				height,
				fps,
				bitrate: self.bitrate.unwrap_or_else(|| default_bitrate(height, fps)),
				packet_size,
			},
			codec: self.codec.unwrap_or_default(),
			remote,
			app: self.app.unwrap_or_else(|| DEFAULT_APP.to_string()),
			sops: self.sops.unwrap_or(true),
			local_audio: self.local_audio.unwrap_or(false),
			surround: self.surround.unwrap_or(false),
			key_dir: self.key_dir.unwrap_or(default_key_dir),
			mapping: self.mapping,
			platform: self.platform.unwrap_or_else(|| DEFAULT_PLATFORM.to_string()),
			unsupported: self.unsupported.unwrap_or(false),
			fullscreen: self.fullscreen.unwrap_or(true),
			audio_device: self.audio_device,
			debug_level: self.debug_level.unwrap_or(0),
		}
	}
}

/// Bitrate in Kbps used when none is configured.
pub fn default_bitrate(height: u32, fps: u32) -> u32 {
	let base = if height >= 2160 {
		40_000
	} else if height >= 1080 {
		20_000
	} else if height >= 720 {
		10_000
	} else {
		5_000
	};
	if fps <= 30 { base / 2 } else { base }
}

/// Fully merged, immutable configuration for one controller run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
	pub address: String,
	pub geometry: StreamGeometry,
	pub codec: Codec,
	/// Remote (WAN) optimisations: smaller packets.
	pub remote: bool,
	pub app: String,
	/// Allow the host to change game settings for streaming.
	pub sops: bool,
	pub local_audio: bool,
	pub surround: bool,
	pub key_dir: PathBuf,
	pub mapping: Option<PathBuf>,
	pub platform: String,
	/// Try streaming even if the server version or mode is unsupported.
	pub unsupported: bool,
	pub fullscreen: bool,
	pub audio_device: Option<String>,
	pub debug_level: u8,
}

impl SessionConfig {
	pub fn audio_configuration(&self) -> AudioConfiguration {
		if self.surround {
			AudioConfiguration::Surround51
		} else {
			AudioConfiguration::Stereo
		}
	}

	pub fn display_flags(&self) -> DisplayFlags {
		let mut flags = DisplayFlags::empty();
		if self.fullscreen {
			flags.insert(DisplayFlags::FULLSCREEN);
		}
		flags
	}
}
