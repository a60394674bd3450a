//! Catalog, codec and stream-shape types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One application the host offers for streaming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppCatalogEntry {
	pub name: String,
	pub id: u32,
}

impl AppCatalogEntry {
	pub fn new(name: impl Into<String>, id: u32) -> Self {
		Self { name: name.into(), id }
	}
}

/// Host metadata reported by the RPC layer when a connection is initialised.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
	pub address: String,
	/// GeForce Experience (or compatible server) version.
	pub server_version: String,
	pub app_version: String,
	pub gs_version: String,
	pub gpu_type: String,
	/// Whether the host already trusts this client's key.
	pub paired: bool,
	#[serde(default)]
	pub supports_4k: bool,
}

/// Codec preference requested by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Codec {
	#[default]
	Auto,
	H264,
	Hevc,
}

impl FromStr for Codec {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"auto" => Ok(Codec::Auto),
			"h264" => Ok(Codec::H264),
			"h265" | "hevc" => Ok(Codec::Hevc),
			_ => Err(format!("unknown codec: {s}")),
		}
	}
}

impl fmt::Display for Codec {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Codec::Auto => write!(f, "auto"),
			Codec::H264 => write!(f, "h264"),
			Codec::Hevc => write!(f, "h265"),
		}
	}
}

/// Audio channel layout negotiated with the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioConfiguration {
	#[default]
	Stereo,
	Surround51,
}

/// Resolution, frame rate and transport sizing for one stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamGeometry {
	pub width: u32,
	pub height: u32,
	pub fps: u32,
	/// Kbps.
	pub bitrate: u32,
	/// Maximum packet size in bytes.
	pub packet_size: u32,
}

impl StreamGeometry {
	pub fn is_4k(&self) -> bool {
		self.width >= 3840 || self.height >= 2160
	}
}

impl fmt::Display for StreamGeometry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}x{} ({} fps)", self.width, self.height, self.fps)
	}
}

/// Display flags handed to the transport when a connection starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisplayFlags(u32);

impl DisplayFlags {
	pub const FULLSCREEN: DisplayFlags = DisplayFlags(0x01);

	pub const fn empty() -> Self {
		DisplayFlags(0)
	}

	pub const fn bits(self) -> u32 {
		self.0
	}

	pub const fn contains(self, other: DisplayFlags) -> bool {
		self.0 & other.0 == other.0
	}

	pub fn insert(&mut self, other: DisplayFlags) {
		self.0 |= other.0;
	}
}

/// Everything the host and transport need to start one stream attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamRequest {
	pub app_id: u32,
	pub geometry: StreamGeometry,
	/// One low-order bit per connected controller slot.
	pub gamepad_mask: u16,
	pub supports_hevc: bool,
	pub audio: AudioConfiguration,
	pub streaming_remotely: bool,
	pub sops: bool,
	pub local_audio: bool,
	pub display_flags: DisplayFlags,
}
