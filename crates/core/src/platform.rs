//! Platform abstraction: media sinks and controller enumeration.
//!
//! The decode/render pipeline is outside this crate. A platform is only
//! named, asked about HEVC support, started/stopped around a stream and
//! asked for the sinks the transport feeds.

use std::fmt;

use streamctl_protocol::{AudioConfiguration, StreamGeometry};

use crate::transport::TransportError;

/// Resolved platform identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlatformId(String);

impl PlatformId {
	pub fn new(name: impl Into<String>) -> Self {
		Self(name.into())
	}

	pub fn name(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for PlatformId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Receives decoded-unit callbacks from the transport.
pub trait VideoSink: Send {
	fn setup(&mut self, geometry: &StreamGeometry, hevc: bool) -> Result<(), TransportError>;

	/// One compressed access unit.
	fn submit(&mut self, unit: &[u8]);

	fn cleanup(&mut self);
}

/// Receives audio callbacks from the transport.
pub trait AudioSink: Send {
	fn init(&mut self, configuration: AudioConfiguration) -> Result<(), TransportError>;

	fn play(&mut self, samples: &[i16]);

	fn cleanup(&mut self);
}

/// Sinks handed to the transport for one stream.
pub struct MediaSinks {
	pub video: Box<dyn VideoSink>,
	pub audio: Box<dyn AudioSink>,
}

impl fmt::Debug for MediaSinks {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MediaSinks").finish_non_exhaustive()
	}
}

/// The set of platforms this build can drive.
pub trait PlatformRegistry: Send + Sync {
	/// Maps a user-facing name (`auto` included) to a platform.
	fn resolve(&self, name: &str) -> Option<PlatformId>;

	fn supports_hevc(&self, platform: &PlatformId) -> bool;

	fn start(&self, platform: &PlatformId);

	fn stop(&self, platform: &PlatformId);

	fn video_sink(&self, platform: &PlatformId) -> Box<dyn VideoSink>;

	fn audio_sink(&self, platform: &PlatformId, device: Option<&str>) -> Box<dyn AudioSink>;

	/// Controllers currently attached, before clamping to the slot count.
	fn connected_gamepads(&self, platform: &PlatformId) -> usize;
}
