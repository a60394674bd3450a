//! Built-in platforms.
//!
//! Only the `fake` platform ships here: its sinks accept every callback,
//! count what they receive and render nothing. `auto` resolves to the first
//! registered platform.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use streamctl::protocol::{AudioConfiguration, StreamGeometry};
use streamctl::{AudioSink, PlatformId, PlatformRegistry, TransportError, VideoSink};
use tracing::{debug, trace};

pub const FAKE: &str = "fake";
pub const AUTO: &str = "auto";

/// Units and sample frames seen by the fake sinks.
#[derive(Debug, Default)]
pub struct SinkCounters {
	pub video_units: AtomicU64,
	pub audio_frames: AtomicU64,
}

pub struct BuiltinPlatforms {
	names: Vec<&'static str>,
	hevc: bool,
	gamepads: usize,
	counters: Arc<SinkCounters>,
}

impl Default for BuiltinPlatforms {
	fn default() -> Self {
		Self::new()
	}
}

impl BuiltinPlatforms {
	pub fn new() -> Self {
		Self {
			names: vec![FAKE],
			hevc: true,
			gamepads: 0,
			counters: Arc::default(),
		}
	}

	pub fn with_hevc(mut self, hevc: bool) -> Self {
		self.hevc = hevc;
		self
	}

	/// Number of controllers the platform reports as attached.
	pub fn with_gamepads(mut self, gamepads: usize) -> Self {
		self.gamepads = gamepads;
		self
	}

	pub fn names(&self) -> &[&'static str] {
		&self.names
	}

	pub fn counters(&self) -> Arc<SinkCounters> {
		self.counters.clone()
	}
}

impl PlatformRegistry for BuiltinPlatforms {
	fn resolve(&self, name: &str) -> Option<PlatformId> {
		let found = if name == AUTO {
			self.names.first()
		} else {
			self.names.iter().find(|known| **known == name)
		};
		found.map(|name| PlatformId::new(*name))
	}

	fn supports_hevc(&self, _platform: &PlatformId) -> bool {
		self.hevc
	}

	fn start(&self, platform: &PlatformId) {
		debug!(target = "streamctl.platform", %platform, "start");
	}

	fn stop(&self, platform: &PlatformId) {
		debug!(target = "streamctl.platform", %platform, "stop");
	}

	fn video_sink(&self, _platform: &PlatformId) -> Box<dyn VideoSink> {
		Box::new(FakeVideo {
			counters: self.counters.clone(),
		})
	}

	fn audio_sink(&self, _platform: &PlatformId, device: Option<&str>) -> Box<dyn AudioSink> {
		Box::new(FakeAudio {
			device: device.map(str::to_string),
			counters: self.counters.clone(),
		})
	}

	fn connected_gamepads(&self, _platform: &PlatformId) -> usize {
		self.gamepads
	}
}

struct FakeVideo {
	counters: Arc<SinkCounters>,
}

impl VideoSink for FakeVideo {
	fn setup(&mut self, geometry: &StreamGeometry, hevc: bool) -> Result<(), TransportError> {
		if geometry.width == 0 || geometry.height == 0 || geometry.fps == 0 {
			return Err(TransportError::Sink(format!("can't render a {geometry} stream")));
		}
		debug!(target = "streamctl.platform", %geometry, hevc, "video setup");
		Ok(())
	}

	fn submit(&mut self, unit: &[u8]) {
		trace!(target = "streamctl.platform", len = unit.len(), "video unit");
		self.counters.video_units.fetch_add(1, Ordering::Relaxed);
	}

	fn cleanup(&mut self) {}
}

struct FakeAudio {
	device: Option<String>,
	counters: Arc<SinkCounters>,
}

impl AudioSink for FakeAudio {
	fn init(&mut self, configuration: AudioConfiguration) -> Result<(), TransportError> {
		debug!(target = "streamctl.platform", ?configuration, device = ?self.device, "audio init");
		Ok(())
	}

	fn play(&mut self, samples: &[i16]) {
		self.counters.audio_frames.fetch_add(samples.len() as u64, Ordering::Relaxed);
	}

	fn cleanup(&mut self) {}
}
