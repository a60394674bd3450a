//! Stream lifecycle: resolve the app, launch it, stream, tear down.
//!
//! Every attempt starts and ends in [`StreamState::Idle`]. Failures before
//! the stream starts abort without side effects on the host connection;
//! once streaming has begun, teardown always runs and its own errors are
//! only logged.

use std::sync::Arc;

use streamctl_protocol::{AppCatalogEntry, Codec, StreamRequest};
use tracing::{debug, info, warn};

use crate::client::{ServerHandle, SessionClient};
use crate::config::SessionConfig;
use crate::error::{ConnectionError, ControllerError, NegotiationFailure, Result};
use crate::platform::{MediaSinks, PlatformId, PlatformRegistry};
use crate::report::Reporter;
use crate::transport::{SessionEnd, StopSignal};

/// Most controllers a host accepts.
pub const MAX_GAMEPADS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
	Idle,
	AppResolving,
	Launching,
	Streaming,
	Teardown,
}

/// One bit per attached controller, lowest slots first.
pub fn gamepad_mask(connected: usize) -> u16 {
	let slots = connected.min(MAX_GAMEPADS);
	((1u32 << slots) - 1) as u16
}

/// HEVC is requested when forced, never when H.264 is forced, and
/// otherwise only when the platform can decode it.
pub fn hevc_eligible(codec: Codec, platform_supports_hevc: bool) -> bool {
	match codec {
		Codec::Hevc => true,
		Codec::H264 => false,
		Codec::Auto => platform_supports_hevc,
	}
}

/// Exact, case-sensitive match on the application name.
pub fn resolve_app_id(catalog: &[AppCatalogEntry], name: &str) -> Option<u32> {
	catalog.iter().find(|entry| entry.name == name).map(|entry| entry.id)
}

pub fn build_request(config: &SessionConfig, app_id: u32, gamepad_mask: u16, supports_hevc: bool) -> StreamRequest {
	StreamRequest {
		app_id,
		geometry: config.geometry,
		gamepad_mask,
		supports_hevc,
		audio: config.audio_configuration(),
		streaming_remotely: config.remote,
		sops: config.sops,
		local_audio: config.local_audio,
		display_flags: config.display_flags(),
	}
}

fn launch_failure(err: ConnectionError, config: &SessionConfig) -> ControllerError {
	match err {
		ConnectionError::Unsupported4K => NegotiationFailure::Unsupported4K.into(),
		ConnectionError::UnsupportedResolution => NegotiationFailure::UnsupportedMode {
			width: config.geometry.width,
			height: config.geometry.height,
			fps: config.geometry.fps,
		}
		.into(),
		other => ControllerError::Launch(other),
	}
}

/// Runs stream attempts and tracks which lifecycle state is current.
pub struct StreamOrchestrator {
	client: SessionClient,
	platforms: Arc<dyn PlatformRegistry>,
	reporter: Arc<dyn Reporter>,
	state: StreamState,
	history: Vec<StreamState>,
}

impl StreamOrchestrator {
	pub fn new(client: SessionClient, platforms: Arc<dyn PlatformRegistry>, reporter: Arc<dyn Reporter>) -> Self {
		Self {
			client,
			platforms,
			reporter,
			state: StreamState::Idle,
			history: Vec::new(),
		}
	}

	pub fn state(&self) -> StreamState {
		self.state
	}

	/// States entered by the most recent attempt, in order.
	pub fn history(&self) -> &[StreamState] {
		&self.history
	}

	fn enter(&mut self, state: StreamState) {
		debug!(target = "streamctl.orchestrator", from = ?self.state, to = ?state, "transition");
		self.state = state;
		self.history.push(state);
	}

	/// One complete attempt. Always leaves the orchestrator `Idle`.
	pub async fn run(&mut self, server: &ServerHandle, config: &SessionConfig, platform: &PlatformId, stop: StopSignal) -> Result<SessionEnd> {
		self.history.clear();
		let result = self.attempt(server, config, platform, stop).await;
		self.enter(StreamState::Idle);
		result
	}

	async fn attempt(&mut self, server: &ServerHandle, config: &SessionConfig, platform: &PlatformId, stop: StopSignal) -> Result<SessionEnd> {
		self.enter(StreamState::AppResolving);
		let catalog = self.client.list_apps(server).await;
		let app_id = resolve_app_id(&catalog, &config.app).ok_or_else(|| ControllerError::AppNotFound {
			name: config.app.clone(),
		})?;

		self.enter(StreamState::Launching);
		let mask = gamepad_mask(self.platforms.connected_gamepads(platform));
		let hevc = hevc_eligible(config.codec, self.platforms.supports_hevc(platform));
		let request = build_request(config, app_id, mask, hevc);
		self.client
			.start_app(server, &request)
			.await
			.map_err(|err| launch_failure(err, config))?;
		info!(target = "streamctl.orchestrator", app = %config.app, app_id, hevc, "app started");

		self.enter(StreamState::Streaming);
		if config.debug_level > 0 {
			let g = &config.geometry;
			self.reporter
				.status(&format!("Stream {} x {}, {} fps, {} kbps", g.width, g.height, g.fps, g.bitrate));
		}
		self.platforms.start(platform);
		let sinks = MediaSinks {
			video: self.platforms.video_sink(platform),
			audio: self.platforms.audio_sink(platform, config.audio_device.as_deref()),
		};
		let outcome = self
			.client
			.run_connection(server, &request, sinks, config.audio_device.as_deref(), stop)
			.await;

		self.enter(StreamState::Teardown);
		if let Err(err) = self.client.stop().await {
			warn!(target = "streamctl.orchestrator", error = %err, "stopping connection failed");
		}
		self.platforms.stop(platform);

		let end = outcome?;
		info!(target = "streamctl.orchestrator", ?end, "stream ended");
		Ok(end)
	}
}
