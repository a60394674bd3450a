//! In-process GameStream host.
//!
//! [`SimulatedHost`] answers the RPC surface the way a GameStream server
//! does (pairing, catalog, launch validation, quit) and plays the
//! transport role by feeding synthetic media into the platform sinks until
//! the stop signal is raised or the configured session length runs out.
//!
//! Pairing survives process restarts through a marker file per host in the
//! client key directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use streamctl::protocol::{
	AppCatalogEntry, GS_ERROR, GS_INVALID, GS_IO_ERROR, GS_NOT_SUPPORTED_4K, GS_NOT_SUPPORTED_MODE, RpcResult, RpcStatus,
	ServerInfo, StreamGeometry, StreamRequest,
};
use streamctl::{ConnectionTransport, GameStreamRpc, MediaSinks, SessionEnd, StopSignal, TransportError};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Resolutions the host will encode without `--unsupported`.
const SUPPORTED_MODES: &[(u32, u32)] = &[(1280, 720), (1920, 1080), (3840, 2160)];
const SUPPORTED_FPS: &[u32] = &[30, 60];
const SAMPLES_PER_TICK: usize = 480;
const MIN_TICK: Duration = Duration::from_millis(1);

/// One RPC or transport call seen by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
	Init(String),
	Pair(String),
	Unpair,
	AppList,
	StartApp(u32),
	QuitApp,
	StartConnection,
	StopConnection,
}

#[derive(Debug, Default)]
struct HostState {
	key_dir: Option<PathBuf>,
	paired: bool,
	allow_unsupported: bool,
	running_app: Option<u32>,
	streaming: bool,
	calls: Vec<HostCall>,
}

pub struct SimulatedHost {
	hostname: String,
	gpu_type: String,
	catalog: Vec<AppCatalogEntry>,
	supports_4k: bool,
	session_length: Option<Duration>,
	state: Mutex<HostState>,
}

impl Default for SimulatedHost {
	fn default() -> Self {
		Self::new()
	}
}

impl SimulatedHost {
	pub fn new() -> Self {
		Self {
			hostname: "streamctl-sim".into(),
			gpu_type: "GeForce GTX 1080".into(),
			catalog: vec![
				AppCatalogEntry::new("Steam", 1),
				AppCatalogEntry::new("Desktop", 2),
			],
			supports_4k: false,
			session_length: None,
			state: Mutex::new(HostState::default()),
		}
	}

	pub fn with_catalog(mut self, catalog: Vec<AppCatalogEntry>) -> Self {
		self.catalog = catalog;
		self
	}

	pub fn with_4k(mut self, supports_4k: bool) -> Self {
		self.supports_4k = supports_4k;
		self
	}

	/// Ends every stream with [`SessionEnd::UserExit`] after `length`.
	pub fn with_session_length(mut self, length: Duration) -> Self {
		self.session_length = Some(length);
		self
	}

	pub fn hostname(&self) -> &str {
		&self.hostname
	}

	pub fn calls(&self) -> Vec<HostCall> {
		self.state.lock().calls.clone()
	}

	pub fn is_paired(&self) -> bool {
		self.state.lock().paired
	}

	pub fn running_app(&self) -> Option<u32> {
		self.state.lock().running_app
	}

	pub fn is_streaming(&self) -> bool {
		self.state.lock().streaming
	}

	fn record(&self, call: HostCall) {
		self.state.lock().calls.push(call);
	}

	fn require_paired(&self) -> RpcResult<()> {
		if self.state.lock().paired {
			Ok(())
		} else {
			Err(RpcStatus::new(GS_ERROR, "client is not paired"))
		}
	}

	fn check_mode(&self, geometry: &StreamGeometry) -> RpcResult<()> {
		if geometry.is_4k() && !self.supports_4k {
			return Err(RpcStatus::code(GS_NOT_SUPPORTED_4K));
		}
		let supported = SUPPORTED_MODES.contains(&(geometry.width, geometry.height)) && SUPPORTED_FPS.contains(&geometry.fps);
		if !supported && !self.state.lock().allow_unsupported {
			return Err(RpcStatus::code(GS_NOT_SUPPORTED_MODE));
		}
		Ok(())
	}
}

fn marker(key_dir: &Path, address: &str) -> PathBuf {
	key_dir.join(format!("{address}.paired"))
}

fn io_status(err: io::Error) -> RpcStatus {
	RpcStatus::new(GS_IO_ERROR, err.to_string())
}

#[async_trait]
impl GameStreamRpc for SimulatedHost {
	async fn init(&self, address: &str, key_dir: &Path, _debug_level: u8, allow_unsupported: bool) -> RpcResult<ServerInfo> {
		self.record(HostCall::Init(address.to_string()));
		if address.is_empty() {
			return Err(RpcStatus::new(GS_INVALID, "empty host address"));
		}
		if address.contains(['/', '\\']) || address.contains("..") {
			return Err(RpcStatus::new(GS_INVALID, "host address is not a host name"));
		}
		fs::create_dir_all(key_dir).map_err(io_status)?;
		let paired = marker(key_dir, address).exists();

		let mut state = self.state.lock();
		state.key_dir = Some(key_dir.to_path_buf());
		state.paired = paired;
		state.allow_unsupported = allow_unsupported;

		Ok(ServerInfo {
			address: address.to_string(),
			server_version: "7.1.431.0".into(),
			app_version: "7.1.431.0".into(),
			gs_version: "3.23.0.74".into(),
			gpu_type: self.gpu_type.clone(),
			paired,
			supports_4k: self.supports_4k,
		})
	}

	async fn pair(&self, server: &ServerInfo, pin: &str) -> RpcResult<()> {
		self.record(HostCall::Pair(pin.to_string()));
		if pin.len() != 4 || !pin.chars().all(|c| c.is_ascii_digit()) {
			return Err(RpcStatus::new(GS_ERROR, "PIN must be four digits"));
		}
		let key_dir = self.state.lock().key_dir.clone();
		if let Some(dir) = key_dir {
			fs::write(marker(&dir, &server.address), pin).map_err(io_status)?;
		}
		self.state.lock().paired = true;
		info!(target = "streamctl.sim", address = %server.address, "paired");
		Ok(())
	}

	async fn unpair(&self, server: &ServerInfo) -> RpcResult<()> {
		self.record(HostCall::Unpair);
		let key_dir = self.state.lock().key_dir.clone();
		if let Some(dir) = key_dir {
			match fs::remove_file(marker(&dir, &server.address)) {
				Ok(()) => {}
				Err(err) if err.kind() == io::ErrorKind::NotFound => {}
				Err(err) => return Err(io_status(err)),
			}
		}
		self.state.lock().paired = false;
		Ok(())
	}

	async fn app_list(&self, _server: &ServerInfo) -> RpcResult<Vec<AppCatalogEntry>> {
		self.record(HostCall::AppList);
		self.require_paired()?;
		Ok(self.catalog.clone())
	}

	async fn start_app(&self, _server: &ServerInfo, request: &StreamRequest) -> RpcResult<()> {
		self.record(HostCall::StartApp(request.app_id));
		self.require_paired()?;
		if !self.catalog.iter().any(|app| app.id == request.app_id) {
			return Err(RpcStatus::new(GS_ERROR, format!("no app with id {}", request.app_id)));
		}
		self.check_mode(&request.geometry)?;
		self.state.lock().running_app = Some(request.app_id);
		info!(target = "streamctl.sim", app_id = request.app_id, geometry = %request.geometry, "app launched");
		Ok(())
	}

	async fn quit_app(&self, _server: &ServerInfo) -> RpcResult<()> {
		self.record(HostCall::QuitApp);
		self.require_paired()?;
		let mut state = self.state.lock();
		if state.running_app.take().is_none() {
			return Err(RpcStatus::new(GS_ERROR, "no app is running"));
		}
		Ok(())
	}
}

#[async_trait]
impl ConnectionTransport for SimulatedHost {
	async fn start_connection(
		&self,
		_server: &ServerInfo,
		request: &StreamRequest,
		mut sinks: MediaSinks,
		_audio_device: Option<&str>,
		mut stop: StopSignal,
	) -> Result<SessionEnd, TransportError> {
		self.record(HostCall::StartConnection);
		{
			let mut state = self.state.lock();
			if state.running_app != Some(request.app_id) {
				return Err(TransportError::StageFailed {
					stage: "RTSP handshake".into(),
					code: GS_ERROR,
				});
			}
			state.streaming = true;
		}

		sinks.video.setup(&request.geometry, request.supports_hevc)?;
		sinks.audio.init(request.audio)?;

		let mut ticker = tokio::time::interval(tick_period(request.geometry.fps));
		ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
		let deadline = self.session_length.map(|length| Instant::now() + length);
		let unit = [0u8, 0, 0, 1, 0x65];
		let samples = [0i16; SAMPLES_PER_TICK];

		let end = loop {
			tokio::select! {
				_ = stop.raised() => break SessionEnd::Cancelled,
				_ = sleep_until_opt(deadline) => break SessionEnd::UserExit,
				_ = ticker.tick() => {
					sinks.video.submit(&unit);
					sinks.audio.play(&samples);
				}
			}
		};

		sinks.video.cleanup();
		sinks.audio.cleanup();
		self.state.lock().streaming = false;
		debug!(target = "streamctl.sim", ?end, "connection finished");
		Ok(end)
	}

	async fn stop_connection(&self) -> Result<(), TransportError> {
		self.record(HostCall::StopConnection);
		self.state.lock().streaming = false;
		Ok(())
	}
}

/// One frame at `fps`, never shorter than a millisecond.
fn tick_period(fps: u32) -> Duration {
	(Duration::from_secs(1) / fps.max(1)).max(MIN_TICK)
}

async fn sleep_until_opt(deadline: Option<Instant>) {
	match deadline {
		Some(deadline) => tokio::time::sleep_until(deadline).await,
		None => std::future::pending().await,
	}
}
