//! Recording doubles for the collaborator traits.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use streamctl_protocol::{
	AppCatalogEntry, AudioConfiguration, RpcResult, RpcStatus, ServerInfo, StreamGeometry, StreamRequest,
};

use crate::client::GameStreamRpc;
use crate::locator::Discovery;
use crate::platform::{AudioSink, MediaSinks, PlatformId, PlatformRegistry, VideoSink};
use crate::transport::{ConnectionTransport, SessionEnd, StopSignal, TransportError};

pub fn sample_server(paired: bool) -> ServerInfo {
	ServerInfo {
		address: "192.168.1.50".into(),
		server_version: "3.23.0.74".into(),
		app_version: "7.1.431.0".into(),
		gs_version: "5.0.1".into(),
		gpu_type: "GeForce RTX 3070".into(),
		paired,
		supports_4k: false,
	}
}

/// Discovery that answers with a fixed address, or never.
pub struct StaticDiscovery {
	address: Option<String>,
	calls: AtomicUsize,
}

impl StaticDiscovery {
	pub fn found(address: &str) -> Self {
		Self {
			address: Some(address.to_string()),
			calls: AtomicUsize::new(0),
		}
	}

	pub fn silent() -> Self {
		Self {
			address: None,
			calls: AtomicUsize::new(0),
		}
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl Discovery for StaticDiscovery {
	async fn discover(&self, _timeout: Duration) -> std::io::Result<Option<String>> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		Ok(self.address.clone())
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpcCall {
	Init(String),
	Pair(String),
	Unpair,
	AppList,
	StartApp(StreamRequest),
	QuitApp,
}

#[derive(Default)]
struct RpcFailures {
	init: Option<RpcStatus>,
	pair: Option<RpcStatus>,
	unpair: Option<RpcStatus>,
	app_list: Option<RpcStatus>,
	start_app: Option<RpcStatus>,
	quit_app: Option<RpcStatus>,
}

/// GameStream RPC double. Failures stay armed until replaced.
pub struct MockRpc {
	calls: Mutex<Vec<RpcCall>>,
	failures: Mutex<RpcFailures>,
	catalog: Mutex<Vec<AppCatalogEntry>>,
}

impl MockRpc {
	pub fn new() -> Self {
		Self {
			calls: Mutex::new(Vec::new()),
			failures: Mutex::new(RpcFailures::default()),
			catalog: Mutex::new(vec![AppCatalogEntry::new("Steam", 1), AppCatalogEntry::new("Chrome", 2)]),
		}
	}

	pub fn fail_init(&self, status: RpcStatus) {
		self.failures.lock().init = Some(status);
	}

	pub fn fail_pair(&self, status: RpcStatus) {
		self.failures.lock().pair = Some(status);
	}

	pub fn succeed_pair(&self) {
		self.failures.lock().pair = None;
	}

	pub fn fail_unpair(&self, status: RpcStatus) {
		self.failures.lock().unpair = Some(status);
	}

	pub fn fail_app_list(&self, status: RpcStatus) {
		self.failures.lock().app_list = Some(status);
	}

	pub fn fail_start_app(&self, status: RpcStatus) {
		self.failures.lock().start_app = Some(status);
	}

	pub fn fail_quit_app(&self, status: RpcStatus) {
		self.failures.lock().quit_app = Some(status);
	}

	pub fn calls(&self) -> Vec<RpcCall> {
		self.calls.lock().clone()
	}

	pub fn count(&self, pred: impl Fn(&RpcCall) -> bool) -> usize {
		self.calls.lock().iter().filter(|call| pred(call)).count()
	}

	fn record(&self, call: RpcCall) {
		self.calls.lock().push(call);
	}

	fn outcome(&self, pick: impl Fn(&RpcFailures) -> &Option<RpcStatus>) -> RpcResult<()> {
		let failures = self.failures.lock();
		match pick(&*failures) {
			Some(status) => Err(status.clone()),
			None => Ok(()),
		}
	}
}

#[async_trait]
impl GameStreamRpc for MockRpc {
	async fn init(&self, address: &str, _key_dir: &Path, _debug_level: u8, _allow_unsupported: bool) -> RpcResult<ServerInfo> {
		self.record(RpcCall::Init(address.to_string()));
		self.outcome(|f| &f.init)?;
		Ok(ServerInfo {
			address: address.to_string(),
			..sample_server(false)
		})
	}

	async fn pair(&self, _server: &ServerInfo, pin: &str) -> RpcResult<()> {
		self.record(RpcCall::Pair(pin.to_string()));
		self.outcome(|f| &f.pair)
	}

	async fn unpair(&self, _server: &ServerInfo) -> RpcResult<()> {
		self.record(RpcCall::Unpair);
		self.outcome(|f| &f.unpair)
	}

	async fn app_list(&self, _server: &ServerInfo) -> RpcResult<Vec<AppCatalogEntry>> {
		self.record(RpcCall::AppList);
		self.outcome(|f| &f.app_list)?;
		Ok(self.catalog.lock().clone())
	}

	async fn start_app(&self, _server: &ServerInfo, request: &StreamRequest) -> RpcResult<()> {
		self.record(RpcCall::StartApp(request.clone()));
		self.outcome(|f| &f.start_app)
	}

	async fn quit_app(&self, _server: &ServerInfo) -> RpcResult<()> {
		self.record(RpcCall::QuitApp);
		self.outcome(|f| &f.quit_app)
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
	Start(StreamRequest),
	Stop,
}

/// Transport double. Ends every session immediately with `UserExit` unless
/// told to wait for the stop signal.
#[derive(Default)]
pub struct MockTransport {
	calls: Mutex<Vec<TransportCall>>,
	wait_for_stop: bool,
	fail_stop: bool,
}

impl MockTransport {
	pub fn waiting_for_stop() -> Self {
		Self {
			wait_for_stop: true,
			..Self::default()
		}
	}

	pub fn failing_stop() -> Self {
		Self {
			fail_stop: true,
			..Self::default()
		}
	}

	pub fn calls(&self) -> Vec<TransportCall> {
		self.calls.lock().clone()
	}
}

#[async_trait]
impl ConnectionTransport for MockTransport {
	async fn start_connection(
		&self,
		_server: &ServerInfo,
		request: &StreamRequest,
		mut sinks: MediaSinks,
		_audio_device: Option<&str>,
		mut stop: StopSignal,
	) -> Result<SessionEnd, TransportError> {
		self.calls.lock().push(TransportCall::Start(request.clone()));
		sinks.video.setup(&request.geometry, request.supports_hevc)?;
		sinks.audio.init(request.audio)?;
		let end = if self.wait_for_stop {
			stop.raised().await;
			SessionEnd::Cancelled
		} else {
			SessionEnd::UserExit
		};
		sinks.video.cleanup();
		sinks.audio.cleanup();
		Ok(end)
	}

	async fn stop_connection(&self) -> Result<(), TransportError> {
		self.calls.lock().push(TransportCall::Stop);
		if self.fail_stop {
			return Err(TransportError::NotConnected);
		}
		Ok(())
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformEvent {
	Start(String),
	Stop(String),
	VideoSetup { geometry: StreamGeometry, hevc: bool },
	AudioInit(AudioConfiguration),
}

/// Platform registry double knowing a fixed set of names.
pub struct MockPlatforms {
	names: Vec<String>,
	hevc: bool,
	gamepads: usize,
	events: std::sync::Arc<Mutex<Vec<PlatformEvent>>>,
}

impl MockPlatforms {
	pub fn new() -> Self {
		Self {
			names: vec!["fake".into()],
			hevc: false,
			gamepads: 1,
			events: Default::default(),
		}
	}

	pub fn with_hevc(mut self, hevc: bool) -> Self {
		self.hevc = hevc;
		self
	}

	pub fn with_gamepads(mut self, gamepads: usize) -> Self {
		self.gamepads = gamepads;
		self
	}

	pub fn events(&self) -> Vec<PlatformEvent> {
		self.events.lock().clone()
	}
}

struct RecordingVideo(std::sync::Arc<Mutex<Vec<PlatformEvent>>>);

impl VideoSink for RecordingVideo {
	fn setup(&mut self, geometry: &StreamGeometry, hevc: bool) -> Result<(), TransportError> {
		self.0.lock().push(PlatformEvent::VideoSetup { geometry: *geometry, hevc });
		Ok(())
	}

	fn submit(&mut self, _unit: &[u8]) {}

	fn cleanup(&mut self) {}
}

struct RecordingAudio(std::sync::Arc<Mutex<Vec<PlatformEvent>>>);

impl AudioSink for RecordingAudio {
	fn init(&mut self, configuration: AudioConfiguration) -> Result<(), TransportError> {
		self.0.lock().push(PlatformEvent::AudioInit(configuration));
		Ok(())
	}

	fn play(&mut self, _samples: &[i16]) {}

	fn cleanup(&mut self) {}
}

impl PlatformRegistry for MockPlatforms {
	fn resolve(&self, name: &str) -> Option<PlatformId> {
		if name == "auto" {
			return self.names.first().map(PlatformId::new);
		}
		self.names.iter().find(|known| *known == name).map(PlatformId::new)
	}

	fn supports_hevc(&self, _platform: &PlatformId) -> bool {
		self.hevc
	}

	fn start(&self, platform: &PlatformId) {
		self.events.lock().push(PlatformEvent::Start(platform.name().to_string()));
	}

	fn stop(&self, platform: &PlatformId) {
		self.events.lock().push(PlatformEvent::Stop(platform.name().to_string()));
	}

	fn video_sink(&self, _platform: &PlatformId) -> Box<dyn VideoSink> {
		Box::new(RecordingVideo(self.events.clone()))
	}

	fn audio_sink(&self, _platform: &PlatformId, _device: Option<&str>) -> Box<dyn AudioSink> {
		Box::new(RecordingAudio(self.events.clone()))
	}

	fn connected_gamepads(&self, _platform: &PlatformId) -> usize {
		self.gamepads
	}
}
