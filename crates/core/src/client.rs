//! Session client over the GameStream RPC surface.
//!
//! [`GameStreamRpc`] is the raw library boundary and speaks integer status
//! codes. [`SessionClient`] is the only caller of it: every result is decoded
//! into [`ConnectionError`] here so orchestration code never sees a code.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use streamctl_protocol::{AppCatalogEntry, RpcResult, ServerInfo, StreamRequest};
use tracing::{debug, info, warn};

use crate::error::ConnectionError;
use crate::platform::MediaSinks;
use crate::transport::{ConnectionTransport, SessionEnd, StopSignal, TransportError};

/// Raw RPC operations exposed by the GameStream client library.
#[async_trait]
pub trait GameStreamRpc: Send + Sync {
	/// Connects to `address`, loading or creating client keys under `key_dir`.
	async fn init(&self, address: &str, key_dir: &Path, debug_level: u8, allow_unsupported: bool) -> RpcResult<ServerInfo>;

	async fn pair(&self, server: &ServerInfo, pin: &str) -> RpcResult<()>;

	async fn unpair(&self, server: &ServerInfo) -> RpcResult<()>;

	async fn app_list(&self, server: &ServerInfo) -> RpcResult<Vec<AppCatalogEntry>>;

	/// Launches (or resumes) `request.app_id` with the requested stream shape.
	async fn start_app(&self, server: &ServerInfo, request: &StreamRequest) -> RpcResult<()>;

	/// Quits whatever application the host is currently running.
	async fn quit_app(&self, server: &ServerInfo) -> RpcResult<()>;
}

/// One remote host for the lifetime of the controller.
///
/// `paired` is the only mutable state and only [`crate::pairing`] flips it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerHandle {
	info: ServerInfo,
	paired: bool,
}

impl ServerHandle {
	pub fn new(info: ServerInfo) -> Self {
		let paired = info.paired;
		Self { info, paired }
	}

	pub fn info(&self) -> &ServerInfo {
		&self.info
	}

	pub fn address(&self) -> &str {
		&self.info.address
	}

	pub fn is_paired(&self) -> bool {
		self.paired
	}

	pub(crate) fn set_paired(&mut self, paired: bool) {
		self.paired = paired;
	}
}

/// Normalizing wrapper around the RPC surface and the streaming transport.
#[derive(Clone)]
pub struct SessionClient {
	rpc: Arc<dyn GameStreamRpc>,
	transport: Arc<dyn ConnectionTransport>,
}

impl SessionClient {
	pub fn new(rpc: Arc<dyn GameStreamRpc>, transport: Arc<dyn ConnectionTransport>) -> Self {
		Self { rpc, transport }
	}

	/// Establishes the server handle. Any failure leaves no handle.
	pub async fn init(&self, address: &str, key_dir: &Path, debug_level: u8, allow_unsupported: bool) -> Result<ServerHandle, ConnectionError> {
		debug!(target = "streamctl.client", %address, key_dir = %key_dir.display(), "init");
		let mut info = self
			.rpc
			.init(address, key_dir, debug_level, allow_unsupported)
			.await
			.map_err(ConnectionError::from)?;
		if info.address.is_empty() {
			info.address = address.to_string();
		}
		info!(
			target = "streamctl.client",
			address = %info.address,
			gpu = %info.gpu_type,
			server_version = %info.server_version,
			paired = info.paired,
			"connected"
		);
		Ok(ServerHandle::new(info))
	}

	pub async fn pair(&self, server: &ServerHandle, pin: &str) -> Result<(), ConnectionError> {
		self.rpc.pair(server.info(), pin).await.map_err(ConnectionError::from)
	}

	pub async fn unpair(&self, server: &ServerHandle) -> Result<(), ConnectionError> {
		self.rpc.unpair(server.info()).await.map_err(ConnectionError::from)
	}

	/// Fetches the catalog, surfacing the failure.
	pub async fn try_list_apps(&self, server: &ServerHandle) -> Result<Vec<AppCatalogEntry>, ConnectionError> {
		self.rpc.app_list(server.info()).await.map_err(ConnectionError::from)
	}

	/// Fetches the catalog. A failure is logged and yields an empty list,
	/// since listing is cheap for the user to retry.
	pub async fn list_apps(&self, server: &ServerHandle) -> Vec<AppCatalogEntry> {
		match self.try_list_apps(server).await {
			Ok(apps) => apps,
			Err(err) => {
				warn!(target = "streamctl.client", error = %err, "can't get app list");
				Vec::new()
			}
		}
	}

	pub async fn start_app(&self, server: &ServerHandle, request: &StreamRequest) -> Result<(), ConnectionError> {
		debug!(target = "streamctl.client", app_id = request.app_id, gamepad_mask = request.gamepad_mask, "start app");
		self.rpc.start_app(server.info(), request).await.map_err(ConnectionError::from)
	}

	pub async fn quit_app(&self, server: &ServerHandle) -> Result<(), ConnectionError> {
		self.rpc.quit_app(server.info()).await.map_err(ConnectionError::from)
	}

	/// Runs the media connection until the session ends.
	pub async fn run_connection(
		&self,
		server: &ServerHandle,
		request: &StreamRequest,
		sinks: MediaSinks,
		audio_device: Option<&str>,
		stop: StopSignal,
	) -> Result<SessionEnd, TransportError> {
		self.transport
			.start_connection(server.info(), request, sinks, audio_device, stop)
			.await
	}

	/// Stops the media connection.
	pub async fn stop(&self) -> Result<(), TransportError> {
		self.transport.stop_connection().await
	}
}

#[cfg(test)]
mod tests {
	use std::path::PathBuf;

	use streamctl_protocol::{GS_ERROR, GS_INVALID, GS_OUT_OF_MEMORY, GS_UNSUPPORTED_VERSION, RpcStatus};

	use super::*;
	use crate::testing::{MockRpc, MockTransport, RpcCall, sample_server};

	fn client(rpc: &Arc<MockRpc>) -> SessionClient {
		SessionClient::new(rpc.clone(), Arc::new(MockTransport::default()))
	}

	#[tokio::test]
	async fn init_populates_metadata() {
		let rpc = Arc::new(MockRpc::new());
		let handle = client(&rpc)
			.init("192.168.1.50", &PathBuf::from("/keys"), 0, false)
			.await
			.unwrap();

		assert_eq!(handle.address(), "192.168.1.50");
		assert_eq!(handle.info().gpu_type, "GeForce RTX 3070");
		assert!(!handle.is_paired());
		assert_eq!(rpc.calls(), vec![RpcCall::Init("192.168.1.50".into())]);
	}

	#[tokio::test]
	async fn init_failures_are_decoded() {
		for (status, expected) in [
			(RpcStatus::code(GS_OUT_OF_MEMORY), ConnectionError::OutOfMemory),
			(RpcStatus::new(GS_ERROR, "timeout"), ConnectionError::Protocol("timeout".into())),
			(RpcStatus::new(GS_INVALID, "no xml"), ConnectionError::InvalidServerData("no xml".into())),
			(
				RpcStatus::new(GS_UNSUPPORTED_VERSION, "GFE 2.0"),
				ConnectionError::UnsupportedServerVersion("GFE 2.0".into()),
			),
		] {
			let rpc = Arc::new(MockRpc::new());
			rpc.fail_init(status);
			let err = client(&rpc).init("h", Path::new("/k"), 0, false).await.unwrap_err();
			assert_eq!(err, expected);
		}
	}

	#[tokio::test]
	async fn list_apps_swallows_failures() {
		let rpc = Arc::new(MockRpc::new());
		rpc.fail_app_list(RpcStatus::new(GS_ERROR, "busy"));
		let server = ServerHandle::new(sample_server(true));

		assert!(client(&rpc).list_apps(&server).await.is_empty());
		assert_eq!(
			client(&rpc).try_list_apps(&server).await.unwrap_err(),
			ConnectionError::Protocol("busy".into())
		);
	}

	#[tokio::test]
	async fn catalog_is_fetched_on_every_call() {
		let rpc = Arc::new(MockRpc::new());
		let server = ServerHandle::new(sample_server(true));
		let client = client(&rpc);

		client.list_apps(&server).await;
		client.list_apps(&server).await;

		assert_eq!(rpc.count(|c| matches!(c, RpcCall::AppList)), 2);
	}
}
