//! Streaming connection boundary and cooperative cancellation.

use async_trait::async_trait;
use streamctl_protocol::{ServerInfo, StreamRequest};
use thiserror::Error;
use tokio::sync::watch;

use crate::platform::MediaSinks;

/// Failures raised by the streaming transport.
#[derive(Debug, Error)]
pub enum TransportError {
	#[error("connection failed during {stage} (code {code})")]
	StageFailed { stage: String, code: i32 },

	#[error("sink setup failed: {0}")]
	Sink(String),

	#[error("no connection is active")]
	NotConnected,

	#[error(transparent)]
	Io(#[from] std::io::Error),
}

/// Why a stream ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
	/// The user performed the exit gesture.
	UserExit,
	/// The host closed the session.
	RemoteTerminated { reason: String },
	/// The stop signal was raised.
	Cancelled,
}

/// Sending half of the stop signal, owned by whoever may cancel a stream.
#[derive(Debug)]
pub struct StopHandle {
	tx: watch::Sender<bool>,
}

/// Receiving half checked by the transport's service loop.
#[derive(Debug, Clone)]
pub struct StopSignal {
	rx: watch::Receiver<bool>,
}

/// Creates a connected stop handle/signal pair, initially lowered.
pub fn stop_channel() -> (StopHandle, StopSignal) {
	let (tx, rx) = watch::channel(false);
	(StopHandle { tx }, StopSignal { rx })
}

impl StopHandle {
	pub fn raise(&self) {
		self.tx.send_replace(true);
	}

	/// Lowers the signal before a new stream starts.
	pub fn reset(&self) {
		self.tx.send_replace(false);
	}

	pub fn signal(&self) -> StopSignal {
		StopSignal { rx: self.tx.subscribe() }
	}
}

impl StopSignal {
	pub fn is_raised(&self) -> bool {
		*self.rx.borrow()
	}

	/// Resolves once the signal is raised. Never resolves if every
	/// [`StopHandle`] is dropped while lowered.
	pub async fn raised(&mut self) {
		if self.rx.wait_for(|raised| *raised).await.is_err() {
			std::future::pending::<()>().await;
		}
	}
}

/// The media connection to the host.
#[async_trait]
pub trait ConnectionTransport: Send + Sync {
	/// Starts the connection and blocks until the session ends.
	async fn start_connection(
		&self,
		server: &ServerInfo,
		request: &StreamRequest,
		sinks: MediaSinks,
		audio_device: Option<&str>,
		stop: StopSignal,
	) -> Result<SessionEnd, TransportError>;

	/// Tears the connection down. Safe to call after the session ended.
	async fn stop_connection(&self) -> Result<(), TransportError>;
}
