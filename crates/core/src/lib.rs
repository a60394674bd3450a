//! Session controller for GameStream hosts.
//!
//! `streamctl` decides which network operation to perform next given the
//! host's pairing state and user input. It merges configuration layers,
//! locates the host, normalizes RPC result codes and runs the
//! resolve → launch → stream → teardown sequence for each stream attempt.
//!
//! The transport, cryptographic handshake, media pipeline and discovery
//! mechanism are collaborators reached through the traits in [`client`],
//! [`locator`], [`platform`] and [`transport`]; `streamctl-runtime`
//! provides concrete implementations.

pub mod client;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod locator;
pub mod orchestrator;
pub mod pairing;
pub mod platform;
pub mod report;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{GameStreamRpc, ServerHandle, SessionClient};
pub use config::{ConfigLayer, ConfigPaths, ConfigResolver, SessionConfig};
pub use dispatcher::{Command, CommandSource, ControllerContext, Dispatcher, Flow};
pub use error::{ConfigError, ConnectionError, ControllerError, NegotiationFailure, Result};
pub use locator::{Discovery, HostLocator};
pub use orchestrator::{StreamOrchestrator, StreamState};
pub use pairing::{PairingManager, Pin};
pub use platform::{AudioSink, MediaSinks, PlatformId, PlatformRegistry, VideoSink};
pub use report::{RecordingReporter, Reporter, StdReporter};
pub use transport::{ConnectionTransport, SessionEnd, StopHandle, StopSignal, TransportError};

pub use streamctl_protocol as protocol;
