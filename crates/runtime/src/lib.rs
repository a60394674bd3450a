//! Concrete collaborators for the `streamctl` controller.
//!
//! * [`discovery`]: UDP broadcast host discovery.
//! * [`platform`]: the built-in platform registry (`fake`, `auto`).
//! * [`sim`]: an in-process GameStream host implementing both the RPC
//!   surface and the streaming transport.

pub mod discovery;
pub mod platform;
pub mod sim;

pub use discovery::{UdpDiscovery, answer_probes};
pub use platform::BuiltinPlatforms;
pub use sim::{HostCall, SimulatedHost};
