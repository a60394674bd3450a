//! Wire-level types shared by the streamctl controller and its backends.
//!
//! This crate holds the shapes of data exchanged with a GameStream host:
//! the raw status codes the RPC layer reports, catalog entries, stream
//! geometry and the discovery datagrams.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! * Pure data: no behavior beyond serialization and small derivations
//! * Stable: changes only when the host-facing contract changes
//!
//! Orchestration and error normalization live in `streamctl-core`.

pub mod discovery;
pub mod status;
pub mod types;

pub use discovery::*;
pub use status::*;
pub use types::*;
