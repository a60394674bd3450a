//! Host address resolution.
//!
//! A configured address is used as-is. Otherwise one discovery attempt is
//! made with a bounded wait; there is no retry, and a timeout aborts startup.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use streamctl_protocol::DISCOVERY_TIMEOUT_MS;
use tracing::{debug, info};

use crate::error::{ControllerError, Result};
use crate::report::Reporter;

/// Finds a streaming host on the local network.
#[async_trait]
pub trait Discovery: Send + Sync {
	/// Blocks until a host answers or `timeout` elapses. `Ok(None)` means
	/// nobody answered in time.
	async fn discover(&self, timeout: Duration) -> io::Result<Option<String>>;
}

/// Resolves the address of the host to control.
pub struct HostLocator {
	discovery: Arc<dyn Discovery>,
	timeout: Duration,
}

impl HostLocator {
	pub fn new(discovery: Arc<dyn Discovery>) -> Self {
		Self {
			discovery,
			timeout: Duration::from_millis(DISCOVERY_TIMEOUT_MS),
		}
	}

	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;
		self
	}

	pub fn timeout(&self) -> Duration {
		self.timeout
	}

	/// Returns `configured` unchanged when set, otherwise discovers a host.
	pub async fn locate(&self, configured: Option<&str>, reporter: &dyn Reporter) -> Result<String> {
		if let Some(address) = configured.filter(|a| !a.is_empty()) {
			debug!(target = "streamctl.locator", %address, "using configured address");
			return Ok(address.to_string());
		}

		reporter.status("Searching for server...");
		match self.discovery.discover(self.timeout).await? {
			Some(address) => {
				info!(target = "streamctl.locator", %address, "discovered host");
				Ok(address)
			}
			None => Err(ControllerError::DiscoveryTimeout { timeout: self.timeout }),
		}
	}
}
