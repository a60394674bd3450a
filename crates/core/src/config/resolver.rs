//! Merges global, host-specific and command-line layers.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::{ConfigLayer, SessionConfig, load_layer};
use crate::error::Result;
use crate::locator::HostLocator;
use crate::report::Reporter;

const ADDRESS_PLACEHOLDER: &str = "{address}";

/// Where configuration and trust material live on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
	pub global: PathBuf,
	/// Host override path with an `{address}` placeholder.
	pub host_template: String,
	pub key_dir: PathBuf,
}

impl ConfigPaths {
	/// Standard layout under one data directory.
	pub fn in_dir(dir: &Path) -> Self {
		Self {
			global: dir.join("streamctl.ini"),
			host_template: dir.join("hosts").join(format!("{ADDRESS_PLACEHOLDER}.ini")).to_string_lossy().into_owned(),
			key_dir: dir.join("key"),
		}
	}

	pub fn with_global(mut self, global: PathBuf) -> Self {
		self.global = global;
		self
	}

	/// Host override file for `address`, or `None` when the address could
	/// name a path outside the hosts directory.
	pub fn host_file(&self, address: &str) -> Option<PathBuf> {
		if !is_plain_address(address) {
			return None;
		}
		Some(PathBuf::from(self.host_template.replace(ADDRESS_PLACEHOLDER, address)))
	}
}

/// Accepts host names and IP literals, nothing that reads as a path.
fn is_plain_address(address: &str) -> bool {
	!address.is_empty()
		&& !address.contains("..")
		&& address
			.chars()
			.all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | ':' | '_' | '%'))
}

/// Outcome of configuration resolution.
#[derive(Debug, Clone)]
pub struct Resolution {
	pub config: SessionConfig,
	/// Host override path derived from the resolved address.
	pub host_file: Option<PathBuf>,
	/// Whether the host override file was found and merged.
	pub host_file_applied: bool,
}

/// Builds the immutable [`SessionConfig`] for one run.
pub struct ConfigResolver<'a> {
	paths: &'a ConfigPaths,
	locator: &'a HostLocator,
}

impl<'a> ConfigResolver<'a> {
	pub fn new(paths: &'a ConfigPaths, locator: &'a HostLocator) -> Self {
		Self { paths, locator }
	}

	/// Merges global < host override < `cli`.
	///
	/// Only a malformed global file is an error; the host file is applied
	/// when readable and skipped otherwise. When neither the global file nor
	/// `cli` names an address, the locator runs before the host file is read.
	pub async fn resolve(&self, cli: ConfigLayer, reporter: &dyn Reporter) -> Result<Resolution> {
		let global = load_layer(&self.paths.global)?.unwrap_or_default();
		let known_address = cli.address.clone().or_else(|| global.address.clone());
		let address = self.locator.locate(known_address.as_deref(), reporter).await?;

		let host_file = self.paths.host_file(&address);
		let host = match host_file.as_deref().map(load_layer) {
			Some(Ok(Some(layer))) => {
				info!(target = "streamctl.config", address = %address, "applying host overrides");
				Some(layer)
			}
			Some(Ok(None)) => None,
			Some(Err(err)) => {
				warn!(target = "streamctl.config", error = %err, "skipping unreadable host overrides");
				None
			}
			None => {
				warn!(target = "streamctl.config", %address, "address is not usable as a file name; no host overrides");
				None
			}
		};
		let host_file_applied = host.is_some();

		let mut host = host.unwrap_or_default();
		host.address = None;
		let merged = global.merge(host).merge(cli);
		let config = merged.into_config(address, self.paths.key_dir.clone());

		if let Ok(json) = serde_json::to_string(&config) {
			debug!(target = "streamctl.config", config = %json, "effective configuration");
		}

		Ok(Resolution {
			config,
			host_file,
			host_file_applied,
		})
	}
}
