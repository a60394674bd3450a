//! Startup sequence and run modes.
//!
//! Startup resolves configuration (discovering the host if needed),
//! optionally saves it, connects, then either dispatches the single
//! command named on the command line or runs the interactive loop. Any
//! startup failure is fatal and maps to a non-zero exit code.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use streamctl::config::{ConfigPaths, save_config};
use streamctl::protocol::DISCOVERY_TIMEOUT_MS;
use streamctl::transport::stop_channel;
use streamctl::{
	Command, ConfigResolver, ConnectionTransport, ControllerContext, ControllerError, Discovery, Dispatcher,
	GameStreamRpc, HostLocator, PairingManager, PlatformRegistry, Reporter, Result, SessionClient, StdReporter,
	StopHandle,
};
use streamctl_runtime::{BuiltinPlatforms, SimulatedHost, UdpDiscovery};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cli::{Action, Cli, GlobalOptions};
use crate::input::{Input, LineCommands};

/// Everything the controller talks to.
pub struct Services {
	pub rpc: Arc<dyn GameStreamRpc>,
	pub transport: Arc<dyn ConnectionTransport>,
	pub discovery: Arc<dyn Discovery>,
	pub discovery_timeout: Duration,
	pub platforms: Arc<dyn PlatformRegistry>,
	pub reporter: Arc<dyn Reporter>,
}

impl Services {
	/// Broadcast discovery, the in-process host and the built-in platforms.
	pub fn builtin() -> Self {
		let host = Arc::new(SimulatedHost::new());
		Self {
			rpc: host.clone(),
			transport: host,
			discovery: Arc::new(UdpDiscovery::new()),
			discovery_timeout: Duration::from_millis(DISCOVERY_TIMEOUT_MS),
			platforms: Arc::new(BuiltinPlatforms::new()),
			reporter: Arc::new(StdReporter),
		}
	}
}

/// Runs the controller against the built-in services and stdin.
pub async fn run(cli: Cli) -> i32 {
	run_with(cli, Services::builtin(), LineCommands::stdin).await
}

/// Runs the controller and returns the process exit code.
pub async fn run_with<F>(cli: Cli, services: Services, input: F) -> i32
where
	F: FnOnce(Arc<dyn Reporter>) -> LineCommands,
{
	let reporter = services.reporter.clone();
	match execute(cli, services, input).await {
		Ok(()) => 0,
		Err(err) => {
			reporter.diagnostic(&err.to_string());
			1
		}
	}
}

fn command_for(action: &Action) -> Option<Command> {
	match action {
		Action::Pair(_) => Some(Command::Pair),
		Action::Unpair(_) => Some(Command::Unpair),
		Action::Stream(_) => Some(Command::Stream),
		Action::List(_) => Some(Command::List),
		Action::Quit(_) => Some(Command::QuitApp),
		Action::Map { .. } => None,
	}
}

fn data_dir(global: &GlobalOptions) -> Result<PathBuf> {
	if let Some(dir) = &global.data_dir {
		return Ok(dir.clone());
	}
	dirs::config_dir()
		.map(|dir| dir.join("streamctl"))
		.ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no configuration directory; pass --data-dir").into())
}

async fn execute<F>(cli: Cli, services: Services, input: F) -> Result<()>
where
	F: FnOnce(Arc<dyn Reporter>) -> LineCommands,
{
	let reporter = services.reporter.clone();
	let command = match &cli.action {
		Some(Action::Map { .. }) => return Err(ControllerError::Unsupported),
		Some(action) => command_for(action),
		None => None,
	};

	let mut paths = ConfigPaths::in_dir(&data_dir(&cli.global)?);
	if let Some(global) = &cli.global.config {
		paths = paths.with_global(global.clone());
	}
	let locator = HostLocator::new(services.discovery.clone()).with_timeout(services.discovery_timeout);
	let resolution = ConfigResolver::new(&paths, &locator)
		.resolve(cli.layer(), reporter.as_ref())
		.await?;
	let config = resolution.config;

	if let Some(path) = &cli.global.save {
		save_config(path, &config)?;
		info!(target = "streamctl", path = %path.display(), "configuration saved");
	}

	reporter.status(&format!("Connect to {}...", config.address));
	let client = SessionClient::new(services.rpc, services.transport);
	let server = client
		.init(&config.address, &config.key_dir, config.debug_level, config.unsupported)
		.await
		.map_err(|source| ControllerError::Connect {
			address: config.address.clone(),
			source,
		})?;
	if config.debug_level > 0 {
		let info = server.info();
		reporter.status(&format!(
			"NVIDIA {}, GFE {} ({}, {})",
			info.gpu_type, info.server_version, info.gs_version, info.app_version
		));
	}

	let (stop, _) = stop_channel();
	let stop = Arc::new(stop);
	let mut dispatcher = Dispatcher::new(
		ControllerContext { server, config },
		client,
		services.platforms,
		reporter.clone(),
		PairingManager::from_entropy(),
		stop.clone(),
	);

	match command {
		Some(command) => {
			let interrupt = traps_interrupt(command).then(|| watch_interrupts(stop, None));
			let result = dispatcher.execute(command).await;
			if let Some(interrupt) = interrupt {
				interrupt.abort();
			}
			result.map(|_| ())
		}
		None => {
			let mut source = input(reporter.clone());
			let interrupt = watch_interrupts(stop, Some(source.sender()));
			dispatcher.run(&mut source).await;
			interrupt.abort();
			Ok(())
		}
	}
}

/// One-shot commands other than `stream` keep the default Ctrl-C action,
/// so a stuck request can still be interrupted.
fn traps_interrupt(command: Command) -> bool {
	command == Command::Stream
}

/// Ctrl-C ends a running stream and, in interactive mode, the loop too.
fn watch_interrupts(stop: Arc<StopHandle>, quit: Option<mpsc::UnboundedSender<Input>>) -> JoinHandle<()> {
	tokio::spawn(async move {
		while tokio::signal::ctrl_c().await.is_ok() {
			debug!(target = "streamctl", "interrupt");
			stop.raise();
			if let Some(tx) = &quit {
				let _ = tx.send(Input::Command(Command::Quit));
			}
		}
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn only_streaming_traps_ctrl_c() {
		assert!(traps_interrupt(Command::Stream));
		for command in [Command::List, Command::Pair, Command::Unpair, Command::QuitApp] {
			assert!(!traps_interrupt(command), "{command:?}");
		}
	}
}
