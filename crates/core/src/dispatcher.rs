//! Command dispatch loop.
//!
//! The dispatcher owns the [`ControllerContext`] and maps each command to
//! the pairing manager, the session client or the stream orchestrator. A
//! failed command is reported and the loop carries on; only
//! [`Command::Quit`] ends it.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::client::{ServerHandle, SessionClient};
use crate::config::SessionConfig;
use crate::error::{ControllerError, Result};
use crate::orchestrator::StreamOrchestrator;
use crate::pairing::{PairingManager, pair_check};
use crate::platform::PlatformRegistry;
use crate::report::Reporter;
use crate::transport::{SessionEnd, StopHandle};

/// Discrete user commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
	List,
	Stream,
	Pair,
	Unpair,
	/// Ask the host to close whatever app is running.
	QuitApp,
	Quit,
	None,
}

impl Command {
	/// Parses one line of interactive input. Blank input is [`Command::None`];
	/// anything unrecognised yields `None`.
	pub fn parse(input: &str) -> Option<Command> {
		let command = match input.trim().to_ascii_lowercase().as_str() {
			"" => Command::None,
			"a" | "list" => Command::List,
			"b" | "stream" => Command::Stream,
			"x" | "pair" => Command::Pair,
			"y" | "unpair" => Command::Unpair,
			"quitapp" => Command::QuitApp,
			"+" | "q" | "quit" | "exit" => Command::Quit,
			_ => return None,
		};
		Some(command)
	}
}

pub const MENU: &[&str] = &["A: list", "B: stream", "X: pair", "Y: unpair", "+: quit"];

/// Where the interactive loop gets its next command from.
#[async_trait]
pub trait CommandSource: Send {
	/// Waits for the next command. Sources that run dry return `Quit`.
	async fn next_command(&mut self) -> Command;
}

/// State shared by every command for one run.
#[derive(Debug, Clone)]
pub struct ControllerContext {
	pub server: ServerHandle,
	pub config: SessionConfig,
}

/// Whether the loop should keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
	Continue,
	Quit,
}

pub struct Dispatcher {
	context: ControllerContext,
	client: SessionClient,
	platforms: Arc<dyn PlatformRegistry>,
	reporter: Arc<dyn Reporter>,
	pairing: PairingManager,
	orchestrator: StreamOrchestrator,
	stop: Arc<StopHandle>,
}

impl Dispatcher {
	pub fn new(
		context: ControllerContext,
		client: SessionClient,
		platforms: Arc<dyn PlatformRegistry>,
		reporter: Arc<dyn Reporter>,
		pairing: PairingManager,
		stop: Arc<StopHandle>,
	) -> Self {
		let orchestrator = StreamOrchestrator::new(client.clone(), platforms.clone(), reporter.clone());
		Self {
			context,
			client,
			platforms,
			reporter,
			pairing,
			orchestrator,
			stop,
		}
	}

	pub fn context(&self) -> &ControllerContext {
		&self.context
	}

	pub fn orchestrator(&self) -> &StreamOrchestrator {
		&self.orchestrator
	}

	pub fn print_menu(&self) {
		self.reporter.status("");
		for line in MENU {
			self.reporter.status(line);
		}
		self.reporter.status("");
	}

	/// Runs one command, surfacing its failure.
	pub async fn execute(&mut self, command: Command) -> Result<Flow> {
		debug!(target = "streamctl.dispatcher", ?command, paired = self.context.server.is_paired(), "execute");
		match command {
			Command::List => {
				self.require_paired()?;
				let apps = self
					.client
					.try_list_apps(&self.context.server)
					.await
					.map_err(ControllerError::Catalog)?;
				for (index, app) in apps.iter().enumerate() {
					self.reporter.status(&format!("{}. {}", index + 1, app.name));
				}
			}
			Command::Stream => {
				self.require_paired()?;
				self.stream().await?;
			}
			Command::Pair => {
				self.pairing
					.pair(&self.client, &mut self.context.server, self.reporter.as_ref())
					.await?;
			}
			Command::Unpair => {
				self.pairing
					.unpair(&self.client, &mut self.context.server, self.reporter.as_ref())
					.await?;
			}
			Command::QuitApp => {
				self.require_paired()?;
				self.reporter.status("Sending app quit request ...");
				self.client
					.quit_app(&self.context.server)
					.await
					.map_err(ControllerError::QuitApp)?;
			}
			Command::Quit => return Ok(Flow::Quit),
			Command::None => {}
		}
		Ok(Flow::Continue)
	}

	/// Runs one command and reports any failure on the diagnostic channel.
	pub async fn dispatch(&mut self, command: Command) -> Flow {
		match self.execute(command).await {
			Ok(flow) => flow,
			Err(err) => {
				self.reporter.diagnostic(&err.to_string());
				Flow::Continue
			}
		}
	}

	/// Prints the menu and dispatches commands until `Quit`.
	pub async fn run(&mut self, source: &mut dyn CommandSource) {
		self.print_menu();
		loop {
			let command = source.next_command().await;
			if self.dispatch(command).await == Flow::Quit {
				info!(target = "streamctl.dispatcher", "quit");
				break;
			}
		}
	}

	fn require_paired(&self) -> Result<()> {
		if pair_check(&self.context.server) {
			Ok(())
		} else {
			Err(ControllerError::PreconditionNotMet)
		}
	}

	async fn stream(&mut self) -> Result<()> {
		let name = self.context.config.platform.clone();
		let platform = self
			.platforms
			.resolve(&name)
			.ok_or(ControllerError::PlatformNotFound { name })?;
		if self.context.config.debug_level > 0 {
			self.reporter
				.status(&format!("Beginning streaming on platform {platform}"));
		}

		self.stop.reset();
		let end = self
			.orchestrator
			.run(&self.context.server, &self.context.config, &platform, self.stop.signal())
			.await?;
		if let SessionEnd::RemoteTerminated { reason } = end {
			self.reporter.status(&format!("Connection terminated: {reason}"));
		}
		Ok(())
	}
}
