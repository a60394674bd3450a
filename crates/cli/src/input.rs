//! Interactive command input.
//!
//! A helper thread reads lines and forwards parsed commands over a channel;
//! the dispatcher awaits them one per iteration. End of input is a quit.

use std::io::BufRead;
use std::sync::Arc;

use async_trait::async_trait;
use streamctl::{Command, CommandSource, Reporter};
use tokio::sync::mpsc;
use tracing::debug;

/// One line of input, parsed or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
	Command(Command),
	Unknown(String),
}

pub struct LineCommands {
	rx: mpsc::UnboundedReceiver<Input>,
	tx: mpsc::UnboundedSender<Input>,
	reporter: Arc<dyn Reporter>,
}

impl LineCommands {
	/// Starts a thread reading commands from `reader`.
	pub fn spawn<R: BufRead + Send + 'static>(reader: R, reporter: Arc<dyn Reporter>) -> Self {
		let (tx, rx) = mpsc::unbounded_channel();
		let lines_tx = tx.clone();
		std::thread::spawn(move || {
			for line in reader.lines() {
				let Ok(line) = line else { break };
				let input = match Command::parse(&line) {
					Some(command) => Input::Command(command),
					None => Input::Unknown(line.trim().to_string()),
				};
				if lines_tx.send(input).is_err() {
					break;
				}
			}
			debug!(target = "streamctl.input", "input closed");
			let _ = lines_tx.send(Input::Command(Command::Quit));
		});
		Self { rx, tx, reporter }
	}

	pub fn stdin(reporter: Arc<dyn Reporter>) -> Self {
		Self::spawn(std::io::BufReader::new(std::io::stdin()), reporter)
	}

	/// Handle for injecting commands from elsewhere, e.g. a signal handler.
	pub fn sender(&self) -> mpsc::UnboundedSender<Input> {
		self.tx.clone()
	}
}

#[async_trait]
impl CommandSource for LineCommands {
	async fn next_command(&mut self) -> Command {
		loop {
			match self.rx.recv().await {
				Some(Input::Command(command)) => return command,
				Some(Input::Unknown(text)) => self.reporter.diagnostic(&format!("Unknown command: {text}")),
				None => return Command::Quit,
			}
		}
	}
}
