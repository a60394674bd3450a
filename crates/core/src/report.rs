//! User-facing output channels.
//!
//! Status lines (menus, catalogs, PINs) and diagnostics (every failure) are
//! kept on separate channels so failures never mix into normal output.

use colored::Colorize;
use parking_lot::Mutex;

/// Sink for everything the controller tells the user.
pub trait Reporter: Send + Sync {
	/// Normal progress and results.
	fn status(&self, message: &str);

	/// Failures and precondition messages.
	fn diagnostic(&self, message: &str);
}

/// Writes status lines to stdout and diagnostics to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdReporter;

impl Reporter for StdReporter {
	fn status(&self, message: &str) {
		println!("{message}");
	}

	fn diagnostic(&self, message: &str) {
		eprintln!("{} {message}", "error:".red().bold());
	}
}

/// Which channel a recorded line went to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
	Status(String),
	Diagnostic(String),
}

/// In-memory reporter used by tests and embedders that render output themselves.
#[derive(Debug, Default)]
pub struct RecordingReporter {
	lines: Mutex<Vec<Line>>,
}

impl RecordingReporter {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn lines(&self) -> Vec<Line> {
		self.lines.lock().clone()
	}

	pub fn statuses(&self) -> Vec<String> {
		self.lines
			.lock()
			.iter()
			.filter_map(|line| match line {
				Line::Status(msg) => Some(msg.clone()),
				Line::Diagnostic(_) => None,
			})
			.collect()
	}

	pub fn diagnostics(&self) -> Vec<String> {
		self.lines
			.lock()
			.iter()
			.filter_map(|line| match line {
				Line::Diagnostic(msg) => Some(msg.clone()),
				Line::Status(_) => None,
			})
			.collect()
	}
}

impl Reporter for RecordingReporter {
	fn status(&self, message: &str) {
		self.lines.lock().push(Line::Status(message.to_string()));
	}

	fn diagnostic(&self, message: &str) {
		self.lines.lock().push(Line::Diagnostic(message.to_string()));
	}
}
