use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use streamctl::ConfigLayer;
use streamctl::protocol::Codec;

#[derive(Parser, Debug)]
#[command(name = "streamctl")]
#[command(about = "Pair with a GameStream host, list its apps and stream them")]
#[command(version)]
#[command(after_help = "Use Ctrl+C to end a streaming session.")]
pub struct Cli {
	#[command(subcommand)]
	pub action: Option<Action>,

	#[command(flatten)]
	pub global: GlobalOptions,

	#[command(flatten)]
	pub stream: StreamOptions,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Action {
	/// Pair device with computer
	Pair(Target),
	/// Unpair device with computer
	Unpair(Target),
	/// Stream computer to device
	Stream(Target),
	/// List available games and applications
	List(Target),
	/// Quit the application or game being streamed
	Quit(Target),
	/// Create mapping for gamepad
	Map {
		/// Evdev input device to map
		input: Option<PathBuf>,
	},
}

impl Action {
	pub fn host(&self) -> Option<&str> {
		match self {
			Action::Pair(t) | Action::Unpair(t) | Action::Stream(t) | Action::List(t) | Action::Quit(t) => t.host.as_deref(),
			Action::Map { .. } => None,
		}
	}
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct Target {
	/// Host address; discovered on the local network when omitted
	pub host: Option<String>,
}

#[derive(Args, Debug, Default)]
pub struct GlobalOptions {
	/// Load configuration file
	#[arg(short, long, global = true, value_name = "FILE")]
	pub config: Option<PathBuf>,

	/// Save the effective configuration to file
	#[arg(long, global = true, value_name = "FILE")]
	pub save: Option<PathBuf>,

	/// Enable verbose output (repeat for more)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Enable verbose and debug output
	#[arg(long, global = true)]
	pub debug: bool,

	/// Directory holding streamctl.ini, hosts/ and key/
	#[arg(long, global = true, value_name = "DIR")]
	pub data_dir: Option<PathBuf>,
}

impl GlobalOptions {
	/// 0 quiet, 1 verbose, 2 debug.
	pub fn debug_level(&self) -> u8 {
		if self.debug { 2 } else { self.verbose.min(2) }
	}
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
	#[value(name = "720")]
	Hd,
	#[value(name = "1080")]
	FullHd,
	#[value(name = "4k")]
	Uhd,
}

impl Resolution {
	pub fn dimensions(self) -> (u32, u32) {
		match self {
			Resolution::Hd => (1280, 720),
			Resolution::FullHd => (1920, 1080),
			Resolution::Uhd => (3840, 2160),
		}
	}
}

#[derive(Args, Debug, Default)]
pub struct StreamOptions {
	/// Preset resolution
	#[arg(long, global = true, value_enum)]
	pub resolution: Option<Resolution>,

	/// Horizontal resolution (default 1280)
	#[arg(long, global = true)]
	pub width: Option<u32>,

	/// Vertical resolution (default 720)
	#[arg(long, global = true)]
	pub height: Option<u32>,

	/// Frame rate (default 60)
	#[arg(long, global = true)]
	pub fps: Option<u32>,

	/// Bitrate in Kbps
	#[arg(long, global = true)]
	pub bitrate: Option<u32>,

	/// Maximum packet size in bytes
	#[arg(long = "packetsize", global = true, value_name = "SIZE")]
	pub packet_size: Option<u32>,

	/// Codec: auto, h264 or h265
	#[arg(long, global = true)]
	pub codec: Option<Codec>,

	/// Enable remote optimizations
	#[arg(long, global = true)]
	pub remote: bool,

	/// Name of app to stream
	#[arg(long, global = true)]
	pub app: Option<String>,

	/// Don't allow the host to modify game settings
	#[arg(long, global = true)]
	pub nosops: bool,

	/// Play audio locally on the host
	#[arg(long, global = true)]
	pub localaudio: bool,

	/// Stream 5.1 surround sound
	#[arg(long, global = true)]
	pub surround: bool,

	/// Load encryption keys from directory
	#[arg(long, global = true, value_name = "DIR")]
	pub keydir: Option<PathBuf>,

	/// Gamepad mappings file
	#[arg(long, global = true, value_name = "FILE")]
	pub mapping: Option<PathBuf>,

	/// Platform used for audio, video and input (default auto)
	#[arg(long, global = true)]
	pub platform: Option<String>,

	/// Try streaming if the host version or mode is unsupported
	#[arg(long, global = true)]
	pub unsupported: bool,

	/// Audio output device
	#[arg(long, global = true, value_name = "DEVICE")]
	pub audio: Option<String>,

	/// Display the stream in a window
	#[arg(long, global = true)]
	pub windowed: bool,
}

fn flag(set: bool) -> Option<bool> {
	set.then_some(true)
}

impl Cli {
	/// The command-line configuration layer. Switches only override lower
	/// layers when given.
	pub fn layer(&self) -> ConfigLayer {
		let s = &self.stream;
		let (preset_width, preset_height) = s.resolution.map(Resolution::dimensions).unzip();
		let debug_level = self.global.debug_level();

		ConfigLayer {
			address: self.action.as_ref().and_then(Action::host).map(str::to_string),
			width: s.width.or(preset_width),
			height: s.height.or(preset_height),
			fps: s.fps,
			bitrate: s.bitrate,
			packet_size: s.packet_size,
			codec: s.codec,
			remote: flag(s.remote),
			app: s.app.clone(),
			sops: s.nosops.then_some(false),
			local_audio: flag(s.localaudio),
			surround: flag(s.surround),
			key_dir: s.keydir.clone(),
			mapping: s.mapping.clone(),
			platform: s.platform.clone(),
			unsupported: flag(s.unsupported),
			fullscreen: s.windowed.then_some(false),
			audio_device: s.audio.clone(),
			debug_level: (debug_level > 0).then_some(debug_level),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn parse(args: &[&str]) -> Cli {
		Cli::try_parse_from(std::iter::once("streamctl").chain(args.iter().copied())).unwrap()
	}

	#[test]
	fn no_action_means_interactive() {
		let cli = parse(&[]);
		assert_eq!(cli.action, None);
		assert_eq!(cli.layer(), ConfigLayer::default());
	}

	#[test]
	fn host_follows_the_action() {
		let cli = parse(&["stream", "10.0.0.4", "--app", "Desktop"]);
		assert_eq!(cli.action, Some(Action::Stream(Target { host: Some("10.0.0.4".into()) })));
		let layer = cli.layer();
		assert_eq!(layer.address.as_deref(), Some("10.0.0.4"));
		assert_eq!(layer.app.as_deref(), Some("Desktop"));
	}

	#[test]
	fn resolution_preset_yields_to_explicit_dimensions() {
		let layer = parse(&["--resolution", "4k"]).layer();
		assert_eq!((layer.width, layer.height), (Some(3840), Some(2160)));

		let layer = parse(&["--resolution", "1080", "--height", "1200"]).layer();
		assert_eq!((layer.width, layer.height), (Some(1920), Some(1200)));

		assert!(Cli::try_parse_from(["streamctl", "--resolution", "8k"]).is_err());
	}

	#[test]
	fn negative_switches_map_to_false() {
		let layer = parse(&["list", "--nosops", "--windowed", "--codec", "h265"]).layer();
		assert_eq!(layer.sops, Some(false));
		assert_eq!(layer.fullscreen, Some(false));
		assert_eq!(layer.codec, Some(Codec::Hevc));
		assert_eq!(layer.remote, None);
	}

	#[test]
	fn verbosity_levels() {
		assert_eq!(parse(&[]).global.debug_level(), 0);
		assert_eq!(parse(&["--verbose"]).global.debug_level(), 1);
		assert_eq!(parse(&["-vvv"]).global.debug_level(), 2);
		assert_eq!(parse(&["--debug", "pair"]).layer().debug_level, Some(2));
	}

	#[test]
	fn map_takes_an_input_device() {
		let cli = parse(&["map", "/dev/input/event3"]);
		assert_eq!(
			cli.action,
			Some(Action::Map {
				input: Some("/dev/input/event3".into())
			})
		);
		assert_eq!(cli.layer().address, None);
	}

	#[test]
	fn packetsize_spelling() {
		assert_eq!(parse(&["--packetsize", "1024"]).layer().packet_size, Some(1024));
	}
}
