use clap::Parser;
use streamctl_cli::{app, cli::Cli, logging};

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.global.verbose.max(cli.global.debug_level()));

	let code = app::run(cli).await;
	std::process::exit(code);
}
