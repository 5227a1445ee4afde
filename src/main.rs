#![allow(missing_docs)]

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

mod cmd;

#[derive(Parser)]
#[command(name = "valmap", about = "Load, normalize, and merge JSON/YAML documents")]
struct Cli {
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	Show(cmd::show::Args),
	Merge(cmd::merge::Args),
}

fn main() {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
	fmt().compact().with_env_filter(filter).with_writer(std::io::stderr).with_target(false).without_time().init();

	if let Err(err) = run() {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn run() -> valmap::mapper::Result<()> {
	let cli = Cli::parse();

	match cli.command {
		Commands::Show(args) => cmd::show::run(args),
		Commands::Merge(args) => cmd::merge::run(args),
	}
}
