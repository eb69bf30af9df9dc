use std::path::PathBuf;

use clap::Parser;
use color_eyre::Result;
use cpdaily_autofill::{
	Session,
	config::{AppConfig, DEFAULT_ENV_FILE},
	runner::{Outcome, RunOptions, run},
};
use tracing_subscriber::EnvFilter;
use v_utils::log;

#[derive(Debug, Parser)]
#[command(name = "cpdaily_autofill")]
#[command(about = "Fill in and submit the daily cpdaily health report", long_about = None)]
struct Args {
	/// KEY=value file with DOMAIN, USER_AGENT, EXTENSION, COOKIE, ADDRESS and AREA
	#[arg(short, long, default_value = DEFAULT_ENV_FILE)]
	env_file: PathBuf,

	/// Render and print the form without submitting it
	#[arg(long)]
	dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.with_writer(std::io::stderr)
		.init();
	let args = Args::parse();

	let config = AppConfig::load(&args.env_file)?;
	let session = Session::new(config)?;
	let opts = RunOptions {
		dry_run: args.dry_run,
		..Default::default()
	};

	match run(&session, &opts).await? {
		Outcome::NothingToDo => {
			log!("Nothing to do");
		}
		Outcome::DryRun(_) => {
			log!("Done (dry run)");
		}
		Outcome::Submitted(_) => {
			log!("Done");
		}
	}
	Ok(())
}
