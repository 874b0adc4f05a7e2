//! repoforge: package tagged plugin repositories into an addon repository.

mod cmd;
mod output;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::output::print_error;

/// Build an addon repository from the plugins listed in ./config.json
#[derive(Parser)]
#[command(name = "repoforge")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Also write index.html directory listings over the build tree
  #[arg(long)]
  gh_pages: bool,
}

fn main() -> ExitCode {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let cli = Cli::parse();

  match cmd::cmd_build(cli.gh_pages) {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      print_error(&format!("{:#}", e));
      ExitCode::FAILURE
    }
  }
}
