mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tgraph_lib::buildfile::DEFAULT_BUILD_FILE;
use tgraph_lib::execute::ExecuteError;
use tgraph_lib::target::RegistryError;

use crate::cmd::{RunArgs, cmd_check, cmd_describe, cmd_list, cmd_run, exit_code};
use crate::output::{OutputFormat, print_error};

/// tgraph - run dependent build targets exactly once
#[derive(Parser)]
#[command(name = "tg")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Build file declaring the targets
  #[arg(short, long, global = true, default_value = DEFAULT_BUILD_FILE)]
  file: PathBuf,

  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Run targets and their dependencies
  Run(RunArgs),

  /// List targets
  List {
    /// Include hidden targets
    #[arg(short, long)]
    all: bool,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },

  /// Show a target's description, dependencies and actions
  Describe {
    /// Target name
    target: String,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },

  /// Validate every target's dependencies without running anything
  Check,
}

fn main() -> ExitCode {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "info" } else { "warn" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match dispatch(cli) {
    Ok(code) => code,
    Err(e) => {
      print_error(&format!("{:#}", e));
      error_exit_code(&e)
    }
  }
}

/// Exit code for a command error, so an unknown target exits the same way
/// from `describe` and `run <target> help` as from a run.
fn error_exit_code(e: &anyhow::Error) -> ExitCode {
  if let Some(err) = e.downcast_ref::<RegistryError>() {
    return exit_code(err.exit_code());
  }
  if let Some(err) = e.downcast_ref::<ExecuteError>() {
    return exit_code(err.exit_code());
  }
  ExitCode::FAILURE
}

fn dispatch(cli: Cli) -> Result<ExitCode> {
  match cli.command {
    Commands::Run(args) => cmd_run(&cli.file, args),
    Commands::List { all, output } => cmd_list(&cli.file, all, output).map(|_| ExitCode::SUCCESS),
    Commands::Describe { target, output } => cmd_describe(&cli.file, &target, output).map(|_| ExitCode::SUCCESS),
    Commands::Check => cmd_check(&cli.file, cli.verbose).map(|_| ExitCode::SUCCESS),
  }
}
