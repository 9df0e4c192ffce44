//! msbuildcc CLI - build C/C++ sources through MSBuild

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use msbuildcc::util::diagnostic::emit;
use msbuildcc::util::Shell;
use msbuildcc::DriverError;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    let shell = Shell::from_flags(cli.quiet, cli.verbose, cli.color);

    if let Err(e) = run(cli, &shell) {
        match e.downcast_ref::<DriverError>() {
            Some(err) => emit(&err.to_diagnostic(), shell.use_color()),
            None => shell.error(format!("{:#}", e)),
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli, shell: &Shell) -> Result<()> {
    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("msbuildcc=debug")
    } else if cli.quiet {
        EnvFilter::new("msbuildcc=error")
    } else {
        EnvFilter::new("msbuildcc=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    match cli.command {
        Commands::Build(args) => commands::build::execute(args, shell),
        Commands::Instances(args) => commands::instances::execute(args),
    }
}
