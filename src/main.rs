//! Sweepgen CLI - Measurement Stimulus Generator
//!
//! Command-line interface for the sweepgen signal generator.

use clap::Parser;
use env_logger::Env;
use log::info;

use sweepgen::cli::commands;
use sweepgen::cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    info!("Sweepgen v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(cmd) => handle_command(cmd),
        None => {
            println!("Sweepgen v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(cmd: Commands) -> anyhow::Result<()> {
    match cmd {
        Commands::Generate(args) => commands::generate(&args),
        Commands::Inspect { path } => commands::inspect(&path),
        Commands::Frequencies {
            start_hz,
            end_hz,
            steps_per_octave,
            linear,
        } => commands::frequencies(start_hz, end_hz, steps_per_octave, linear),
        Commands::ExampleRequest => commands::example_request(),
    }
}
