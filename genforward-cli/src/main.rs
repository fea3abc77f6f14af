//! genforward — forward a generator start/stop digital input to the
//! generator start/stop controller.
//!
//! # Usage
//!
//! ```text
//! genforward [run] [--bus system|session]
//! genforward status [--bus system|session]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{run::RunArgs, status::StatusArgs};

#[derive(Parser, Debug)]
#[command(
    name = "genforward",
    version,
    about = "Forward a generator digital input to the generator start/stop service",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the forwarding loop in the foreground (default).
    Run(RunArgs),

    /// Print the values published by a running bridge as JSON.
    Status(StatusArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Run(args)) => args.run(),
        Some(Commands::Status(args)) => args.run(),
        None => RunArgs::default().run(),
    }
}
