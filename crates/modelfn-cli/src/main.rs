//! Command-line bundler: synthesizes a deployable unit from a class name,
//! a model file, and an output archive path. Success prints the absolute
//! archive path; failure logs and prints nothing — the boundary carries no
//! exit-code distinction.

mod command;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

///
/// Cli
///

#[derive(Debug, Parser)]
#[command(name = "modelfn")]
#[command(about = "Bundle predictive models into deployable scalar-function units")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

///
/// Command
///

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate, compile, and package an adapter bound to one model
    Build {
        /// Name of the generated adapter type (a valid type identifier)
        class_name: String,

        /// Path to the model definition file
        model_file: PathBuf,

        /// Path of the archive to produce
        archive_file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Build {
            class_name,
            model_file,
            archive_file,
        } => {
            if let Some(path) = command::evaluate(&class_name, &model_file, &archive_file) {
                println!("{}", path.display());
            }
        }
    }
}
