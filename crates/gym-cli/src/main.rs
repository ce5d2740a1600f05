//! GYM Command-Line Client
//!
//! Loads triple files into a vertical-partitioning store, translates basic
//! graph patterns into join-tree plans and executes those plans.

mod commands;
mod error;
mod formatter;

use clap::{Parser, Subcommand};

use commands::{ExecuteArgs, LoadArgs, ShowArgs, TranslateArgs};
use error::CliError;

/// GYM join-tree planner and Yannakakis executor
#[derive(Parser, Debug)]
#[command(name = "gym")]
#[command(version, about = "GYM join-tree planner and Yannakakis executor")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load a tab-separated triple file and compute statistics
    Load(LoadArgs),
    /// Translate BGP queries into join-tree plans
    Translate(TranslateArgs),
    /// Execute join-tree plans against a store
    Execute(ExecuteArgs),
    /// Print a plan file
    Show(ShowArgs),
}

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("gym=info")),
        )
        .init();

    let args = Args::parse();
    tracing::debug!(format_version = gym_proto::FORMAT_VERSION, "gym starting");

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), CliError> {
    match args.command {
        Command::Load(args) => commands::load::run(&args),
        Command::Translate(args) => commands::translate::run(&args),
        Command::Execute(args) => commands::execute::run(&args),
        Command::Show(args) => commands::show::run(&args),
    }
}
