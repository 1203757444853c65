//! semslot CLI
//!
//! Reads, bumps and sets a semantic version stored as a one-line file in a
//! git repository, safely against concurrent writers.
//!
//! # Commands
//!
//! - `check` - Print the current version as a JSON array
//! - `bump` - Bump the version and print it
//! - `set` - Set the version exactly and print it
//!
//! Results go to stdout as JSON; logs go to stderr.

mod commands;
mod config;
mod error;

use clap::{Parser, Subcommand};
use config::{Settings, SlotArgs};
use tracing_subscriber::EnvFilter;

/// Concurrency-safe semantic version slot in a git repository.
#[derive(Parser)]
#[command(name = "semslot")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    slot: SlotArgs,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the current version, or nothing if it is not newer than the cursor
    Check {
        /// Last version already seen
        #[arg(short, long)]
        cursor: Option<String>,
    },

    /// Bump the version
    Bump {
        /// Level to bump (major, minor, patch, final)
        #[arg(short, long)]
        bump: Option<String>,

        /// Prerelease name to start or increment (e.g. rc)
        #[arg(short, long)]
        pre: Option<String>,
    },

    /// Set the version exactly
    Set {
        /// The version to store
        version: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs on stderr keep stdout parseable.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Version = cli.command {
        println!("semslot v{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let settings = Settings::resolve(&cli.slot)?;
    let controller = commands::open(&settings)?;

    match cli.command {
        Commands::Check { cursor } => commands::check::run(&controller, cursor.as_deref())?,
        Commands::Bump { bump, pre } => {
            commands::bump::run(&controller, bump.as_deref(), pre.as_deref())?
        }
        Commands::Set { version } => commands::set::run(&controller, &version)?,
        Commands::Version => {}
    }

    Ok(())
}
