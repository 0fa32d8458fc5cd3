//! Command-line interface for tagmap.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{BuildCommand, ConfigCommand, SchemaArg, ServeCommand};

/// tagmap - Turn work-site spreadsheets into interactive maps
///
/// Serves an upload form that renders each uploaded spreadsheet as a map with
/// one colored marker per site, or builds a map once from the command line.
#[derive(Debug, Parser)]
#[command(name = "tagmap")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the upload and map web server
    Serve(ServeCommand),

    /// Build the map from a spreadsheet once
    Build(BuildCommand),

    /// View or check configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
