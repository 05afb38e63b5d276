//! Command-line argument definitions for the flowbpmn CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. A subcommand selects the operation; configuration file
//! selection, reference strictness and logging verbosity apply to all of them.

use clap::{Parser, Subcommand};

/// Command-line arguments for the flowbpmn converter
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Reject edges to nodes that are never declared
    #[arg(long, global = true)]
    pub strict: bool,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Convert a flowchart into a BPMN document
    Convert(ConvertArgs),

    /// Check whether a flowchart can be converted
    Validate {
        /// Path to the input flowchart file
        input: String,
    },

    /// Report the structure and complexity of a flowchart
    Analyze {
        /// Path to the input flowchart file
        input: String,
    },
}

impl Command {
    /// Path of the flowchart file the command reads.
    pub fn input(&self) -> &str {
        match self {
            Command::Convert(args) => &args.input,
            Command::Validate { input } | Command::Analyze { input } => input,
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct ConvertArgs {
    /// Path to the input flowchart file
    pub input: String,

    /// Write the document to this file instead of stdout
    #[arg(short, long, conflicts_with = "out_dir")]
    pub output: Option<String>,

    /// Save the document into this directory
    #[arg(long)]
    pub out_dir: Option<String>,

    /// File name used with --out-dir; derived from the process name if unset
    #[arg(long, requires = "out_dir")]
    pub name: Option<String>,

    /// Replace an existing file in --out-dir
    #[arg(long)]
    pub overwrite: bool,

    /// Place elements in a single row instead of running the layout
    #[arg(long)]
    pub no_layout: bool,

    /// Check the generated document for start and end events
    #[arg(long)]
    pub validate: bool,
}
