//! Command-line interface for bacheca.
//!
//! This module provides the CLI structure and output rendering for the
//! `bacheca` binary.

mod commands;
pub mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ConfigCommand, CreateUserArgs, DeleteArgs, DocumentAddArgs, DocumentCommand,
    DocumentEditArgs, DocumentExportArgs, DocumentListArgs, DocumentTypeArg, EditArgs, EntryArgs,
    ExportArgs, FilterArgs, ListArgs, LoginCommand, NewsCommand, OutputFormat, PriorityArg,
    RoleArg, ShowArgs, UsersCommand,
};

/// bacheca - Document and news board for a local police department
///
/// Ordinances, templates, circulars, and procedures alongside internal news,
/// readable by every officer and maintained by administrators.
#[derive(Debug, Parser)]
#[command(name = "bacheca")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for info, -vv for debug)
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
    /// Log in and keep the session for later commands
    Login(LoginCommand),

    /// End the current session
    Logout,

    /// Show the logged-in account
    Whoami {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Manage documents
    #[command(subcommand, alias = "docs")]
    Documents(DocumentCommand),

    /// Manage news
    #[command(subcommand)]
    News(NewsCommand),

    /// Manage user accounts
    #[command(subcommand)]
    Users(UsersCommand),

    /// Show counts, recent records, and high-priority items
    Overview {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// View or validate configuration
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
