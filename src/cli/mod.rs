//! CLI module - Command-line interface definitions
//!
//! Uses clap v4 with derive macros. The binary has two faces: the `config`
//! subcommand for operators, and the helper mode Git invokes as
//! `git-remote-sqlite <remote> <url>`, captured as an external subcommand.

use clap::{Parser, Subcommand};

pub mod commands;

/// Git remote helper storing a repository in a single SQLite database
#[derive(Parser, Debug)]
#[command(name = "git-remote-sqlite")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage configuration stored in a repository database
    Config(commands::config::ConfigArgs),

    /// Helper mode: `git-remote-sqlite <remote> <url>` (invoked by Git)
    #[command(external_subcommand)]
    Helper(Vec<String>),
}
