//! git-remote-sqlite - Git remote helper backed by a single SQLite file
//!
//! Invoked by Git as `git-remote-sqlite <remote> <url>` for `sqlite://`
//! remotes; also exposes a `config` subcommand for operators.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use git_remote_sqlite::cli::{commands, Cli, Commands};
use git_remote_sqlite::remote::RemoteHelper;
use git_remote_sqlite::repo::LocalRepository;
use git_remote_sqlite::storage::Database;
use git_remote_sqlite::{url, GrsError, Result};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Config(args) => commands::config::run(&args),
        Commands::Helper(args) => run_helper(&args),
    }
}

fn run_helper(args: &[String]) -> Result<()> {
    // Git passes the remote name first and the URL second; a lone URL is
    // accepted for direct invocation.
    let raw_url = match args {
        [_remote, url] => url,
        [url] => url,
        _ => {
            return Err(GrsError::InvalidCommand(
                "expected <remote> <url>".to_string(),
            ))
        }
    };

    let db_path = url::parse(raw_url)?;
    let git_dir = std::env::var_os("GIT_DIR").ok_or(GrsError::MissingGitDir)?;

    let repo = LocalRepository::open(git_dir)?;
    let db = Database::open(&db_path)?;
    tracing::debug!(url = %raw_url, db = %db_path.display(), "session start");

    let mut helper = RemoteHelper::new(repo, db);
    let stdin = io::stdin();
    let stdout = io::stdout();
    helper.run(stdin.lock(), stdout.lock())
}

fn init_tracing() {
    // stdout carries the protocol; diagnostics go to stderr only.
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
