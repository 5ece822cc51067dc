//! git-remote-sqlite config - Manage server-side configuration
//!
//! Key/value CRUD against the config table of a repository database. Stored
//! values have no effect on push acceptance.

use std::path::PathBuf;

use clap::Args;

use crate::error::{GrsError, Result};
use crate::storage::Database;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Path to the repository database
    pub db: PathBuf,

    /// Configuration key to set
    pub key: Option<String>,

    /// Value to set
    pub value: Option<String>,

    /// List all configuration entries
    #[arg(long)]
    pub list: bool,

    /// Print the value of a key
    #[arg(long, value_name = "KEY")]
    pub get: Option<String>,

    /// Remove a key
    #[arg(long, value_name = "KEY")]
    pub unset: Option<String>,
}

pub fn run(args: &ConfigArgs) -> Result<()> {
    if args.unset.is_some() && args.key.is_some() {
        return Err(GrsError::Config(
            "cannot combine --unset with a key/value pair".to_string(),
        ));
    }
    if args.get.is_some() && args.key.is_some() {
        return Err(GrsError::Config(
            "cannot combine --get with a key/value pair".to_string(),
        ));
    }

    let db = Database::open(&args.db)?;

    if args.list {
        for (key, value) in db.list_config()? {
            println!("{key}={value}");
        }
        return Ok(());
    }

    if let Some(key) = &args.get {
        let value = db
            .get_config(key)?
            .ok_or_else(|| GrsError::KeyNotFound(key.clone()))?;
        println!("{value}");
        return Ok(());
    }

    if let Some(key) = &args.unset {
        return db.unset_config(key);
    }

    match (&args.key, &args.value) {
        (Some(key), Some(value)) => db.put_config(key, value),
        _ => Err(GrsError::Config(
            "expected <key> <value>, --list, --get <key>, or --unset <key>".to_string(),
        )),
    }
}
