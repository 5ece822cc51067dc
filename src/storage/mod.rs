//! Storage layer for git-remote-sqlite
//!
//! A single SQLite file holds the whole remote repository: objects, refs,
//! symbolic refs, and server-side configuration.

pub mod migrations;
pub mod sqlite;

pub use sqlite::{Database, ObjectKind, RefKind, RefRecord};
