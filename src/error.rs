//! Error handling for git-remote-sqlite.

use std::io;

use thiserror::Error;

/// Main error type for helper operations.
#[derive(Error, Debug)]
pub enum GrsError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Unsupported protocol: {0}")]
    UnsupportedProtocol(String),

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Unsupported command: {0}")]
    UnsupportedCommand(String),

    #[error("Failed to open repository: {0}")]
    RepoOpen(String),

    #[error("Failed to resolve reference: {0}")]
    ResolveRef(String),

    #[error("Invalid refspec: {0}")]
    InvalidRefspec(String),

    #[error("Invalid object type: {0}")]
    InvalidObjectType(String),

    #[error("Object hash mismatch: stored {stored}, written {written}")]
    HashMismatch { stored: String, written: String },

    #[error("Store read failed: {0}")]
    StoreRead(String),

    #[error("Store write failed: {0}")]
    StoreWrite(String),

    #[error("Store initialization failed: {0}")]
    StoreInit(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Config key not found: {0}")]
    KeyNotFound(String),

    #[error("GIT_DIR is not set")]
    MissingGitDir,
}

/// Result type alias using GrsError.
pub type Result<T> = std::result::Result<T, GrsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GrsError::ResolveRef("refs/heads/main".into());
        assert_eq!(
            err.to_string(),
            "Failed to resolve reference: refs/heads/main"
        );

        let err = GrsError::HashMismatch {
            stored: "a".repeat(40),
            written: "b".repeat(40),
        };
        assert!(err.to_string().contains("hash mismatch"));
    }

    #[test]
    fn test_from_rusqlite_error() {
        let err: GrsError = rusqlite::Error::InvalidQuery.into();
        assert!(matches!(err, GrsError::Database(_)));
    }

    #[test]
    fn test_from_io_error() {
        let err: GrsError = io::Error::new(io::ErrorKind::BrokenPipe, "gone").into();
        assert!(matches!(err, GrsError::Io(_)));
    }
}
