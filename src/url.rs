//! `sqlite://` URL parsing.
//!
//! Two forms are accepted: `sqlite://<db-filename>` (host form, a file
//! relative to the current directory) and `sqlite:///<absolute-path>`
//! (path form). The mixed form `sqlite://host/path` is rejected.

use std::path::PathBuf;

use crate::error::{GrsError, Result};

const MAX_URL_LEN: usize = 2048;
const MAX_PATH_LEN: usize = 1024;

/// Parse a remote URL into a database path.
pub fn parse(url: &str) -> Result<PathBuf> {
    if url.is_empty() || url.len() > MAX_URL_LEN {
        return Err(GrsError::InvalidUrl(format!(
            "URL length must be between 1 and {MAX_URL_LEN}"
        )));
    }
    if url.bytes().any(|b| b == 0) {
        return Err(GrsError::InvalidUrl("URL contains NUL byte".into()));
    }

    let (scheme, rest) = url
        .split_once("://")
        .ok_or_else(|| GrsError::InvalidUrl(format!("missing scheme: {url}")))?;
    if scheme != "sqlite" {
        return Err(GrsError::UnsupportedProtocol(scheme.to_string()));
    }

    if let Some(path) = rest.strip_prefix('/') {
        // Path form: sqlite:///absolute/path
        if path.is_empty() {
            return Err(GrsError::InvalidPath("path is empty".into()));
        }
        if path.len() > MAX_PATH_LEN {
            return Err(GrsError::InvalidPath(format!(
                "path length must be between 1 and {MAX_PATH_LEN}"
            )));
        }
        let normalized = normalize(path)?;
        Ok(PathBuf::from(format!("/{normalized}")))
    } else {
        // Host form: sqlite://file.db
        if rest.is_empty() {
            return Err(GrsError::InvalidPath("database name is empty".into()));
        }
        if rest.contains('/') {
            return Err(GrsError::InvalidUrl(format!(
                "ambiguous host/path form: {url}"
            )));
        }
        if rest.len() > MAX_PATH_LEN {
            return Err(GrsError::InvalidPath(format!(
                "path length must be between 1 and {MAX_PATH_LEN}"
            )));
        }
        Ok(PathBuf::from(rest))
    }
}

/// Resolve `.` and `..` components without touching the filesystem.
/// `..` may not climb above the referenced root.
fn normalize(path: &str) -> Result<String> {
    let mut components: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                if components.pop().is_none() {
                    return Err(GrsError::InvalidPath(format!(
                        "path escapes root: {path}"
                    )));
                }
            }
            other => components.push(other),
        }
    }
    if components.is_empty() {
        return Err(GrsError::InvalidPath(format!("path is empty: {path}")));
    }
    Ok(components.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_form() {
        assert_eq!(parse("sqlite://test.db").unwrap(), PathBuf::from("test.db"));
        assert_eq!(
            parse("sqlite://repo-backup.sqlite").unwrap(),
            PathBuf::from("repo-backup.sqlite")
        );
    }

    #[test]
    fn test_path_form() {
        assert_eq!(
            parse("sqlite:///var/lib/repos/test.db").unwrap(),
            PathBuf::from("/var/lib/repos/test.db")
        );
    }

    #[test]
    fn test_path_form_normalizes_dots() {
        assert_eq!(
            parse("sqlite:///var/./lib/../lib/test.db").unwrap(),
            PathBuf::from("/var/lib/test.db")
        );
    }

    #[test]
    fn test_rejects_wrong_scheme() {
        assert!(matches!(
            parse("https://example.com/test.db"),
            Err(GrsError::UnsupportedProtocol(_))
        ));
        assert!(matches!(
            parse("postgres://db"),
            Err(GrsError::UnsupportedProtocol(_))
        ));
    }

    #[test]
    fn test_rejects_missing_scheme() {
        assert!(matches!(parse("test.db"), Err(GrsError::InvalidUrl(_))));
    }

    #[test]
    fn test_rejects_ambiguous_form() {
        assert!(matches!(
            parse("sqlite://host/path.db"),
            Err(GrsError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_rejects_traversal() {
        assert!(matches!(
            parse("sqlite:///../../etc/passwd"),
            Err(GrsError::InvalidPath(_))
        ));
        assert!(matches!(
            parse("sqlite:///a/../../etc/passwd"),
            Err(GrsError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_rejects_nul_byte() {
        assert!(matches!(
            parse("sqlite://test\0.db"),
            Err(GrsError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_rejects_empty_and_bare_slash() {
        assert!(matches!(parse(""), Err(GrsError::InvalidUrl(_))));
        assert!(matches!(parse("sqlite://"), Err(GrsError::InvalidPath(_))));
        assert!(matches!(parse("sqlite:///"), Err(GrsError::InvalidPath(_))));
    }

    #[test]
    fn test_rejects_overlong_url() {
        let url = format!("sqlite://{}", "a".repeat(MAX_URL_LEN));
        assert!(matches!(parse(&url), Err(GrsError::InvalidUrl(_))));
    }

    #[test]
    fn test_rejects_overlong_path() {
        let url = format!("sqlite:///{}", "a".repeat(MAX_PATH_LEN + 1));
        assert!(matches!(parse(&url), Err(GrsError::InvalidPath(_))));
    }
}
