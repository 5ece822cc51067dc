//! Local repository access
//!
//! Bounded surface over the working repository: ref resolution, loose
//! object reads and writes, and refspec parsing. Everything else stays
//! behind libgit2.

use std::path::Path;

use git2::{ObjectType, Oid, Repository};

use crate::error::{GrsError, Result};
use crate::storage::ObjectKind;

pub mod walker;

pub use walker::ObjectWalker;

/// Handle to the local working repository.
pub struct LocalRepository {
    repo: Repository,
}

impl std::fmt::Debug for LocalRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalRepository")
            .field("path", &self.repo.path())
            .finish()
    }
}

impl LocalRepository {
    /// Open the repository at `path` (typically `$GIT_DIR`).
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let repo = Repository::open(path)
            .map_err(|err| GrsError::RepoOpen(format!("{}: {}", path.display(), err.message())))?;
        Ok(Self { repo })
    }

    /// Get a reference to the underlying repository
    pub fn repo(&self) -> &Repository {
        &self.repo
    }

    /// Resolve a reference name to its 40-hex object id.
    pub fn resolve_ref(&self, name: &str) -> Result<String> {
        let object = self
            .repo
            .revparse_single(name)
            .map_err(|_| GrsError::ResolveRef(name.to_string()))?;
        Ok(object.id().to_string())
    }

    /// Read an object's declared kind and raw payload from the object
    /// database.
    pub fn get_object(&self, sha: &str) -> Result<(ObjectKind, Vec<u8>)> {
        let oid = Oid::from_str(sha)?;
        let odb = self.repo.odb()?;
        let object = odb.read(oid)?;
        let kind = kind_from_git2(object.kind())?;
        Ok((kind, object.data().to_vec()))
    }

    /// Write a loose object and return its id. The returned sha is the Git
    /// hash of (kind, bytes).
    pub fn put_object(&self, kind: ObjectKind, data: &[u8]) -> Result<String> {
        let odb = self.repo.odb()?;
        let oid = odb.write(kind_to_git2(kind), data)?;
        Ok(oid.to_string())
    }
}

pub(crate) fn kind_to_git2(kind: ObjectKind) -> ObjectType {
    match kind {
        ObjectKind::Blob => ObjectType::Blob,
        ObjectKind::Tree => ObjectType::Tree,
        ObjectKind::Commit => ObjectType::Commit,
        ObjectKind::Tag => ObjectType::Tag,
    }
}

pub(crate) fn kind_from_git2(kind: ObjectType) -> Result<ObjectKind> {
    match kind {
        ObjectType::Blob => Ok(ObjectKind::Blob),
        ObjectType::Tree => Ok(ObjectKind::Tree),
        ObjectType::Commit => Ok(ObjectKind::Commit),
        ObjectType::Tag => Ok(ObjectKind::Tag),
        other => Err(GrsError::InvalidObjectType(other.to_string())),
    }
}

/// Transfer direction a refspec is parsed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Push,
    Fetch,
}

/// A parsed `[+]<src>:<dst>` mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Refspec {
    pub src: String,
    pub dst: String,
    pub force: bool,
}

impl Refspec {
    /// Parse a refspec. A lone `<src>` maps to itself on push; on fetch it
    /// leaves the destination empty (FETCH_HEAD only, as in Git).
    pub fn parse(text: &str, direction: Direction) -> Result<Self> {
        let (force, rest) = match text.strip_prefix('+') {
            Some(stripped) => (true, stripped),
            None => (false, text),
        };
        if rest.is_empty() {
            return Err(GrsError::InvalidRefspec(text.to_string()));
        }

        match rest.split_once(':') {
            Some((src, dst)) => {
                if src.is_empty() || dst.is_empty() || dst.contains(':') {
                    return Err(GrsError::InvalidRefspec(text.to_string()));
                }
                Ok(Self {
                    src: src.to_string(),
                    dst: dst.to_string(),
                    force,
                })
            }
            None => {
                let dst = match direction {
                    Direction::Push => rest.to_string(),
                    Direction::Fetch => String::new(),
                };
                Ok(Self {
                    src: rest.to_string(),
                    dst,
                    force,
                })
            }
        }
    }
}
