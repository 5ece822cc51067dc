//! Reachable-object enumeration
//!
//! Walks the closure of a start commit: revision walk over ancestry, with a
//! recursive scan of each commit's tree. Every reachable sha is emitted
//! exactly once; entries that cannot be looked up are skipped so partial
//! repositories still walk to completion.

use std::collections::{HashSet, VecDeque};

use git2::{ObjectType, Oid, Repository, Revwalk, Tree};

use crate::error::Result;

/// How a pending sha was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Provenance {
    Commit,
    TreeRoot,
    TreeEntry,
}

struct TreeFrame<'repo> {
    tree: Tree<'repo>,
    next: usize,
}

/// Lazy iterator over every object reachable from a start commit.
///
/// Single-threaded and non-restartable; create a new walker per traversal.
pub struct ObjectWalker<'repo> {
    repo: &'repo Repository,
    revwalk: Revwalk<'repo>,
    visited: HashSet<String>,
    pending: VecDeque<(Oid, Provenance)>,
    tree_stack: Vec<TreeFrame<'repo>>,
}

impl<'repo> ObjectWalker<'repo> {
    pub fn new(repo: &'repo Repository, start_sha: &str) -> Result<Self> {
        let start = Oid::from_str(start_sha)?;
        let mut revwalk = repo.revwalk()?;
        revwalk.push(start)?;

        Ok(Self {
            repo,
            revwalk,
            visited: HashSet::new(),
            pending: VecDeque::new(),
            tree_stack: Vec::new(),
        })
    }

    /// Dequeue one pending sha. Returns the hex string to emit, or None when
    /// the item was a duplicate or could not be looked up.
    fn process_pending(&mut self, oid: Oid, provenance: Provenance) -> Option<String> {
        let hex = oid.to_string();
        if !self.visited.insert(hex.clone()) {
            return None;
        }

        match provenance {
            Provenance::Commit => {
                let commit = match self.repo.find_commit(oid) {
                    Ok(commit) => commit,
                    Err(err) => {
                        tracing::debug!(sha = %hex, error = %err, "skipping unresolvable commit");
                        return None;
                    }
                };
                self.pending
                    .push_back((commit.tree_id(), Provenance::TreeRoot));
                Some(hex)
            }
            Provenance::TreeRoot | Provenance::TreeEntry => {
                let object = match self.repo.find_object(oid, None) {
                    Ok(object) => object,
                    Err(err) => {
                        tracing::debug!(sha = %hex, error = %err, "skipping unresolvable object");
                        return None;
                    }
                };
                if object.kind() == Some(ObjectType::Tree) {
                    if let Ok(tree) = object.into_tree() {
                        self.tree_stack.push(TreeFrame { tree, next: 0 });
                    }
                }
                Some(hex)
            }
        }
    }
}

impl<'repo> Iterator for ObjectWalker<'repo> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            if let Some((oid, provenance)) = self.pending.pop_front() {
                if let Some(hex) = self.process_pending(oid, provenance) {
                    return Some(hex);
                }
                continue;
            }

            if let Some(frame) = self.tree_stack.last_mut() {
                let entry_id = frame.tree.get(frame.next).map(|entry| entry.id());
                match entry_id {
                    Some(id) => {
                        frame.next += 1;
                        self.pending.push_back((id, Provenance::TreeEntry));
                    }
                    None => {
                        self.tree_stack.pop();
                    }
                }
                continue;
            }

            match self.revwalk.next() {
                Some(Ok(oid)) => {
                    self.pending.push_back((oid, Provenance::Commit));
                }
                Some(Err(err)) => {
                    tracing::debug!(error = %err, "skipping revwalk entry");
                }
                None => return None,
            }
        }
    }
}
