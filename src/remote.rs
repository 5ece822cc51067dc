//! Remote-helper engine
//!
//! Executes the business semantics behind each protocol command, composing
//! the store, the local repository, and the object walker. The session is
//! strictly serial: one command is read, executed to completion, and
//! answered before the next is considered.

use std::io::{self, BufRead, Write};

use crate::error::{GrsError, Result};
use crate::protocol::{
    Capabilities, Command, FetchResult, ListedRef, OptionStatus, PushResult, Response,
};
use crate::repo::{Direction, LocalRepository, ObjectWalker, Refspec};
use crate::storage::{Database, ObjectKind, RefKind};

/// The engine behind one helper session.
pub struct RemoteHelper {
    repo: LocalRepository,
    db: Database,
}

impl RemoteHelper {
    pub fn new(repo: LocalRepository, db: Database) -> Self {
        Self { repo, db }
    }

    /// Drive the session loop until end-of-input. A broken pipe while
    /// responding means the host closed the channel and ends the session
    /// cleanly.
    pub fn run(&mut self, input: impl BufRead, mut output: impl Write) -> Result<()> {
        for line in input.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            tracing::debug!(command = line, "executing command");
            let command = Command::parse(line)?;
            let response = self.execute(command)?;

            match response.render(&mut output).and_then(|()| output.flush()) {
                Ok(()) => {}
                Err(err) if err.kind() == io::ErrorKind::BrokenPipe => {
                    tracing::debug!("host closed the response channel");
                    return Ok(());
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }

    /// Execute one command. Protocol-visible failures become responses;
    /// anything returned as `Err` is fatal to the session.
    pub fn execute(&mut self, command: Command) -> Result<Response> {
        match command {
            Command::Capabilities => Ok(Response::Capabilities(Capabilities {
                push: true,
                fetch: true,
                progress: true,
                option: true,
                ..Default::default()
            })),
            Command::List { .. } => self.list(),
            Command::Option { name, value } => {
                Ok(Response::Option(self.set_option(&name, &value)))
            }
            Command::Fetch { sha, name } => self.fetch(&sha, &name),
            Command::Push { refspec } => self.push(&refspec),
            Command::Import { .. } => Err(GrsError::UnsupportedCommand("import".into())),
            Command::Export => Err(GrsError::UnsupportedCommand("export".into())),
            Command::Connect { .. } => Err(GrsError::UnsupportedCommand("connect".into())),
            Command::StatelessConnect { .. } => {
                Err(GrsError::UnsupportedCommand("stateless-connect".into()))
            }
            Command::Get { .. } => Err(GrsError::UnsupportedCommand("get".into())),
        }
    }

    /// Project the stored refs onto the protocol shape. Symbolic rows are
    /// flattened to their resolved sha.
    fn list(&self) -> Result<Response> {
        let refs = self
            .db
            .list_refs()?
            .into_iter()
            .map(|record| ListedRef::sha(record.sha, record.name))
            .collect();
        Ok(Response::List(refs))
    }

    fn set_option(&self, name: &str, value: &str) -> OptionStatus {
        match name {
            "verbosity" => OptionStatus::Ok,
            "progress" | "timeout" | "depth" => OptionStatus::Unsupported,
            _ => {
                tracing::debug!(name, value, "ignoring unrecognized option");
                OptionStatus::Ok
            }
        }
    }

    /// Materialize every stored object into the local object database.
    /// The requested sha/name pair is accepted but the whole store is
    /// transferred.
    fn fetch(&mut self, sha: &str, name: &str) -> Result<Response> {
        tracing::debug!(sha, name, "fetch requested");
        self.db.begin()?;
        match self.copy_store_to_repo() {
            Ok(copied) => {
                self.db.commit()?;
                tracing::info!(objects = copied, "fetch complete");
                Ok(Response::Fetch(FetchResult::Complete))
            }
            Err(err) => {
                let _ = self.db.rollback();
                Err(err)
            }
        }
    }

    fn copy_store_to_repo(&self) -> Result<usize> {
        let mut copied = 0;
        for kind in ObjectKind::ALL {
            for sha in self.db.objects_by_kind(kind)? {
                let (stored_kind, data) = self
                    .db
                    .get_object(&sha)?
                    .ok_or_else(|| GrsError::StoreRead("get_object".into()))?;
                let written = self.repo.put_object(stored_kind, &data)?;
                if written != sha {
                    return Err(GrsError::HashMismatch {
                        stored: sha,
                        written,
                    });
                }
                copied += 1;
            }
        }
        Ok(copied)
    }

    /// Transfer the closure of the refspec source and update the
    /// destination ref. Refspec and resolve failures surface as structured
    /// push results; everything else is fatal and rolls back.
    fn push(&mut self, refspec_text: &str) -> Result<Response> {
        let refspec = match Refspec::parse(refspec_text, Direction::Push) {
            Ok(refspec) => refspec,
            Err(_) => {
                return Ok(Response::Push(vec![PushResult::Error {
                    dst: refspec_text.to_string(),
                    why: Some("Invalid refspec format".to_string()),
                }]))
            }
        };

        self.db.begin()?;

        let sha = match self.repo.resolve_ref(&refspec.src) {
            Ok(sha) => sha,
            Err(_) => {
                let _ = self.db.rollback();
                return Ok(Response::Push(vec![PushResult::Error {
                    dst: refspec.dst,
                    why: Some("Failed to resolve reference".to_string()),
                }]));
            }
        };

        match self.copy_closure(&sha, &refspec.dst) {
            Ok(copied) => {
                self.db.commit()?;
                tracing::info!(dst = %refspec.dst, objects = copied, "push complete");
                Ok(Response::Push(vec![PushResult::Ok { dst: refspec.dst }]))
            }
            Err(err) => {
                let _ = self.db.rollback();
                Err(err)
            }
        }
    }

    fn copy_closure(&self, sha: &str, dst: &str) -> Result<usize> {
        let walker = ObjectWalker::new(self.repo.repo(), sha)?;
        let mut copied = 0;
        for object_sha in walker {
            if self.db.has_object(&object_sha)? {
                continue;
            }
            let (kind, data) = self.repo.get_object(&object_sha)?;
            self.db.put_object(&object_sha, kind, &data)?;
            copied += 1;
        }
        self.db.put_ref(dst, sha, RefKind::Branch)?;
        Ok(copied)
    }
}
