//! SQLite database layer
//!
//! A typed, transactional view over the repository database. All schemas are
//! created on open; database-level faults are reported upward as coarse
//! read/write errors and logged at debug.

use std::fmt;
use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::{GrsError, Result};
use crate::storage::migrations;

/// Prefix marking a symbolic ref value, as in a loose `HEAD` file.
const SYMREF_PREFIX: &str = "ref: ";

/// Git object kind stored in the `objects` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Blob,
    Tree,
    Commit,
    Tag,
}

impl ObjectKind {
    /// Every kind, in the order fetch materializes them.
    pub const ALL: [ObjectKind; 4] = [
        ObjectKind::Blob,
        ObjectKind::Tree,
        ObjectKind::Commit,
        ObjectKind::Tag,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Blob => "blob",
            ObjectKind::Tree => "tree",
            ObjectKind::Commit => "commit",
            ObjectKind::Tag => "tag",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "blob" => Some(ObjectKind::Blob),
            "tree" => Some(ObjectKind::Tree),
            "commit" => Some(ObjectKind::Commit),
            "tag" => Some(ObjectKind::Tag),
            _ => None,
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Class of a regular ref row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Branch,
    Tag,
    Remote,
}

impl RefKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefKind::Branch => "branch",
            RefKind::Tag => "tag",
            RefKind::Remote => "remote",
        }
    }
}

/// One row of `list_refs`. Symbolic refs surface with `kind = "symbolic"`
/// and the sha of their resolved target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefRecord {
    pub name: String,
    pub sha: String,
    pub kind: String,
}

/// SQLite database wrapper for the repository store
pub struct Database {
    conn: Connection,
    schema_version: u32,
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("schema_version", &self.schema_version)
            .finish_non_exhaustive()
    }
}

impl Database {
    /// Open database at the given path, creating file and schema if absent
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        Self::configure_pragmas(&conn)?;
        let schema_version = migrations::run_migrations(&conn)?;

        Ok(Self {
            conn,
            schema_version,
        })
    }

    /// Get a reference to the connection
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Current schema version after migrations.
    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    // =========================================================================
    // OBJECTS
    // =========================================================================

    /// Upsert a loose object. The sha shape and kind are enforced by the
    /// schema check constraints.
    pub fn put_object(&self, sha: &str, kind: ObjectKind, data: &[u8]) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO objects (sha, kind, data) VALUES (?, ?, ?)
                 ON CONFLICT(sha) DO UPDATE SET
                    kind=excluded.kind,
                    data=excluded.data",
                params![sha, kind.as_str(), data],
            )
            .map_err(|err| write_failed("put_object", err))?;
        Ok(())
    }

    pub fn has_object(&self, sha: &str) -> Result<bool> {
        let exists: bool = self
            .conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM objects WHERE sha = ?)",
                [sha],
                |row| row.get(0),
            )
            .map_err(|err| read_failed("has_object", err))?;
        Ok(exists)
    }

    pub fn get_object(&self, sha: &str) -> Result<Option<(ObjectKind, Vec<u8>)>> {
        self.conn
            .query_row(
                "SELECT kind, data FROM objects WHERE sha = ?",
                [sha],
                object_from_row,
            )
            .optional()
            .map_err(|err| read_failed("get_object", err))
    }

    /// All shas of one kind, ordered ascending.
    pub fn objects_by_kind(&self, kind: ObjectKind) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT sha FROM objects WHERE kind = ? ORDER BY sha")
            .map_err(|err| read_failed("objects_by_kind", err))?;
        let rows = stmt
            .query_map([kind.as_str()], |row| row.get(0))
            .map_err(|err| read_failed("objects_by_kind", err))?;

        let mut shas = Vec::new();
        for row in rows {
            shas.push(row.map_err(|err| read_failed("objects_by_kind", err))?);
        }
        Ok(shas)
    }

    pub fn count_objects(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM objects", [], |row| row.get(0))
            .map_err(|err| read_failed("count_objects", err))?;
        Ok(count.max(0) as u64)
    }

    // =========================================================================
    // REFS
    // =========================================================================

    /// Upsert a ref. A value carrying the `ref: ` prefix is stored as a
    /// symbolic ref targeting the suffix; anything else is a regular row.
    pub fn put_ref(&self, name: &str, value: &str, kind: RefKind) -> Result<()> {
        if let Some(target) = value.strip_prefix(SYMREF_PREFIX) {
            self.conn
                .execute(
                    "INSERT INTO symrefs (name, target) VALUES (?, ?)
                     ON CONFLICT(name) DO UPDATE SET target=excluded.target",
                    params![name, target],
                )
                .map_err(|err| write_failed("put_ref", err))?;
            return Ok(());
        }

        self.conn
            .execute(
                "INSERT INTO refs (name, sha, kind) VALUES (?, ?, ?)
                 ON CONFLICT(name) DO UPDATE SET
                    sha=excluded.sha,
                    kind=excluded.kind",
                params![name, value, kind.as_str()],
            )
            .map_err(|err| write_failed("put_ref", err))?;
        Ok(())
    }

    pub fn get_ref(&self, name: &str) -> Result<Option<String>> {
        self.conn
            .query_row("SELECT sha FROM refs WHERE name = ?", [name], |row| {
                row.get(0)
            })
            .optional()
            .map_err(|err| read_failed("get_ref", err))
    }

    pub fn delete_ref(&self, name: &str) -> Result<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM refs WHERE name = ?", [name])
            .map_err(|err| write_failed("delete_ref", err))?;
        if deleted == 0 {
            self.conn
                .execute("DELETE FROM symrefs WHERE name = ?", [name])
                .map_err(|err| write_failed("delete_ref", err))?;
        }
        Ok(())
    }

    /// All refs: regular rows ordered by name, then symbolic rows whose
    /// target resolves, each carrying the resolved sha. Dangling symrefs
    /// are omitted.
    pub fn list_refs(&self) -> Result<Vec<RefRecord>> {
        let mut records = Vec::new();

        let mut stmt = self
            .conn
            .prepare("SELECT name, sha, kind FROM refs ORDER BY name")
            .map_err(|err| read_failed("list_refs", err))?;
        let rows = stmt
            .query_map([], ref_from_row)
            .map_err(|err| read_failed("list_refs", err))?;
        for row in rows {
            records.push(row.map_err(|err| read_failed("list_refs", err))?);
        }

        let mut stmt = self
            .conn
            .prepare(
                "SELECT s.name, r.sha FROM symrefs s
                 JOIN refs r ON r.name = s.target
                 ORDER BY s.name",
            )
            .map_err(|err| read_failed("list_refs", err))?;
        let rows = stmt
            .query_map([], |row| {
                Ok(RefRecord {
                    name: row.get(0)?,
                    sha: row.get(1)?,
                    kind: "symbolic".to_string(),
                })
            })
            .map_err(|err| read_failed("list_refs", err))?;
        for row in rows {
            records.push(row.map_err(|err| read_failed("list_refs", err))?);
        }

        Ok(records)
    }

    // =========================================================================
    // CONFIG
    // =========================================================================

    pub fn put_config(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO config (key, value) VALUES (?, ?)
                 ON CONFLICT(key) DO UPDATE SET value=excluded.value",
                params![key, value],
            )
            .map_err(|err| write_failed("put_config", err))?;
        Ok(())
    }

    pub fn get_config(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row("SELECT value FROM config WHERE key = ?", [key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(|err| read_failed("get_config", err))
    }

    pub fn unset_config(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM config WHERE key = ?", [key])
            .map_err(|err| write_failed("unset_config", err))?;
        Ok(())
    }

    pub fn list_config(&self) -> Result<Vec<(String, String)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key, value FROM config ORDER BY key")
            .map_err(|err| read_failed("list_config", err))?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .map_err(|err| read_failed("list_config", err))?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row.map_err(|err| read_failed("list_config", err))?);
        }
        Ok(entries)
    }

    // =========================================================================
    // TRANSACTIONS
    // =========================================================================

    /// Run a raw SQL batch.
    pub fn exec(&self, sql: &str) -> Result<()> {
        self.conn
            .execute_batch(sql)
            .map_err(|err| write_failed("exec", err))?;
        Ok(())
    }

    pub fn begin(&self) -> Result<()> {
        self.exec("BEGIN")
    }

    pub fn commit(&self) -> Result<()> {
        self.exec("COMMIT")
    }

    pub fn rollback(&self) -> Result<()> {
        self.exec("ROLLBACK")
    }

    fn configure_pragmas(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA temp_store = MEMORY;
             PRAGMA foreign_keys = ON;",
        )
        .map_err(|err| GrsError::StoreInit(err.to_string()))?;
        Ok(())
    }
}

fn object_from_row(row: &Row<'_>) -> rusqlite::Result<(ObjectKind, Vec<u8>)> {
    let kind_str: String = row.get(0)?;
    let kind = ObjectKind::parse(&kind_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("unknown object kind: {kind_str}"),
            )),
        )
    })?;
    Ok((kind, row.get(1)?))
}

fn ref_from_row(row: &Row<'_>) -> rusqlite::Result<RefRecord> {
    Ok(RefRecord {
        name: row.get(0)?,
        sha: row.get(1)?,
        kind: row.get(2)?,
    })
}

fn read_failed(op: &str, err: rusqlite::Error) -> GrsError {
    tracing::debug!(op, error = %err, "store read failed");
    GrsError::StoreRead(op.to_string())
}

fn write_failed(op: &str, err: rusqlite::Error) -> GrsError {
    tracing::debug!(op, error = %err, "store write failed");
    GrsError::StoreWrite(op.to_string())
}
