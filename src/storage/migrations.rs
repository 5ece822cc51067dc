//! Database migrations

use rusqlite::Connection;

use crate::error::{GrsError, Result};

const MIGRATIONS: [&str; 4] = [
    include_str!("../../migrations/001_objects.sql"),
    include_str!("../../migrations/002_refs.sql"),
    include_str!("../../migrations/003_config.sql"),
    include_str!("../../migrations/004_packs.sql"),
];

pub const SCHEMA_VERSION: u32 = MIGRATIONS.len() as u32;

/// Run all migrations on the database
pub fn run_migrations(conn: &Connection) -> Result<u32> {
    let current_version: u32 = conn
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .map_err(|err| GrsError::StoreInit(err.to_string()))?;

    for (idx, sql) in MIGRATIONS.iter().enumerate() {
        let target_version = (idx + 1) as u32;
        if current_version >= target_version {
            continue;
        }

        conn.execute_batch(sql).map_err(|err| {
            GrsError::StoreInit(format!("migration {target_version} failed: {err}"))
        })?;
        conn.pragma_update(None, "user_version", target_version)
            .map_err(|err| {
                GrsError::StoreInit(format!(
                    "failed to set user_version {target_version}: {err}"
                ))
            })?;
    }

    Ok(SCHEMA_VERSION)
}
