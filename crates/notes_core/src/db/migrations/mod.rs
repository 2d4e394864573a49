//! Slot schema migrations.
//!
//! # Invariants
//! - `version` values must remain monotonic.
//! - All pending steps run in one transaction; a failed step leaves the
//!   file at its previous `user_version`.

use crate::db::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: include_str!("0001_slots.sql"),
}];

/// Returns the latest slot schema version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Reads the slot schema version stored in the database file.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

/// Brings the slot schema up to `latest_version()`.
///
/// # Errors
/// - `SchemaTooNew` when the file was written by a newer build.
/// - `Migration` when a step fails; nothing from this call is kept.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    apply_steps(conn, MIGRATIONS)
}

fn apply_steps(conn: &mut Connection, steps: &[Migration]) -> DbResult<()> {
    let found = schema_version(conn)?;
    let supported = steps.last().map_or(0, |step| step.version);

    if found > supported {
        return Err(DbError::SchemaTooNew { found, supported });
    }
    if found == supported {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for step in steps.iter().filter(|step| step.version > found) {
        let script = format!("{}\nPRAGMA user_version = {};", step.sql, step.version);
        tx.execute_batch(&script).map_err(|source| {
            error!(
                "event=db_migrate module=db status=error version={} error={source}",
                step.version
            );
            DbError::Migration {
                version: step.version,
                source,
            }
        })?;
    }
    tx.commit()?;

    info!("event=db_migrate module=db status=ok from_version={found} to_version={supported}");
    Ok(())
}
