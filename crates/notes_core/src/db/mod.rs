//! Durable slot database.
//!
//! The notes core keeps one SQLite table of named text slots. This module
//! opens that database and brings its schema up to date; reading and writing
//! slots lives in `repo::slot_repo`.
//!
//! Schema state is the `PRAGMA user_version` value, one step per migration
//! file under `migrations/`.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failure to open or upgrade the slot database.
#[derive(Debug)]
pub enum DbError {
    /// Connection or pragma failure outside of a migration step.
    Sqlite(rusqlite::Error),
    /// A migration script failed; the transaction was rolled back and the
    /// file keeps its previous schema.
    Migration {
        version: u32,
        source: rusqlite::Error,
    },
    /// The file was written by a newer build with slot schema `found`.
    SchemaTooNew { found: u32, supported: u32 },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "slot database error: {err}"),
            Self::Migration { version, source } => {
                write!(f, "slot schema migration {version} failed: {source}")
            }
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "slot schema version {found} is newer than supported {supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) | Self::Migration { source: err, .. } => Some(err),
            Self::SchemaTooNew { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
