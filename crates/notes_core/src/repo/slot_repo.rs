//! Durable slot storage contracts and implementations.
//!
//! # Responsibility
//! - Store one opaque payload per named slot.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - `write_slot` replaces the whole payload in a single statement; readers
//!   never observe a partial write.
//! - Slot stores have no opinion on payload content.

use crate::db::DbError;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Storage-medium error for slot reads and writes.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Storage is disabled or could not be opened for this session.
    Unavailable(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Unavailable(reason) => write!(f, "slot storage unavailable: {reason}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Unavailable(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Key-value medium holding serialized payloads.
pub trait SlotStore {
    /// Returns the payload stored under `key`, or `None` when the slot is empty.
    fn read_slot(&self, key: &str) -> RepoResult<Option<String>>;
    /// Replaces the payload stored under `key`.
    fn write_slot(&mut self, key: &str, payload: &str) -> RepoResult<()>;
}

/// SQLite-backed slot store owning a migrated connection.
pub struct SqliteSlotStore {
    conn: Connection,
}

impl SqliteSlotStore {
    /// Wraps a connection returned by `open_db`/`open_db_in_memory`.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl SlotStore for SqliteSlotStore {
    fn read_slot(&self, key: &str) -> RepoResult<Option<String>> {
        let payload = self
            .conn
            .query_row(
                "SELECT payload FROM slots WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(payload)
    }

    fn write_slot(&mut self, key: &str, payload: &str) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO slots (key, payload, updated_at)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
             ON CONFLICT(key) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at;",
            params![key, payload],
        )?;
        Ok(())
    }
}

/// Process-local slot store for tests and ephemeral sessions.
#[derive(Debug, Clone, Default)]
pub struct MemorySlotStore {
    slots: HashMap<String, String>,
}

impl MemorySlotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a slot with a raw payload.
    pub fn with_slot(mut self, key: impl Into<String>, payload: impl Into<String>) -> Self {
        self.slots.insert(key.into(), payload.into());
        self
    }
}

impl SlotStore for MemorySlotStore {
    fn read_slot(&self, key: &str) -> RepoResult<Option<String>> {
        Ok(self.slots.get(key).cloned())
    }

    fn write_slot(&mut self, key: &str, payload: &str) -> RepoResult<()> {
        self.slots.insert(key.to_string(), payload.to_string());
        Ok(())
    }
}

/// Slot store used when durable storage is unavailable.
///
/// Reads behave like a fresh install; every write is rejected.
#[derive(Debug, Clone)]
pub struct DisabledSlotStore {
    reason: String,
}

impl DisabledSlotStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl SlotStore for DisabledSlotStore {
    fn read_slot(&self, _key: &str) -> RepoResult<Option<String>> {
        Ok(None)
    }

    fn write_slot(&mut self, _key: &str, _payload: &str) -> RepoResult<()> {
        Err(RepoError::Unavailable(self.reason.clone()))
    }
}

impl<T: SlotStore + ?Sized> SlotStore for Box<T> {
    fn read_slot(&self, key: &str) -> RepoResult<Option<String>> {
        (**self).read_slot(key)
    }

    fn write_slot(&mut self, key: &str, payload: &str) -> RepoResult<()> {
        (**self).write_slot(key, payload)
    }
}
