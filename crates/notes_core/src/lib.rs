//! Core domain logic for Minimal Notes.
//! This crate is the single source of truth for note invariants.

pub mod clock;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use clock::{Clock, ManualClock, SystemClock};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::note::{
    Note, NoteDraft, NoteId, NoteValidationError, TITLE_MAX_CHARS, UNTITLED_LABEL,
};
pub use repo::persistence::{PersistenceBridge, PersistenceError, DEFAULT_SLOT_KEY};
pub use repo::slot_repo::{
    DisabledSlotStore, MemorySlotStore, RepoError, RepoResult, SlotStore, SqliteSlotStore,
};
pub use service::note_store::{Commit, NoteStore, NoteStoreError, SubscriptionId};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
