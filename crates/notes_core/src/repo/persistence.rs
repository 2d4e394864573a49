//! Persistence bridge between the note collection and one durable slot.
//!
//! # Responsibility
//! - Serialize the whole collection into a single slot payload.
//! - Decode the slot on startup with a reset-on-corruption policy.
//!
//! # Invariants
//! - The collection is stored and loaded as one unit; there is no partial
//!   persistence.
//! - `load_all` never fails; malformed payloads load as an empty collection.

use crate::model::note::{Note, NoteValidationError};
use crate::repo::slot_repo::{RepoError, SlotStore};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Slot name used for the note collection.
pub const DEFAULT_SLOT_KEY: &str = "notes";

/// Durable write failure surfaced after a committed in-memory mutation.
#[derive(Debug)]
pub enum PersistenceError {
    Serialize(serde_json::Error),
    Storage(RepoError),
}

impl Display for PersistenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Serialize(err) => write!(f, "failed to serialize notes: {err}"),
            Self::Storage(err) => write!(f, "failed to write notes: {err}"),
        }
    }
}

impl Error for PersistenceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Serialize(err) => Some(err),
            Self::Storage(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialize(value)
    }
}

impl From<RepoError> for PersistenceError {
    fn from(value: RepoError) -> Self {
        Self::Storage(value)
    }
}

/// Reasons a stored payload is discarded on load.
#[derive(Debug)]
enum DecodeError {
    Json(serde_json::Error),
    Invalid(NoteValidationError),
    DuplicateId,
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "{err}"),
            Self::Invalid(err) => write!(f, "{err}"),
            Self::DuplicateId => write!(f, "duplicate note id"),
        }
    }
}

/// Loads and saves the full note collection through a slot store.
pub struct PersistenceBridge<S: SlotStore> {
    store: S,
    slot_key: String,
}

impl<S: SlotStore> PersistenceBridge<S> {
    /// Creates a bridge over `store` using the default `notes` slot.
    pub fn new(store: S) -> Self {
        Self::with_slot_key(store, DEFAULT_SLOT_KEY)
    }

    pub fn with_slot_key(store: S, slot_key: impl Into<String>) -> Self {
        Self {
            store,
            slot_key: slot_key.into(),
        }
    }

    pub fn slot_key(&self) -> &str {
        &self.slot_key
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reads the durable slot.
    ///
    /// Returns an empty collection when the slot is absent, unreadable,
    /// unparseable or holds records that break note invariants.
    pub fn load_all(&self) -> Vec<Note> {
        let payload = match self.store.read_slot(&self.slot_key) {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                info!(
                    "event=notes_load module=persistence status=empty slot={}",
                    self.slot_key
                );
                return Vec::new();
            }
            Err(err) => {
                warn!(
                    "event=notes_load module=persistence status=reset slot={} error_code=slot_read_failed error={err}",
                    self.slot_key
                );
                return Vec::new();
            }
        };

        match decode_notes(&payload) {
            Ok(notes) => {
                info!(
                    "event=notes_load module=persistence status=ok slot={} count={}",
                    self.slot_key,
                    notes.len()
                );
                notes
            }
            Err(err) => {
                warn!(
                    "event=notes_load module=persistence status=reset slot={} error_code=payload_invalid error={err}",
                    self.slot_key
                );
                Vec::new()
            }
        }
    }

    /// Serializes `notes` and replaces the slot content.
    ///
    /// # Errors
    /// - `Serialize` when encoding fails.
    /// - `Storage` when the slot store rejects the write.
    pub fn save_all(&mut self, notes: &[Note]) -> Result<(), PersistenceError> {
        let started_at = Instant::now();
        let payload = serde_json::to_string(notes)?;
        if let Err(err) = self.store.write_slot(&self.slot_key, &payload) {
            warn!(
                "event=notes_save module=persistence status=error slot={} count={} error_code=slot_write_failed error={err}",
                self.slot_key,
                notes.len()
            );
            return Err(err.into());
        }

        debug!(
            "event=notes_save module=persistence status=ok slot={} count={} bytes={} duration_ms={}",
            self.slot_key,
            notes.len(),
            payload.len(),
            started_at.elapsed().as_millis()
        );
        Ok(())
    }
}

fn decode_notes(payload: &str) -> Result<Vec<Note>, DecodeError> {
    let notes: Vec<Note> = serde_json::from_str(payload).map_err(DecodeError::Json)?;
    {
        let mut seen = HashSet::with_capacity(notes.len());
        for note in &notes {
            note.validate().map_err(DecodeError::Invalid)?;
            if !seen.insert(note.id.as_str()) {
                return Err(DecodeError::DuplicateId);
            }
        }
    }
    Ok(notes)
}

#[cfg(test)]
mod tests {
    use super::{PersistenceBridge, PersistenceError, DEFAULT_SLOT_KEY};
    use crate::model::note::{Note, NoteDraft};
    use crate::repo::slot_repo::{DisabledSlotStore, MemorySlotStore, SlotStore};

    fn sample_notes() -> Vec<Note> {
        vec![
            Note::with_id("a", NoteDraft::new("Groceries", "Milk"), 10),
            Note::with_id("b", NoteDraft::new("", "Call mom"), 20),
        ]
    }

    #[test]
    fn save_then_load_returns_same_collection() {
        let mut bridge = PersistenceBridge::new(MemorySlotStore::new());
        let notes = sample_notes();
        bridge.save_all(&notes).expect("save should succeed");
        assert_eq!(bridge.load_all(), notes);
    }

    #[test]
    fn missing_slot_loads_empty() {
        let bridge = PersistenceBridge::new(MemorySlotStore::new());
        assert!(bridge.load_all().is_empty());
    }

    #[test]
    fn unparseable_payload_loads_empty() {
        let store = MemorySlotStore::new().with_slot(DEFAULT_SLOT_KEY, "{not json");
        assert!(PersistenceBridge::new(store).load_all().is_empty());
    }

    #[test]
    fn record_shape_mismatch_loads_empty() {
        let store = MemorySlotStore::new()
            .with_slot(DEFAULT_SLOT_KEY, r#"[{"id":"a","title":"t","created":1,"updated":1}]"#);
        assert!(PersistenceBridge::new(store).load_all().is_empty());

        let store = MemorySlotStore::new().with_slot(
            DEFAULT_SLOT_KEY,
            r#"[{"id":"a","title":"t","content":"c","created":1,"updated":1,"pinned":true}]"#,
        );
        assert!(PersistenceBridge::new(store).load_all().is_empty());
    }

    #[test]
    fn invariant_violations_load_empty() {
        let reversed = r#"[{"id":"a","title":"t","content":"c","created":5,"updated":1}]"#;
        let store = MemorySlotStore::new().with_slot(DEFAULT_SLOT_KEY, reversed);
        assert!(PersistenceBridge::new(store).load_all().is_empty());

        let duplicated = r#"[
            {"id":"a","title":"t","content":"c","created":1,"updated":1},
            {"id":"a","title":"u","content":"d","created":2,"updated":2}
        ]"#;
        let store = MemorySlotStore::new().with_slot(DEFAULT_SLOT_KEY, duplicated);
        assert!(PersistenceBridge::new(store).load_all().is_empty());
    }

    #[test]
    fn custom_slot_key_is_isolated_from_default() {
        assert_eq!(
            PersistenceBridge::new(MemorySlotStore::new()).slot_key(),
            DEFAULT_SLOT_KEY
        );

        let mut bridge = PersistenceBridge::with_slot_key(MemorySlotStore::new(), "archive");
        assert_eq!(bridge.slot_key(), "archive");
        bridge.save_all(&sample_notes()).expect("save should succeed");
        assert_eq!(
            bridge.store().read_slot(DEFAULT_SLOT_KEY).expect("read"),
            None
        );
        assert!(bridge
            .store()
            .read_slot(bridge.slot_key())
            .expect("read")
            .is_some());
        assert_eq!(bridge.load_all().len(), 2);
    }

    #[test]
    fn disabled_store_surfaces_storage_error() {
        let mut bridge = PersistenceBridge::new(DisabledSlotStore::new("quota exceeded"));
        let err = bridge.save_all(&sample_notes()).unwrap_err();
        assert!(matches!(err, PersistenceError::Storage(_)));
        assert!(err.to_string().contains("quota exceeded"));
    }
}
