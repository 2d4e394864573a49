//! Note collection state manager.
//!
//! # Responsibility
//! - Own the authoritative in-memory note collection.
//! - Assign identity and timestamps; enforce note invariants.
//! - Flush every committed mutation through the persistence bridge before
//!   returning to the caller.
//!
//! # Invariants
//! - Ids are unique across the live collection.
//! - Blank drafts never reach the collection (create/update become no-ops).
//! - `list()` is sorted by `updated DESC`, ties kept in insertion order.
//! - A failed flush never rolls back the in-memory mutation.

use crate::clock::Clock;
use crate::model::note::{generate_note_id, Note, NoteDraft, NoteId};
use crate::repo::persistence::{PersistenceBridge, PersistenceError};
use crate::repo::slot_repo::SlotStore;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store error for note use-cases.
#[derive(Debug)]
pub enum NoteStoreError {
    /// Target note does not exist.
    NotFound(NoteId),
}

impl Display for NoteStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "note not found: {id}"),
        }
    }
}

impl Error for NoteStoreError {}

/// Value of a committed mutation plus its durability outcome.
#[derive(Debug)]
pub struct Commit<T> {
    pub value: T,
    /// Set when the flush failed; the in-memory change still stands.
    pub persist_warning: Option<PersistenceError>,
}

impl<T> Commit<T> {
    fn durable(value: T) -> Self {
        Self {
            value,
            persist_warning: None,
        }
    }

    pub fn is_durable(&self) -> bool {
        self.persist_warning.is_none()
    }
}

/// Handle returned by `NoteStore::subscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type ChangeListener = Box<dyn FnMut(&[Note]) + Send>;

/// Owned note collection seeded once from durable storage.
pub struct NoteStore<S: SlotStore, C: Clock> {
    notes: Vec<Note>,
    bridge: PersistenceBridge<S>,
    clock: C,
    listeners: Vec<(SubscriptionId, ChangeListener)>,
    next_subscription: u64,
}

impl<S: SlotStore, C: Clock> NoteStore<S, C> {
    /// Loads the collection through `bridge` exactly once and returns a
    /// ready store.
    pub fn open(bridge: PersistenceBridge<S>, clock: C) -> Self {
        let notes = bridge.load_all();
        info!(
            "event=store_open module=note_store status=ok count={}",
            notes.len()
        );
        Self {
            notes,
            bridge,
            clock,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Returns all notes sorted by `updated` descending.
    pub fn list(&self) -> Vec<Note> {
        let mut sorted = self.notes.clone();
        // Stable sort keeps insertion order for equal timestamps.
        sorted.sort_by(|a, b| b.updated.cmp(&a.updated));
        sorted
    }

    pub fn get(&self, id: &str) -> Option<Note> {
        self.position(id).map(|index| self.notes[index].clone())
    }

    pub fn bridge(&self) -> &PersistenceBridge<S> {
        &self.bridge
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Creates a note from `draft`.
    ///
    /// Returns `None` without touching state when the draft is blank.
    pub fn create(&mut self, draft: NoteDraft) -> Option<Commit<Note>> {
        if draft.is_blank() {
            info!("event=note_create module=note_store status=discarded reason=blank_draft");
            return None;
        }

        let mut id = generate_note_id();
        while self.position(&id).is_some() {
            id = generate_note_id();
        }
        let note = Note::with_id(id, draft, self.clock.now_ms());
        self.notes.push(note.clone());
        info!(
            "event=note_create module=note_store status=ok note_id={}",
            note.id
        );
        Some(self.commit(note))
    }

    /// Replaces title/content of an existing note.
    ///
    /// # Errors
    /// - `NotFound` when `id` is absent; checked before the blank-draft rule.
    ///
    /// Returns `Ok(None)` and leaves the note unchanged when the draft is blank.
    pub fn update(
        &mut self,
        id: &str,
        draft: NoteDraft,
    ) -> Result<Option<Commit<Note>>, NoteStoreError> {
        let index = self
            .position(id)
            .ok_or_else(|| NoteStoreError::NotFound(id.to_string()))?;

        if draft.is_blank() {
            info!("event=note_update module=note_store status=discarded note_id={id} reason=blank_draft");
            return Ok(None);
        }

        let now_ms = self.clock.now_ms();
        let note = &mut self.notes[index];
        note.apply_draft(draft, now_ms);
        let note = note.clone();
        info!("event=note_update module=note_store status=ok note_id={id}");
        Ok(Some(self.commit(note)))
    }

    /// Removes the note with `id`; deleting an absent id is a `false` no-op.
    pub fn delete(&mut self, id: &str) -> Commit<bool> {
        let Some(index) = self.position(id) else {
            info!("event=note_delete module=note_store status=noop note_id={id}");
            return Commit::durable(false);
        };

        self.notes.remove(index);
        info!("event=note_delete module=note_store status=ok note_id={id}");
        self.commit(true)
    }

    /// Registers a change listener and returns the current sorted list.
    ///
    /// Listeners are called with the sorted list after every committed
    /// mutation, whether or not the flush succeeded.
    pub fn subscribe<F>(&mut self, listener: F) -> (SubscriptionId, Vec<Note>)
    where
        F: FnMut(&[Note]) + Send + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        (id, self.list())
    }

    /// Removes a listener; returns whether it was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.notes.iter().position(|note| note.id == id)
    }

    fn commit<T>(&mut self, value: T) -> Commit<T> {
        let persist_warning = match self.bridge.save_all(&self.notes) {
            Ok(()) => None,
            Err(err) => {
                warn!(
                    "event=store_flush module=note_store status=error count={} error={err}",
                    self.notes.len()
                );
                Some(err)
            }
        };

        if !self.listeners.is_empty() {
            let snapshot = self.list();
            for (_, listener) in &mut self.listeners {
                listener(&snapshot);
            }
        }

        Commit {
            value,
            persist_warning,
        }
    }
}
