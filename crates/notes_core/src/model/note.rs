//! Note domain model.
//!
//! # Responsibility
//! - Define the persisted note record and the editable draft payload.
//! - Provide invariant checks used when decoding persisted state.
//!
//! # Invariants
//! - `id` is stable and never reused for another note.
//! - `created <= updated` for every valid note.
//! - A blank draft (title and content both whitespace-only) never becomes a note.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Opaque note identifier.
///
/// Kept as a plain string so previously persisted ids of any format load
/// unchanged.
pub type NoteId = String;

/// Title length enforced by the presentation boundary, not by the store.
pub const TITLE_MAX_CHARS: usize = 100;

/// Placeholder shown for notes without a title.
pub const UNTITLED_LABEL: &str = "[Untitled]";

/// Unsaved title/content pair submitted by create or update requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
}

impl NoteDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }

    /// Returns whether both fields are empty or whitespace-only.
    ///
    /// A byte order mark counts as whitespace.
    pub fn is_blank(&self) -> bool {
        is_blank_text(&self.title) && is_blank_text(&self.content)
    }
}

fn is_blank_text(value: &str) -> bool {
    value
        .trim_matches(|c: char| c.is_whitespace() || c == '\u{FEFF}')
        .is_empty()
}

/// Persisted note record.
///
/// Field names match the serialized slot payload exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    /// Unix epoch milliseconds, set once at creation.
    pub created: i64,
    /// Unix epoch milliseconds, refreshed on every edit.
    pub updated: i64,
}

/// Validation failures for persisted note records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteValidationError {
    EmptyId,
    UpdatedBeforeCreated { created: i64, updated: i64 },
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "note id cannot be empty"),
            Self::UpdatedBeforeCreated { created, updated } => write!(
                f,
                "note updated ({updated}) cannot be earlier than created ({created})"
            ),
        }
    }
}

impl Error for NoteValidationError {}

impl Note {
    /// Creates a note with both timestamps set to `now_ms`.
    pub fn with_id(id: impl Into<NoteId>, draft: NoteDraft, now_ms: i64) -> Self {
        Self {
            id: id.into(),
            title: draft.title,
            content: draft.content,
            created: now_ms,
            updated: now_ms,
        }
    }

    /// Replaces the editable payload wholesale and refreshes `updated`.
    ///
    /// `updated` never moves backwards, even if the clock does.
    pub fn apply_draft(&mut self, draft: NoteDraft, now_ms: i64) {
        self.title = draft.title;
        self.content = draft.content;
        self.updated = now_ms.max(self.updated);
    }

    /// Checks record invariants.
    ///
    /// # Errors
    /// - `EmptyId` when `id` is empty or whitespace-only.
    /// - `UpdatedBeforeCreated` when `updated < created`.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        if self.id.trim().is_empty() {
            return Err(NoteValidationError::EmptyId);
        }
        if self.updated < self.created {
            return Err(NoteValidationError::UpdatedBeforeCreated {
                created: self.created,
                updated: self.updated,
            });
        }
        Ok(())
    }

    /// Title used by list rendering, falling back to `[Untitled]`.
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            UNTITLED_LABEL
        } else {
            self.title.as_str()
        }
    }
}

/// Generates a random note id.
pub fn generate_note_id() -> NoteId {
    Uuid::new_v4().to_string()
}
