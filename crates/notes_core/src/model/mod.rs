//! Domain model for the note collection.
//!
//! # Responsibility
//! - Define the canonical note record and draft payload used by core logic.
//!
//! # Invariants
//! - Every note is identified by a stable `NoteId`.
//! - Deletion is a hard removal from the collection; there are no tombstones.

pub mod note;
