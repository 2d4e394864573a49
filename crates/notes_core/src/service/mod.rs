//! Core use-case services.
//!
//! # Responsibility
//! - Own the note collection and its mutation rules.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod note_store;
