//! Persistence layer for the note collection.
//!
//! # Responsibility
//! - Define the durable slot storage contract and its implementations.
//! - Translate between the in-memory collection and one serialized slot.
//!
//! # Invariants
//! - Only the persistence bridge writes the notes slot.
//! - Storage failures are returned as semantic errors, never panics.

pub mod persistence;
pub mod slot_repo;
