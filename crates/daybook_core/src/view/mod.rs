//! Screen view models.
//!
//! # Responsibility
//! - Hold the per-screen state the UI renders, with explicit mutation entry
//!   points instead of ambient globals.
//! - Route writes to the injected stores and fold live pushes back in.
//!
//! # Invariants
//! - A rejected input never reaches a store.
//! - A failed store write leaves view state as it was before the attempt.
//! - A live push replaces the whole collection it covers (last push wins).

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod calendar;
pub mod todo;
pub mod weather;

/// User input rejected before any write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Note text is empty or whitespace-only.
    EmptyText,
    /// Todo title is empty or whitespace-only.
    EmptyTitle,
    /// A note was saved with no calendar date selected.
    NoDateSelected,
    /// The note has no store identity (never saved).
    MissingNoteId,
    /// No note is open for editing.
    NoActiveNote,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let message = match self {
            Self::EmptyText => "note text cannot be empty",
            Self::EmptyTitle => "todo title cannot be empty",
            Self::NoDateSelected => "select a date before saving a note",
            Self::MissingNoteId => "note has no id; it was never saved",
            Self::NoActiveNote => "no note is open for editing",
        };
        f.write_str(message)
    }
}

impl Error for ValidationError {}
