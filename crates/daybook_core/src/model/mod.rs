//! Domain model for the calendar, todo and weather projections.
//!
//! # Responsibility
//! - Define the records the view models hold in memory.
//! - Own the pure rules on them: time-input normalization, minute ordering,
//!   date grouping and forecast slicing.
//!
//! # Invariants
//! - A `NotesByDate` map never holds an empty list for a date.
//! - Note `time` values written by core are normalized time inputs.

pub mod date;
pub mod note;
pub mod time;
pub mod todo;
pub mod weather;
