//! Calendar note/event record and date grouping.
//!
//! # Invariants
//! - Within a date, display order is ascending by minutes since midnight,
//!   never by insertion or storage order.
//! - Grouping keeps insertion order inside each date list.

use crate::model::date::CalendarDate;
use crate::model::time::compare_times;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Document-store identity of a saved note.
pub type EventId = Uuid;

/// Per-date note lists, in calendar order.
pub type NotesByDate = BTreeMap<CalendarDate, Vec<Note>>;

/// One timed note on a calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Absent until the note has been written to the document store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EventId>,
    pub date: CalendarDate,
    /// Normalized time input, `HH:MM` once fully typed.
    pub time: String,
    pub text: String,
}

impl Note {
    /// Creates a note that has not been saved yet.
    pub fn new(date: CalendarDate, time: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: None,
            date,
            time: time.into(),
            text: text.into(),
        }
    }

    pub fn with_id(mut self, id: EventId) -> Self {
        self.id = Some(id);
        self
    }
}

/// Groups notes by date, keeping each date's insertion order.
pub fn group_by_date(notes: impl IntoIterator<Item = Note>) -> NotesByDate {
    let mut grouped = NotesByDate::new();
    for note in notes {
        grouped.entry(note.date).or_default().push(note);
    }
    grouped
}

/// Returns a copy of `notes` ordered by time of day.
///
/// The input slice is left untouched. Ties and malformed times keep their
/// relative order.
pub fn sort_by_time(notes: &[Note]) -> Vec<Note> {
    let mut sorted = notes.to_vec();
    sorted.sort_by(|left, right| compare_times(&left.time, &right.time));
    sorted
}
