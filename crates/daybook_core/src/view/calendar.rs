//! Calendar screen view model.
//!
//! # Responsibility
//! - Hold the selected date, the per-date notes, the new-note draft and the
//!   note open for editing.
//! - Derive the marked-date set and the time-sorted notes of a date.
//! - Write note changes to the `events` collection.
//!
//! # Invariants
//! - `notes` never maps a date to an empty list.
//! - `sorted_notes` never reorders stored state.
//! - Update and delete mirror into local state right after the store
//!   accepts them; saves wait for the live push.

use crate::logging::error_detail;
use crate::model::date::CalendarDate;
use crate::model::note::{group_by_date, sort_by_time, EventId, Note, NotesByDate};
use crate::model::time::format_time_input;
use crate::store::{
    fields, Document, DocumentQuery, DocumentStore, StoreError, StoreResult, Subscription, EVENTS,
};
use crate::view::ValidationError;
use log::{info, warn};
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Dot color for dates that have notes.
pub const MARKED_DOT_COLOR: &str = "#ABD7AA";
/// Highlight color for the selected date.
pub const SELECTED_COLOR: &str = "#5A906D";

/// Calendar use-case error.
#[derive(Debug)]
pub enum CalendarError {
    Validation(ValidationError),
    /// The store rejected the write; local state is unchanged.
    RemoteWrite(StoreError),
}

impl Display for CalendarError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::RemoteWrite(err) => write!(f, "saving to the calendar failed: {err}"),
        }
    }
}

impl Error for CalendarError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::RemoteWrite(err) => Some(err),
        }
    }
}

impl From<ValidationError> for CalendarError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

/// How one calendar day is decorated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateMarking {
    pub marked: bool,
    pub dot_color: Option<&'static str>,
    pub selected: bool,
    pub selected_color: Option<&'static str>,
}

/// Text and time typed for a note that is not saved yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteDraft {
    pub text: String,
    pub time: String,
}

/// Saved note currently open for editing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveNote {
    pub id: EventId,
    pub date: CalendarDate,
    pub text: String,
    pub time: String,
}

#[derive(Debug, Deserialize)]
struct EventFields {
    date: CalendarDate,
    #[serde(default)]
    time: String,
    #[serde(default)]
    text: String,
}

/// State behind the calendar screen.
pub struct CalendarViewModel<'s, S: DocumentStore> {
    store: &'s S,
    subscription: Subscription,
    selected_date: Option<CalendarDate>,
    notes: NotesByDate,
    draft: NoteDraft,
    active: Option<ActiveNote>,
}

impl<'s, S: DocumentStore> CalendarViewModel<'s, S> {
    /// Subscribes to `events` and applies the initial result set.
    pub fn new(store: &'s S) -> StoreResult<Self> {
        let subscription = store.subscribe(events_query())?;
        let mut model = Self {
            store,
            subscription,
            selected_date: None,
            notes: NotesByDate::new(),
            draft: NoteDraft::default(),
            active: None,
        };
        model.sync();
        Ok(model)
    }

    pub fn selected_date(&self) -> Option<CalendarDate> {
        self.selected_date
    }

    pub fn notes(&self) -> &NotesByDate {
        &self.notes
    }

    pub fn draft(&self) -> &NoteDraft {
        &self.draft
    }

    pub fn active_note(&self) -> Option<&ActiveNote> {
        self.active.as_ref()
    }

    /// Makes `date` the active day and clears the draft text.
    pub fn select_date(&mut self, date: CalendarDate) {
        self.selected_date = Some(date);
        self.draft.text.clear();
    }

    pub fn set_draft_text(&mut self, text: impl Into<String>) {
        self.draft.text = text.into();
    }

    /// Stores the normalized form of `raw` as the draft time.
    pub fn set_draft_time(&mut self, raw: &str) -> &str {
        self.draft.time = format_time_input(raw);
        &self.draft.time
    }

    /// Decorations for every date with notes, plus the selected date.
    pub fn marked_dates(&self) -> BTreeMap<CalendarDate, DateMarking> {
        let mut marked: BTreeMap<CalendarDate, DateMarking> = self
            .notes
            .iter()
            .filter(|(_, notes)| !notes.is_empty())
            .map(|(date, _)| {
                let marking = DateMarking {
                    marked: true,
                    dot_color: Some(MARKED_DOT_COLOR),
                    ..DateMarking::default()
                };
                (*date, marking)
            })
            .collect();

        if let Some(date) = self.selected_date {
            let marking = marked.entry(date).or_default();
            marking.selected = true;
            marking.selected_color = Some(SELECTED_COLOR);
        }
        marked
    }

    /// Notes of `date` ordered by time of day, as a copy.
    pub fn sorted_notes(&self, date: CalendarDate) -> Vec<Note> {
        self.notes
            .get(&date)
            .map(|notes| sort_by_time(notes))
            .unwrap_or_default()
    }

    /// Sorted notes of the selected date; empty when none is selected.
    pub fn selected_notes(&self) -> Vec<Note> {
        self.selected_date
            .map(|date| self.sorted_notes(date))
            .unwrap_or_default()
    }

    /// Creates a note on the selected date.
    ///
    /// On success the draft is cleared; the note itself shows up with the
    /// next live push.
    pub fn save_note(&mut self, text: &str, time: &str) -> Result<EventId, CalendarError> {
        if text.trim().is_empty() {
            return Err(ValidationError::EmptyText.into());
        }
        let date = self.selected_date.ok_or(ValidationError::NoDateSelected)?;

        let record = fields([
            ("date", json!(date.to_string())),
            ("text", json!(text)),
            ("time", json!(format_time_input(time))),
        ]);
        let id = self
            .store
            .create(EVENTS, record)
            .map_err(|err| remote_write_failed("note_save", err))?;

        info!("event=note_save module=calendar status=ok note_id={id} date={date}");
        self.draft = NoteDraft::default();
        Ok(id)
    }

    /// Saves the current draft; see [`Self::save_note`].
    pub fn save_draft(&mut self) -> Result<EventId, CalendarError> {
        let NoteDraft { text, time } = self.draft.clone();
        self.save_note(&text, &time)
    }

    /// Rewrites the text and time of a saved note.
    ///
    /// The local copy is patched as soon as the store accepts the write, so
    /// the screen does not wait for the next push.
    pub fn update_note(
        &mut self,
        id: Option<EventId>,
        text: &str,
        time: &str,
    ) -> Result<(), CalendarError> {
        let id = id.ok_or(ValidationError::MissingNoteId)?;
        let time = format_time_input(time);

        self.store
            .update(
                EVENTS,
                id,
                fields([("text", json!(text)), ("time", json!(time))]),
            )
            .map_err(|err| remote_write_failed("note_update", err))?;

        let local = self
            .notes
            .values_mut()
            .flat_map(|notes| notes.iter_mut())
            .find(|note| note.id == Some(id));
        if let Some(note) = local {
            note.text = text.to_string();
            note.time = time;
        }
        info!("event=note_update module=calendar status=ok note_id={id}");
        Ok(())
    }

    /// Deletes a saved note and drops it from the local copy.
    pub fn delete_note(&mut self, date: CalendarDate, id: EventId) -> Result<(), CalendarError> {
        self.store
            .delete(EVENTS, id)
            .map_err(|err| remote_write_failed("note_delete", err))?;

        if let Some(notes) = self.notes.get_mut(&date) {
            notes.retain(|note| note.id != Some(id));
            if notes.is_empty() {
                self.notes.remove(&date);
            }
        }
        if self.active.as_ref().is_some_and(|active| active.id == id) {
            self.active = None;
        }
        info!("event=note_delete module=calendar status=ok note_id={id} date={date}");
        Ok(())
    }

    /// Opens a saved note of `date` for editing.
    pub fn open_note(&mut self, date: CalendarDate, id: EventId) -> Option<&ActiveNote> {
        let note = self
            .notes
            .get(&date)?
            .iter()
            .find(|note| note.id == Some(id))?;
        self.active = Some(ActiveNote {
            id,
            date,
            text: note.text.clone(),
            time: note.time.clone(),
        });
        self.active.as_ref()
    }

    pub fn set_active_text(&mut self, text: impl Into<String>) -> Result<(), ValidationError> {
        let active = self.active.as_mut().ok_or(ValidationError::NoActiveNote)?;
        active.text = text.into();
        Ok(())
    }

    pub fn set_active_time(&mut self, raw: &str) -> Result<&str, ValidationError> {
        let active = self.active.as_mut().ok_or(ValidationError::NoActiveNote)?;
        active.time = format_time_input(raw);
        Ok(&active.time)
    }

    pub fn close_note(&mut self) {
        self.active = None;
    }

    /// Writes the open note back and closes it.
    pub fn save_active(&mut self) -> Result<(), CalendarError> {
        let active = self.active.clone().ok_or(ValidationError::NoActiveNote)?;
        self.update_note(Some(active.id), &active.text, &active.time)?;
        self.active = None;
        Ok(())
    }

    /// Deletes the open note.
    pub fn delete_active(&mut self) -> Result<(), CalendarError> {
        let active = self.active.clone().ok_or(ValidationError::NoActiveNote)?;
        self.delete_note(active.date, active.id)
    }

    /// Applies the newest pending push, if any. Returns whether one arrived.
    pub fn sync(&mut self) -> bool {
        match self.subscription.try_latest() {
            Some(documents) => {
                self.replace_notes(documents);
                true
            }
            None => false,
        }
    }

    /// Re-reads every event and replaces local notes.
    pub fn reload(&mut self) -> StoreResult<()> {
        let documents = self.store.query(&events_query())?;
        self.replace_notes(documents);
        Ok(())
    }

    fn replace_notes(&mut self, documents: Vec<Document>) {
        let notes = documents.iter().filter_map(|document| {
            match note_from_document(document) {
                Ok(note) => Some(note),
                Err(err) => {
                    warn!(
                        "event=note_decode module=calendar status=skipped note_id={} error={}",
                        document.id,
                        error_detail(&err)
                    );
                    None
                }
            }
        });
        self.notes = group_by_date(notes);
    }
}

fn events_query() -> DocumentQuery {
    DocumentQuery::collection(EVENTS).order_by("date")
}

fn note_from_document(document: &Document) -> StoreResult<Note> {
    let fields: EventFields = document.decode()?;
    Ok(Note::new(fields.date, fields.time, fields.text).with_id(document.id))
}

fn remote_write_failed(event: &str, err: StoreError) -> CalendarError {
    warn!(
        "event={event} module=calendar status=error error={}",
        error_detail(&err)
    );
    CalendarError::RemoteWrite(err)
}

#[cfg(test)]
mod tests {
    use super::{CalendarViewModel, MARKED_DOT_COLOR, SELECTED_COLOR};
    use crate::model::date::CalendarDate;
    use crate::store::memory::MemoryDocumentStore;

    fn day(value: &str) -> CalendarDate {
        CalendarDate::parse(value).expect("valid date")
    }

    #[test]
    fn selected_date_merges_into_existing_marking() {
        let store = MemoryDocumentStore::new();
        let mut model = CalendarViewModel::new(&store).expect("model");
        model.select_date(day("2024-05-01"));
        model.save_note("A", "0900").expect("save");
        model.sync();

        let marked = model.marked_dates();
        let marking = &marked[&day("2024-05-01")];
        assert!(marking.marked);
        assert_eq!(marking.dot_color, Some(MARKED_DOT_COLOR));
        assert!(marking.selected);
        assert_eq!(marking.selected_color, Some(SELECTED_COLOR));
    }

    #[test]
    fn selected_date_without_notes_is_only_selected() {
        let store = MemoryDocumentStore::new();
        let mut model = CalendarViewModel::new(&store).expect("model");
        model.select_date(day("2024-06-10"));

        let marked = model.marked_dates();
        assert_eq!(marked.len(), 1);
        let marking = &marked[&day("2024-06-10")];
        assert!(!marking.marked);
        assert_eq!(marking.dot_color, None);
        assert!(marking.selected);
    }

    #[test]
    fn select_date_clears_draft_text_only() {
        let store = MemoryDocumentStore::new();
        let mut model = CalendarViewModel::new(&store).expect("model");
        model.set_draft_text("half written");
        assert_eq!(model.set_draft_time("1015"), "10:15");

        model.select_date(day("2024-05-01"));
        assert!(model.draft().text.is_empty());
        assert_eq!(model.draft().time, "10:15");
    }
}
