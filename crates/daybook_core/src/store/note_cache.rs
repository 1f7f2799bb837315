//! Device-local note cache used by the offline calendar variant.
//!
//! # Responsibility
//! - Persist the whole date → notes map as one JSON blob under `notes`.
//! - Offer the index-based edit operations of the offline calendar.
//!
//! # Invariants
//! - Every load/save handles the whole map; there are no partial writes.
//! - Saved date keys never map to an empty list.
//! - The blob layout is `{"YYYY-MM-DD": [{"text": .., "time": ..}]}`.

use crate::model::date::CalendarDate;
use crate::model::note::{Note, NotesByDate};
use crate::store::blob::{BlobError, BlobStore};
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Blob key holding the serialized note map.
pub const NOTES_KEY: &str = "notes";

/// Note cache failure.
#[derive(Debug)]
pub enum NoteCacheError {
    Blob(BlobError),
    Codec(serde_json::Error),
    /// No note at `index` on `date`.
    IndexOutOfRange { date: CalendarDate, index: usize },
}

impl Display for NoteCacheError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blob(err) => write!(f, "{err}"),
            Self::Codec(err) => write!(f, "cached notes are not valid JSON: {err}"),
            Self::IndexOutOfRange { date, index } => {
                write!(f, "no cached note at index {index} on {date}")
            }
        }
    }
}

impl Error for NoteCacheError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Blob(err) => Some(err),
            Self::Codec(err) => Some(err),
            Self::IndexOutOfRange { .. } => None,
        }
    }
}

impl From<BlobError> for NoteCacheError {
    fn from(value: BlobError) -> Self {
        Self::Blob(value)
    }
}

impl From<serde_json::Error> for NoteCacheError {
    fn from(value: serde_json::Error) -> Self {
        Self::Codec(value)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CachedNote {
    text: String,
    #[serde(default)]
    time: String,
}

/// Whole-map note persistence over a blob store.
pub struct LocalNoteCache<'b, B: BlobStore> {
    blobs: &'b B,
}

impl<'b, B: BlobStore> LocalNoteCache<'b, B> {
    pub fn new(blobs: &'b B) -> Self {
        Self { blobs }
    }

    /// Loads the cached map; an absent key is an empty map.
    pub fn load(&self) -> Result<NotesByDate, NoteCacheError> {
        let Some(raw) = self.blobs.get(NOTES_KEY)? else {
            return Ok(NotesByDate::new());
        };
        let cached: BTreeMap<CalendarDate, Vec<CachedNote>> =
            serde_json::from_str(&raw).map_err(|err| {
                error!(
                    "event=note_cache_load module=note_cache status=error error_code=decode_failed"
                );
                NoteCacheError::Codec(err)
            })?;

        Ok(cached
            .into_iter()
            .filter(|(_, notes)| !notes.is_empty())
            .map(|(date, notes)| {
                let notes = notes
                    .into_iter()
                    .map(|cached| Note::new(date, cached.time, cached.text))
                    .collect();
                (date, notes)
            })
            .collect())
    }

    /// Replaces the cached map with `notes`.
    pub fn save(&self, notes: &NotesByDate) -> Result<(), NoteCacheError> {
        let cached: BTreeMap<&CalendarDate, Vec<CachedNote>> = notes
            .iter()
            .filter(|(_, list)| !list.is_empty())
            .map(|(date, list)| {
                let list = list
                    .iter()
                    .map(|note| CachedNote {
                        text: note.text.clone(),
                        time: note.time.clone(),
                    })
                    .collect();
                (date, list)
            })
            .collect();
        let raw = serde_json::to_string(&cached)?;
        self.blobs.set(NOTES_KEY, &raw)?;
        info!(
            "event=note_cache_save module=note_cache status=ok dates={}",
            cached.len()
        );
        Ok(())
    }

    /// Appends a note to its date and saves; returns the updated map.
    pub fn append(&self, note: Note) -> Result<NotesByDate, NoteCacheError> {
        let mut notes = self.load()?;
        notes.entry(note.date).or_default().push(note);
        self.save(&notes)?;
        Ok(notes)
    }

    /// Replaces the text/time of the note at `index` on `date` and saves.
    pub fn replace_at(
        &self,
        date: CalendarDate,
        index: usize,
        text: impl Into<String>,
        time: impl Into<String>,
    ) -> Result<NotesByDate, NoteCacheError> {
        let mut notes = self.load()?;
        let note = notes
            .get_mut(&date)
            .and_then(|list| list.get_mut(index))
            .ok_or(NoteCacheError::IndexOutOfRange { date, index })?;
        note.text = text.into();
        note.time = time.into();
        self.save(&notes)?;
        Ok(notes)
    }

    /// Removes the note at `index` on `date`, dropping the date once empty.
    pub fn remove_at(
        &self,
        date: CalendarDate,
        index: usize,
    ) -> Result<NotesByDate, NoteCacheError> {
        let mut notes = self.load()?;
        let list = notes
            .get_mut(&date)
            .filter(|list| index < list.len())
            .ok_or(NoteCacheError::IndexOutOfRange { date, index })?;
        list.remove(index);
        if list.is_empty() {
            notes.remove(&date);
        }
        self.save(&notes)?;
        Ok(notes)
    }
}
