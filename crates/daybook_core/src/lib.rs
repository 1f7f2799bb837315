//! Core domain logic for Daybook.
//! This crate is the single source of truth for business invariants; the
//! mobile UI only renders view-model state and forwards user input.

pub mod db;
pub mod logging;
pub mod model;
pub mod store;
pub mod view;
pub mod weather;

pub use logging::{default_log_level, init_logging, logging_status, LogLevel};
pub use model::date::{CalendarDate, InvalidDateError};
pub use model::note::{group_by_date, sort_by_time, EventId, Note, NotesByDate};
pub use model::time::{format_time_input, time_to_minutes, MalformedTimeError};
pub use model::todo::{Todo, TodoId, LIST_NOT_FOUND_LABEL};
pub use model::weather::{WeatherPayload, WeatherSnapshot};
pub use store::blob::{BlobError, BlobStore, MemoryBlobStore, SqliteBlobStore};
pub use store::memory::MemoryDocumentStore;
pub use store::note_cache::{LocalNoteCache, NoteCacheError};
pub use store::sqlite::SqliteDocumentStore;
pub use store::{
    DocId, Document, DocumentQuery, DocumentStore, Fields, StoreError, StoreResult, Subscription,
};
pub use view::calendar::{CalendarError, CalendarViewModel, DateMarking};
pub use view::todo::{TodoError, TodoViewModel};
pub use view::weather::WeatherViewModel;
pub use view::ValidationError;
pub use weather::{HttpWeatherClient, WeatherConfig, WeatherError, WeatherSource};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
