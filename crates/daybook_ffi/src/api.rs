//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to Dart via FRB.
//! - Map core errors to message strings inside response envelopes.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every DB-backed call opens its own connection; no view-model state
//!   survives between calls.
//! - Dates cross the boundary as `YYYY-MM-DD`, ids as UUID strings.

use daybook_core::db::open_db;
use daybook_core::model::weather::{DailyForecast, Reading};
use daybook_core::weather::{icon_url, icons_url_from_env};
use daybook_core::{
    core_version as core_version_inner, format_time_input, init_logging as init_logging_inner,
    ping as ping_inner, time_to_minutes, CalendarDate, CalendarViewModel, HttpWeatherClient, Note,
    SqliteDocumentStore, Todo, TodoViewModel, WeatherConfig, WeatherSource, WeatherViewModel,
};
use log::warn;
use std::path::PathBuf;
use std::sync::OnceLock;
use uuid::Uuid;

const DB_FILE_NAME: &str = "daybook.sqlite3";
const ENV_DB_PATH: &str = "DAYBOOK_DB_PATH";
static DB_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Reconfiguration attempts with different level or directory return error.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Calendar note as shown in the day list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteItem {
    pub id: Option<String>,
    pub date: String,
    pub time: String,
    pub text: String,
}

/// Notes of one day, sorted by time of day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotesResponse {
    pub items: Vec<NoteItem>,
    /// Empty on success, diagnostic text on failure.
    pub message: String,
}

/// Decoration of one calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkedDateItem {
    pub date: String,
    pub marked: bool,
    pub dot_color: Option<String>,
    pub selected: bool,
    pub selected_color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkedDatesResponse {
    pub items: Vec<MarkedDateItem>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoItem {
    pub id: String,
    pub title: String,
    pub done: bool,
    pub list_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoListResponse {
    pub items: Vec<TodoItem>,
    /// Header label; `None` for the unscoped list.
    pub list_name: Option<String>,
    pub message: String,
}

/// Generic action response envelope for write calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Created or touched record ID.
    pub id: Option<String>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>, id: Option<String>) -> Self {
        Self {
            ok: true,
            id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            id: None,
            message: message.into(),
        }
    }
}

/// Point weather reading flattened for Dart.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReadingItem {
    pub dt: i64,
    pub temp: f64,
    pub feels_like: f64,
    pub icon: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherDayItem {
    pub dt: i64,
    pub temp_day: f64,
    pub feels_like_day: f64,
    pub icon: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherResponse {
    pub ok: bool,
    pub current: Option<WeatherReadingItem>,
    /// Next 24 hours.
    pub hourly: Vec<WeatherReadingItem>,
    /// Next 7 days, today excluded.
    pub daily: Vec<WeatherDayItem>,
    pub message: String,
}

/// Normalizes typed time input (`"1430"` -> `"14:30"`).
#[flutter_rust_bridge::frb(sync)]
pub fn calendar_format_time_input(raw: String) -> String {
    format_time_input(&raw)
}

/// Minutes since midnight, or `None` for a time still being typed.
#[flutter_rust_bridge::frb(sync)]
pub fn calendar_time_to_minutes(time: String) -> Option<u32> {
    time_to_minutes(&time).ok()
}

/// Lists the notes of `date`, sorted by time.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics; invalid date returns an empty list with a message.
#[flutter_rust_bridge::frb(sync)]
pub fn calendar_notes_for_date(date: String) -> NotesResponse {
    let result = parse_date(&date).and_then(|date| {
        with_store("calendar_notes_for_date", |store| {
            let model = CalendarViewModel::new(store).map_err(|err| err.to_string())?;
            Ok(model.sorted_notes(date))
        })
    });
    match result {
        Ok(notes) => NotesResponse {
            items: notes.iter().map(to_note_item).collect(),
            message: String::new(),
        },
        Err(message) => NotesResponse {
            items: Vec::new(),
            message: format!("calendar_notes_for_date failed: {message}"),
        },
    }
}

/// Marked days plus the optional selected day.
#[flutter_rust_bridge::frb(sync)]
pub fn calendar_marked_dates(selected_date: Option<String>) -> MarkedDatesResponse {
    let result = selected_date
        .as_deref()
        .map(parse_date)
        .transpose()
        .and_then(|selected| {
            with_store("calendar_marked_dates", |store| {
                let mut model = CalendarViewModel::new(store).map_err(|err| err.to_string())?;
                if let Some(date) = selected {
                    model.select_date(date);
                }
                Ok(model.marked_dates())
            })
        });
    match result {
        Ok(marked) => MarkedDatesResponse {
            items: marked
                .into_iter()
                .map(|(date, marking)| MarkedDateItem {
                    date: date.to_string(),
                    marked: marking.marked,
                    dot_color: marking.dot_color.map(str::to_string),
                    selected: marking.selected,
                    selected_color: marking.selected_color.map(str::to_string),
                })
                .collect(),
            message: String::new(),
        },
        Err(message) => MarkedDatesResponse {
            items: Vec::new(),
            message: format!("calendar_marked_dates failed: {message}"),
        },
    }
}

/// Creates a note on `date`.
///
/// # FFI contract
/// - Blank text is rejected without a write.
/// - Returns the created note ID on success.
#[flutter_rust_bridge::frb(sync)]
pub fn calendar_save_note(date: String, text: String, time: String) -> ActionResponse {
    let result = parse_date(&date).and_then(|date| {
        with_store("calendar_save_note", |store| {
            let mut model = CalendarViewModel::new(store).map_err(|err| err.to_string())?;
            model.select_date(date);
            model.save_note(&text, &time).map_err(|err| err.to_string())
        })
    });
    match result {
        Ok(id) => ActionResponse::success("Note saved.", Some(id.to_string())),
        Err(message) => ActionResponse::failure(format!("calendar_save_note failed: {message}")),
    }
}

/// Rewrites the text and time of a saved note.
#[flutter_rust_bridge::frb(sync)]
pub fn calendar_update_note(id: String, text: String, time: String) -> ActionResponse {
    let note_id = match parse_optional_id(&id) {
        Ok(note_id) => note_id,
        Err(message) => {
            return ActionResponse::failure(format!("calendar_update_note failed: {message}"))
        }
    };
    let result = with_store("calendar_update_note", |store| {
        let mut model = CalendarViewModel::new(store).map_err(|err| err.to_string())?;
        model
            .update_note(note_id, &text, &time)
            .map_err(|err| err.to_string())
    });
    match result {
        Ok(()) => ActionResponse::success("Note updated.", Some(id.trim().to_string())),
        Err(message) => ActionResponse::failure(format!("calendar_update_note failed: {message}")),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn calendar_delete_note(date: String, id: String) -> ActionResponse {
    let result = parse_date(&date).and_then(|date| {
        let note_id = parse_id(&id)?;
        with_store("calendar_delete_note", |store| {
            let mut model = CalendarViewModel::new(store).map_err(|err| err.to_string())?;
            model
                .delete_note(date, note_id)
                .map_err(|err| err.to_string())?;
            Ok(note_id)
        })
    });
    match result {
        Ok(note_id) => ActionResponse::success("Note deleted.", Some(note_id.to_string())),
        Err(message) => ActionResponse::failure(format!("calendar_delete_note failed: {message}")),
    }
}

/// Lists todos, optionally scoped to one list.
///
/// A scoped call also resolves the list header name.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_list(list_id: Option<String>) -> TodoListResponse {
    let list_id = normalize_list_id(list_id);
    let result = with_store("todo_list", |store| {
        let mut model =
            TodoViewModel::new(store, list_id.as_deref()).map_err(|err| err.to_string())?;
        let list_name = match list_id {
            Some(_) => Some(
                model
                    .load_list_name()
                    .map_err(|err| err.to_string())?
                    .to_string(),
            ),
            None => None,
        };
        Ok((model.todos().iter().map(to_todo_item).collect(), list_name))
    });
    match result {
        Ok((items, list_name)) => TodoListResponse {
            items,
            list_name,
            message: String::new(),
        },
        Err(message) => TodoListResponse {
            items: Vec::new(),
            list_name: None,
            message: format!("todo_list failed: {message}"),
        },
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn todo_add(title: String, list_id: Option<String>) -> ActionResponse {
    let list_id = normalize_list_id(list_id);
    let result = with_store("todo_add", |store| {
        let mut model =
            TodoViewModel::new(store, list_id.as_deref()).map_err(|err| err.to_string())?;
        model.add_todo(&title).map_err(|err| err.to_string())
    });
    match result {
        Ok(id) => ActionResponse::success("Todo added.", Some(id.to_string())),
        Err(message) => ActionResponse::failure(format!("todo_add failed: {message}")),
    }
}

/// Writes `done = !current_done` for the todo.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_toggle_done(id: String, current_done: bool) -> ActionResponse {
    let result = parse_id(&id).and_then(|todo_id| {
        with_store("todo_toggle_done", |store| {
            let mut model = TodoViewModel::new(store, None).map_err(|err| err.to_string())?;
            model
                .toggle_done(todo_id, current_done)
                .map_err(|err| err.to_string())?;
            Ok(todo_id)
        })
    });
    match result {
        Ok(todo_id) => ActionResponse::success("Todo updated.", Some(todo_id.to_string())),
        Err(message) => ActionResponse::failure(format!("todo_toggle_done failed: {message}")),
    }
}

/// Fetches the forecast for one location.
///
/// # FFI contract
/// - Sync call, blocking network I/O; call off the UI thread.
/// - Endpoint settings come from `DAYBOOK_WEATHER_*` variables.
/// - Never panics; failures set `ok=false` and a user-facing message.
#[flutter_rust_bridge::frb(sync)]
pub fn weather_load(latitude: f64, longitude: f64) -> WeatherResponse {
    match WeatherConfig::from_env() {
        Ok(config) => load_weather(HttpWeatherClient::new(config), latitude, longitude),
        Err(err) => weather_failure(err.to_string()),
    }
}

/// Icon asset URL for a condition icon code.
#[flutter_rust_bridge::frb(sync)]
pub fn weather_icon_url(icon: String) -> String {
    icon_url(&icons_url_from_env(), icon.trim())
}

fn load_weather(source: impl WeatherSource, latitude: f64, longitude: f64) -> WeatherResponse {
    let mut model = WeatherViewModel::new(source);
    match model.load(latitude, longitude) {
        Ok(snapshot) => WeatherResponse {
            ok: true,
            current: Some(to_reading_item(&snapshot.current)),
            hourly: snapshot.hourly.iter().map(to_reading_item).collect(),
            daily: snapshot.daily.iter().map(to_day_item).collect(),
            message: String::new(),
        },
        Err(err) => weather_failure(err.to_string()),
    }
}

fn weather_failure(message: String) -> WeatherResponse {
    WeatherResponse {
        ok: false,
        current: None,
        hourly: Vec::new(),
        daily: Vec::new(),
        message,
    }
}

fn resolve_db_path() -> PathBuf {
    DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(ENV_DB_PATH) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(DB_FILE_NAME)
        })
        .clone()
}

fn open_connection() -> Result<rusqlite::Connection, String> {
    open_db(resolve_db_path()).map_err(|err| format!("DB open failed: {err}"))
}

fn with_store<T>(
    call: &str,
    f: impl FnOnce(&SqliteDocumentStore<'_>) -> Result<T, String>,
) -> Result<T, String> {
    let conn = open_connection().inspect_err(|_| {
        warn!("event=ffi_call module=ffi call={call} status=error error_code=db_open_failed");
    })?;
    let store = SqliteDocumentStore::try_new(&conn)
        .map_err(|err| format!("document store init failed: {err}"))?;
    f(&store)
}

fn parse_date(value: &str) -> Result<CalendarDate, String> {
    CalendarDate::parse(value.trim()).map_err(|err| err.to_string())
}

fn parse_id(value: &str) -> Result<Uuid, String> {
    Uuid::parse_str(value.trim()).map_err(|_| format!("invalid id `{}`", value.trim()))
}

/// Blank ids become `None` so the core reports the missing identity.
fn parse_optional_id(value: &str) -> Result<Option<Uuid>, String> {
    if value.trim().is_empty() {
        Ok(None)
    } else {
        parse_id(value).map(Some)
    }
}

fn normalize_list_id(list_id: Option<String>) -> Option<String> {
    list_id
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn to_note_item(note: &Note) -> NoteItem {
    NoteItem {
        id: note.id.map(|id| id.to_string()),
        date: note.date.to_string(),
        time: note.time.clone(),
        text: note.text.clone(),
    }
}

fn to_todo_item(todo: &Todo) -> TodoItem {
    TodoItem {
        id: todo.id.to_string(),
        title: todo.title.clone(),
        done: todo.done,
        list_id: todo.list_id.clone(),
    }
}

fn to_reading_item(reading: &Reading) -> WeatherReadingItem {
    let conditions = reading.primary_conditions();
    WeatherReadingItem {
        dt: reading.dt,
        temp: reading.temp,
        feels_like: reading.feels_like,
        icon: conditions.map(|c| c.icon.clone()),
        description: conditions.map(|c| c.description.clone()),
    }
}

fn to_day_item(day: &DailyForecast) -> WeatherDayItem {
    let conditions = day.primary_conditions();
    WeatherDayItem {
        dt: day.dt,
        temp_day: day.temp.day,
        feels_like_day: day.feels_like.day,
        icon: conditions.map(|c| c.icon.clone()),
        description: conditions.map(|c| c.description.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        calendar_delete_note, calendar_format_time_input, calendar_marked_dates,
        calendar_notes_for_date, calendar_save_note, calendar_time_to_minutes,
        calendar_update_note, core_version, init_logging, load_weather, ping, todo_add,
        todo_list, todo_toggle_done,
    };
    use daybook_core::weather::FETCH_FAILED_MESSAGE;
    use daybook_core::{WeatherError, WeatherPayload, WeatherSource};
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn time_helpers_follow_core_rules() {
        assert_eq!(calendar_format_time_input("14:3x0".to_string()), "14:30");
        assert_eq!(calendar_time_to_minutes("14:30".to_string()), Some(870));
        assert_eq!(calendar_time_to_minutes("14".to_string()), None);
    }

    #[test]
    fn saved_note_is_listed_marked_updated_and_deleted() {
        let token = unique_token("calendar");
        let saved = calendar_save_note("2031-02-03".to_string(), token.clone(), "0930".to_string());
        assert!(saved.ok, "{}", saved.message);
        let note_id = saved.id.expect("save should return id");

        let listed = calendar_notes_for_date("2031-02-03".to_string());
        let item = listed
            .items
            .iter()
            .find(|item| item.id.as_deref() == Some(note_id.as_str()))
            .expect("saved note listed");
        assert_eq!(item.time, "09:30");

        let marked = calendar_marked_dates(Some("2031-02-03".to_string()));
        let day = marked
            .items
            .iter()
            .find(|item| item.date == "2031-02-03")
            .expect("marked day");
        assert!(day.marked && day.selected);
        assert_eq!(day.dot_color.as_deref(), Some("#ABD7AA"));

        let renamed = format!("{token}-renamed");
        let updated = calendar_update_note(note_id.clone(), renamed.clone(), "10:00".to_string());
        assert!(updated.ok, "{}", updated.message);
        let listed = calendar_notes_for_date("2031-02-03".to_string());
        assert!(listed.items.iter().any(|item| item.text == renamed));

        let deleted = calendar_delete_note("2031-02-03".to_string(), note_id.clone());
        assert!(deleted.ok, "{}", deleted.message);
        let listed = calendar_notes_for_date("2031-02-03".to_string());
        assert!(listed
            .items
            .iter()
            .all(|item| item.id.as_deref() != Some(note_id.as_str())));
    }

    #[test]
    fn blank_note_and_bad_inputs_are_rejected() {
        let blank = calendar_save_note("2031-02-03".to_string(), "  ".to_string(), String::new());
        assert!(!blank.ok);
        assert!(blank.message.contains("empty"));

        let bad_date = calendar_save_note("03.02.2031".to_string(), "x".to_string(), String::new());
        assert!(!bad_date.ok);

        let no_id = calendar_update_note(String::new(), "x".to_string(), String::new());
        assert!(!no_id.ok);

        let listed = calendar_notes_for_date("not-a-date".to_string());
        assert!(listed.items.is_empty());
        assert!(!listed.message.is_empty());
    }

    #[test]
    fn todo_add_then_toggle_round_trip() {
        let list = unique_token("list");
        let added = todo_add("buy milk".to_string(), Some(list.clone()));
        assert!(added.ok, "{}", added.message);
        let todo_id = added.id.expect("add should return id");

        let listed = todo_list(Some(list.clone()));
        assert_eq!(listed.items.len(), 1);
        assert!(!listed.items[0].done);
        assert_eq!(listed.list_name.as_deref(), Some("List not found"));

        let toggled = todo_toggle_done(todo_id, false);
        assert!(toggled.ok, "{}", toggled.message);
        assert!(todo_list(Some(list)).items[0].done);
    }

    #[test]
    fn todo_add_rejects_blank_title() {
        let response = todo_add(" ".to_string(), None);
        assert!(!response.ok);
        assert!(response.id.is_none());
    }

    struct FailingSource;

    impl WeatherSource for FailingSource {
        fn fetch(&self, _latitude: f64, _longitude: f64) -> Result<WeatherPayload, WeatherError> {
            Err(WeatherError::Fetch { status: 401 })
        }
    }

    #[test]
    fn weather_failure_surfaces_message() {
        let response = load_weather(FailingSource, 60.17, 24.94);
        assert!(!response.ok);
        assert!(response.current.is_none());
        assert_eq!(response.message, FETCH_FAILED_MESSAGE);
    }

    fn unique_token(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix}-{nanos}")
    }
}
