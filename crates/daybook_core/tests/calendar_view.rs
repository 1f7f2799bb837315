use daybook_core::db::open_db_in_memory;
use daybook_core::store::{fields, EVENTS};
use daybook_core::{
    format_time_input, time_to_minutes, CalendarDate, CalendarError, CalendarViewModel,
    DocumentQuery, DocumentStore, MemoryDocumentStore, SqliteDocumentStore, StoreError,
    ValidationError,
};
use serde_json::json;

fn day(value: &str) -> CalendarDate {
    CalendarDate::parse(value).unwrap()
}

fn texts(notes: &[daybook_core::Note]) -> Vec<&str> {
    notes.iter().map(|note| note.text.as_str()).collect()
}

#[test]
fn typed_time_converts_to_minutes() {
    let formatted = format_time_input("1430");
    assert_eq!(formatted, "14:30");
    assert_eq!(time_to_minutes(&formatted).unwrap(), 870);
}

#[test]
fn sorted_notes_orders_by_time_without_touching_storage() {
    let store = MemoryDocumentStore::new();
    let mut model = CalendarViewModel::new(&store).unwrap();
    model.select_date(day("2024-05-01"));
    model.save_note("A", "09:00").unwrap();
    model.save_note("B", "08:15").unwrap();
    assert!(model.sync());

    let sorted = model.sorted_notes(day("2024-05-01"));
    assert_eq!(texts(&sorted), vec!["B", "A"]);
    assert_eq!(texts(&model.notes()[&day("2024-05-01")]), vec!["A", "B"]);
    assert_eq!(texts(&model.selected_notes()), vec!["B", "A"]);
}

#[test]
fn blank_note_text_is_rejected_without_a_write() {
    let store = MemoryDocumentStore::new();
    let mut model = CalendarViewModel::new(&store).unwrap();
    model.select_date(day("2024-05-01"));

    for text in ["", "   \n"] {
        let err = model.save_note(text, "09:00").unwrap_err();
        assert!(matches!(
            err,
            CalendarError::Validation(ValidationError::EmptyText)
        ));
    }
    assert!(store
        .query(&DocumentQuery::collection(EVENTS))
        .unwrap()
        .is_empty());
}

#[test]
fn save_without_selected_date_is_rejected() {
    let store = MemoryDocumentStore::new();
    let mut model = CalendarViewModel::new(&store).unwrap();

    let err = model.save_note("dentist", "10:00").unwrap_err();
    assert!(matches!(
        err,
        CalendarError::Validation(ValidationError::NoDateSelected)
    ));
}

#[test]
fn save_draft_writes_record_and_clears_inputs() {
    let store = MemoryDocumentStore::new();
    let mut model = CalendarViewModel::new(&store).unwrap();
    model.select_date(day("2024-05-01"));
    model.set_draft_text("dentist");
    model.set_draft_time("10:3");

    let id = model.save_draft().unwrap();
    assert!(model.draft().text.is_empty());
    assert!(model.draft().time.is_empty());

    let stored = store.get(EVENTS, id).unwrap().unwrap();
    assert_eq!(stored.get_str("date"), Some("2024-05-01"));
    assert_eq!(stored.get_str("text"), Some("dentist"));
    assert_eq!(stored.get_str("time"), Some("10:3"));
}

#[test]
fn failed_save_keeps_draft_and_reports_remote_error() {
    let store = MemoryDocumentStore::new();
    let mut model = CalendarViewModel::new(&store).unwrap();
    model.select_date(day("2024-05-01"));
    model.set_draft_text("dentist");
    store.set_offline(true);

    let err = model.save_draft().unwrap_err();
    assert!(matches!(
        err,
        CalendarError::RemoteWrite(StoreError::Unavailable(_))
    ));
    assert_eq!(model.draft().text, "dentist");
    assert!(model.notes().is_empty());
}

#[test]
fn update_note_mirrors_locally_before_push() {
    let store = MemoryDocumentStore::new();
    let mut model = CalendarViewModel::new(&store).unwrap();
    model.select_date(day("2024-05-01"));
    let id = model.save_note("draft", "09:00").unwrap();
    model.sync();

    model.update_note(Some(id), "final", "1130").unwrap();
    let note = &model.notes()[&day("2024-05-01")][0];
    assert_eq!(note.text, "final");
    assert_eq!(note.time, "11:30");

    let stored = store.get(EVENTS, id).unwrap().unwrap();
    assert_eq!(stored.get_str("text"), Some("final"));
    assert_eq!(stored.get_str("date"), Some("2024-05-01"));
}

#[test]
fn update_note_requires_identity() {
    let store = MemoryDocumentStore::new();
    let mut model = CalendarViewModel::new(&store).unwrap();

    let err = model.update_note(None, "x", "10:00").unwrap_err();
    assert!(matches!(
        err,
        CalendarError::Validation(ValidationError::MissingNoteId)
    ));
}

#[test]
fn failed_update_leaves_local_copy_untouched() {
    let store = MemoryDocumentStore::new();
    let mut model = CalendarViewModel::new(&store).unwrap();
    model.select_date(day("2024-05-01"));
    let id = model.save_note("keep", "09:00").unwrap();
    model.sync();

    store.set_offline(true);
    assert!(model.update_note(Some(id), "lost", "10:00").is_err());
    assert_eq!(model.notes()[&day("2024-05-01")][0].text, "keep");
}

#[test]
fn deleting_last_note_removes_date_key() {
    let store = MemoryDocumentStore::new();
    let mut model = CalendarViewModel::new(&store).unwrap();
    model.select_date(day("2024-05-01"));
    let first = model.save_note("one", "09:00").unwrap();
    let second = model.save_note("two", "10:00").unwrap();
    model.sync();

    model.delete_note(day("2024-05-01"), first).unwrap();
    assert_eq!(model.notes()[&day("2024-05-01")].len(), 1);

    model.delete_note(day("2024-05-01"), second).unwrap();
    assert!(!model.notes().contains_key(&day("2024-05-01")));
    assert!(!model.marked_dates()[&day("2024-05-01")].marked);
}

#[test]
fn edit_flow_opens_saves_and_deletes_active_note() {
    let store = MemoryDocumentStore::new();
    let mut model = CalendarViewModel::new(&store).unwrap();
    model.select_date(day("2024-05-02"));
    let id = model.save_note("gym", "18:00").unwrap();
    model.sync();

    let opened = model.open_note(day("2024-05-02"), id).unwrap();
    assert_eq!(opened.text, "gym");
    model.set_active_text("gym with Sam").unwrap();
    assert_eq!(model.set_active_time("1930").unwrap(), "19:30");
    model.save_active().unwrap();
    assert!(model.active_note().is_none());
    assert_eq!(model.sorted_notes(day("2024-05-02"))[0].time, "19:30");

    model.open_note(day("2024-05-02"), id).unwrap();
    model.delete_active().unwrap();
    assert!(model.active_note().is_none());
    assert!(model.notes().is_empty());
}

#[test]
fn active_note_operations_require_open_note() {
    let store = MemoryDocumentStore::new();
    let mut model = CalendarViewModel::new(&store).unwrap();

    assert_eq!(
        model.set_active_text("x").unwrap_err(),
        ValidationError::NoActiveNote
    );
    assert!(matches!(
        model.save_active().unwrap_err(),
        CalendarError::Validation(ValidationError::NoActiveNote)
    ));
}

#[test]
fn live_push_replaces_whole_collection() {
    let store = MemoryDocumentStore::new();
    let mut first = CalendarViewModel::new(&store).unwrap();
    let mut second = CalendarViewModel::new(&store).unwrap();

    first.select_date(day("2024-05-01"));
    first.save_note("from first", "08:00").unwrap();
    assert!(second.sync());
    assert_eq!(texts(&second.notes()[&day("2024-05-01")]), vec!["from first"]);

    // A write that bypasses both view models still lands on the next sync.
    store
        .create(
            EVENTS,
            fields([
                ("date", json!("2024-05-07")),
                ("time", json!("07:00")),
                ("text", json!("external")),
            ]),
        )
        .unwrap();
    assert!(second.sync());
    assert_eq!(second.notes().len(), 2);
    assert!(!second.sync());
}

#[test]
fn undecodable_event_documents_are_skipped() {
    let store = MemoryDocumentStore::new();
    store
        .create(EVENTS, fields([("date", json!("not a date")), ("text", json!("x"))]))
        .unwrap();
    store
        .create(
            EVENTS,
            fields([
                ("date", json!("2024-05-01")),
                ("time", json!("12:00")),
                ("text", json!("ok")),
            ]),
        )
        .unwrap();

    let model = CalendarViewModel::new(&store).unwrap();
    assert_eq!(model.notes().len(), 1);
}

#[test]
fn dropping_view_model_unsubscribes() {
    let store = MemoryDocumentStore::new();
    let model = CalendarViewModel::new(&store).unwrap();
    assert_eq!(store.subscriber_count(), 1);
    drop(model);
    assert_eq!(store.subscriber_count(), 0);
}

#[test]
fn reload_reads_notes_from_sqlite_store() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::try_new(&conn).unwrap();
    store
        .create(
            EVENTS,
            fields([
                ("date", json!("2024-05-01")),
                ("time", json!("09:00")),
                ("text", json!("A")),
            ]),
        )
        .unwrap();

    let mut model = CalendarViewModel::new(&store).unwrap();
    assert_eq!(model.notes().len(), 1);

    conn.execute("DELETE FROM documents;", []).unwrap();
    model.reload().unwrap();
    assert!(model.notes().is_empty());
}

/// Deterministic spread of raw time inputs, half-typed ones included.
fn raw_time_inputs(count: usize) -> Vec<String> {
    let mut state: u64 = 0x2545_f491_4f6c_dd1d;
    let mut next = move || {
        state = state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (state >> 33) as usize
    };
    (0..count)
        .map(|_| {
            let digits = next() % 5;
            let mut raw: String = (0..digits)
                .map(|_| char::from(b'0' + (next() % 10) as u8))
                .collect();
            if next() % 4 == 0 {
                raw.insert(raw.len() / 2, 'h');
            }
            raw
        })
        .collect()
}

#[test]
fn sorted_notes_permute_stored_notes_in_time_order() {
    let store = MemoryDocumentStore::new();
    let mut model = CalendarViewModel::new(&store).unwrap();
    let dates = [
        day("2024-05-01"),
        day("2024-05-02"),
        day("2024-05-09"),
        day("2024-06-30"),
    ];

    for (index, raw) in raw_time_inputs(200).iter().enumerate() {
        model.select_date(dates[index % dates.len()]);
        model.save_note(&format!("note {index}"), raw).unwrap();
    }
    model.sync();

    let stored_times: Vec<&str> = model
        .notes()
        .values()
        .flatten()
        .map(|note| note.time.as_str())
        .collect();
    assert_eq!(stored_times.len(), 200);
    assert!(stored_times.iter().any(|time| time_to_minutes(time).is_err()));
    assert!(stored_times.iter().any(|time| time_to_minutes(time).is_ok()));

    let marked = model.marked_dates();
    for (date, stored) in model.notes() {
        assert!(!stored.is_empty());
        assert!(marked[date].marked);

        let sorted = model.sorted_notes(*date);
        assert_eq!(sorted.len(), stored.len());
        let mut sorted_ids: Vec<_> = sorted.iter().map(|note| note.id.unwrap()).collect();
        let mut stored_ids: Vec<_> = stored.iter().map(|note| note.id.unwrap()).collect();
        sorted_ids.sort();
        stored_ids.sort();
        assert_eq!(sorted_ids, stored_ids);

        for pair in sorted.windows(2) {
            match (time_to_minutes(&pair[0].time), time_to_minutes(&pair[1].time)) {
                (Ok(earlier), Ok(later)) => assert!(earlier <= later),
                (Err(_), Ok(_)) => panic!("malformed time `{}` sorted first", pair[0].time),
                _ => {}
            }
        }
    }
}
