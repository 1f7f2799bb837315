//! Todo list view model.
//!
//! # Invariants
//! - Writes are never applied locally; the list only changes when the live
//!   subscription echoes them back.
//! - The list order is the store's order.

use crate::logging::error_detail;
use crate::model::todo::{Todo, TodoFields, TodoId, LIST_NOT_FOUND_LABEL};
use crate::store::{
    fields, Document, DocumentQuery, DocumentStore, StoreError, StoreResult, Subscription, LISTS,
    TODOS,
};
use crate::view::ValidationError;
use log::{info, warn};
use serde_json::json;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Todo use-case error.
#[derive(Debug)]
pub enum TodoError {
    Validation(ValidationError),
    RemoteWrite(StoreError),
}

impl Display for TodoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::RemoteWrite(err) => write!(f, "saving the todo failed: {err}"),
        }
    }
}

impl Error for TodoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::RemoteWrite(err) => Some(err),
        }
    }
}

impl From<ValidationError> for TodoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

/// State behind a todo list widget.
pub struct TodoViewModel<'s, S: DocumentStore> {
    store: &'s S,
    list_id: Option<String>,
    list_name: Option<String>,
    todos: Vec<Todo>,
    subscription: Subscription,
}

impl<'s, S: DocumentStore> TodoViewModel<'s, S> {
    /// Subscribes to the todos of `list_id`, or to every todo when `None`.
    pub fn new(store: &'s S, list_id: Option<&str>) -> StoreResult<Self> {
        let list_id = list_id.map(str::to_string);
        let subscription = store.subscribe(todos_query(list_id.as_deref()))?;
        let mut model = Self {
            store,
            list_id,
            list_name: None,
            todos: Vec::new(),
            subscription,
        };
        model.sync();
        Ok(model)
    }

    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    pub fn list_id(&self) -> Option<&str> {
        self.list_id.as_deref()
    }

    pub fn list_name(&self) -> Option<&str> {
        self.list_name.as_deref()
    }

    /// Writes a new, not-done todo; it appears with the next push.
    pub fn add_todo(&mut self, title: &str) -> Result<TodoId, TodoError> {
        if title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle.into());
        }

        let mut record = fields([("title", json!(title)), ("done", json!(false))]);
        if let Some(list_id) = &self.list_id {
            record.insert("listId".to_string(), json!(list_id));
        }
        let id = self
            .store
            .create(TODOS, record)
            .map_err(|err| remote_write_failed("todo_add", err))?;
        info!("event=todo_add module=todo status=ok todo_id={id}");
        Ok(id)
    }

    /// Writes `done = !current_done` for `id`.
    pub fn toggle_done(&mut self, id: TodoId, current_done: bool) -> Result<(), TodoError> {
        self.store
            .update(TODOS, id, fields([("done", json!(!current_done))]))
            .map_err(|err| remote_write_failed("todo_toggle", err))?;
        info!(
            "event=todo_toggle module=todo status=ok todo_id={id} done={}",
            !current_done
        );
        Ok(())
    }

    /// Applies the newest pending push, if any. Returns whether one arrived.
    pub fn sync(&mut self) -> bool {
        match self.subscription.try_latest() {
            Some(documents) => {
                self.todos = documents.iter().filter_map(decode_todo).collect();
                true
            }
            None => false,
        }
    }

    /// Reads the list header name, falling back to a not-found label.
    pub fn load_list_name(&mut self) -> StoreResult<&str> {
        let name = match self.list_id.as_deref().map(Uuid::parse_str) {
            Some(Ok(list_id)) => self
                .store
                .get(LISTS, list_id)?
                .and_then(|list| list.get_str("name").map(str::to_string))
                .unwrap_or_else(|| LIST_NOT_FOUND_LABEL.to_string()),
            Some(Err(_)) | None => LIST_NOT_FOUND_LABEL.to_string(),
        };
        Ok(self.list_name.insert(name).as_str())
    }
}

fn todos_query(list_id: Option<&str>) -> DocumentQuery {
    let query = DocumentQuery::collection(TODOS);
    match list_id {
        Some(list_id) => query.where_eq("listId", list_id),
        None => query,
    }
}

fn decode_todo(document: &Document) -> Option<Todo> {
    match document.decode::<TodoFields>() {
        Ok(fields) => Some(fields.into_todo(document.id)),
        Err(err) => {
            warn!(
                "event=todo_decode module=todo status=skipped todo_id={} error={}",
                document.id,
                error_detail(&err)
            );
            None
        }
    }
}

fn remote_write_failed(event: &str, err: StoreError) -> TodoError {
    warn!(
        "event={event} module=todo status=error error={}",
        error_detail(&err)
    );
    TodoError::RemoteWrite(err)
}
