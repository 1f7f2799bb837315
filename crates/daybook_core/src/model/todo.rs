//! Todo and todo-list records.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Document-store identity of a todo or list.
pub type TodoId = Uuid;

/// Fallback label when a list document is missing.
pub const LIST_NOT_FOUND_LABEL: &str = "List not found";

/// One item of a todo list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: TodoId,
    pub title: String,
    pub done: bool,
    /// Owning list, when the todo belongs to one.
    pub list_id: Option<String>,
}

/// Stored field layout of a todo document.
///
/// Older list widgets wrote the label under `text`; reads accept both.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TodoFields {
    #[serde(alias = "text")]
    pub title: String,
    #[serde(default)]
    pub done: bool,
    #[serde(rename = "listId", default)]
    pub list_id: Option<String>,
}

impl TodoFields {
    pub(crate) fn into_todo(self, id: TodoId) -> Todo {
        Todo {
            id,
            title: self.title,
            done: self.done,
            list_id: self.list_id,
        }
    }
}
