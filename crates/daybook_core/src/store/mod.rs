//! Document store contracts and implementations.
//!
//! # Responsibility
//! - Define the schema-less document store the view models read and write
//!   (`todos`, `events`, `lists` collections).
//! - Provide live subscriptions that re-deliver full result sets.
//! - Provide the device-local blob store and the legacy note cache on top.
//!
//! # Invariants
//! - Ids are assigned by the store on `create` and never reused.
//! - `update` merges fields; it never drops fields it was not given.
//! - Unordered queries, and ties in ordered ones, keep insertion order.

use crate::db::DbError;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod blob;
pub mod memory;
pub mod note_cache;
pub mod sqlite;
pub mod subscription;

pub use subscription::Subscription;

/// Collection holding todo items.
pub const TODOS: &str = "todos";
/// Collection holding calendar notes/events.
pub const EVENTS: &str = "events";
/// Collection holding todo list headers.
pub const LISTS: &str = "lists";

/// Store-assigned document identity.
pub type DocId = Uuid;

/// Field map of one document.
pub type Fields = Map<String, Value>;

pub type StoreResult<T> = Result<T, StoreError>;

/// Document store error.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    NotFound { collection: String, id: DocId },
    InvalidData(String),
    /// The store cannot be reached (for example the device is offline).
    Unavailable(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { collection, id } => write!(f, "document not found: {collection}/{id}"),
            Self::InvalidData(message) => write!(f, "invalid document data: {message}"),
            Self::Unavailable(message) => write!(f, "document store unavailable: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// One stored document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocId,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: DocId, fields: Fields) -> Self {
        Self { id, fields }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    pub fn get_bool(&self, field: &str) -> Option<bool> {
        self.fields.get(field).and_then(Value::as_bool)
    }

    /// Deserializes the field map into a typed record.
    pub fn decode<T: DeserializeOwned>(&self) -> StoreResult<T> {
        serde_json::from_value(Value::Object(self.fields.clone())).map_err(|err| {
            StoreError::InvalidData(format!("document {} does not decode: {err}", self.id))
        })
    }
}

/// Builds a field map from `(name, value)` pairs.
pub fn fields<const N: usize>(pairs: [(&str, Value); N]) -> Fields {
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

/// Collection query: optional equality filter and optional ordering field.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentQuery {
    pub collection: String,
    pub filter: Option<(String, Value)>,
    pub order_by: Option<String>,
}

impl DocumentQuery {
    /// Matches every document of `collection`.
    pub fn collection(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filter: None,
            order_by: None,
        }
    }

    /// Restricts results to documents where `field == value`.
    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter = Some((field.into(), value.into()));
        self
    }

    /// Orders results ascending by `field`; missing fields sort first.
    pub fn order_by(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(field.into());
        self
    }

    pub fn matches(&self, document: &Document) -> bool {
        match &self.filter {
            Some((field, expected)) => document.get(field) == Some(expected),
            None => true,
        }
    }

    /// Filters and orders documents given in insertion order.
    pub fn apply(&self, documents: impl IntoIterator<Item = Document>) -> Vec<Document> {
        let mut matched: Vec<Document> = documents
            .into_iter()
            .filter(|document| self.matches(document))
            .collect();
        if let Some(field) = &self.order_by {
            matched.sort_by(|left, right| compare_values(left.get(field), right.get(field)));
        }
        matched
    }
}

/// Storage contract shared by the remote-style document stores.
///
/// Methods take `&self`: stores are shared by several view models and use
/// interior mutability. Writes re-deliver affected subscriptions before they
/// return.
pub trait DocumentStore {
    /// Inserts a document and returns its new id.
    fn create(&self, collection: &str, fields: Fields) -> StoreResult<DocId>;
    fn get(&self, collection: &str, id: DocId) -> StoreResult<Option<Document>>;
    /// Merges `fields` into an existing document.
    fn update(&self, collection: &str, id: DocId, fields: Fields) -> StoreResult<()>;
    fn delete(&self, collection: &str, id: DocId) -> StoreResult<()>;
    fn query(&self, query: &DocumentQuery) -> StoreResult<Vec<Document>>;
    /// Opens a live subscription; the current result set is delivered first.
    fn subscribe(&self, query: DocumentQuery) -> StoreResult<Subscription>;
}

fn compare_values(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    let left = left.unwrap_or(&Value::Null);
    let right = right.unwrap_or(&Value::Null);
    match (left, right) {
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => {
            let a = a.as_f64().unwrap_or(f64::NAN);
            let b = b.as_f64().unwrap_or(f64::NAN);
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        _ => type_rank(left).cmp(&type_rank(right)),
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}
