//! Device-local key/string storage.
//!
//! Unrelated to the document store: values are opaque strings and a `set`
//! replaces the whole value.

use crate::db::{ensure_table, DbError};
use rusqlite::{params, Connection, OptionalExtension};
use std::cell::RefCell;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Blob store failure.
#[derive(Debug)]
pub enum BlobError {
    Db(DbError),
}

impl Display for BlobError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "blob store failure: {err}"),
        }
    }
}

impl Error for BlobError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
        }
    }
}

impl From<DbError> for BlobError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for BlobError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Persistent string storage keyed by name.
pub trait BlobStore {
    fn get(&self, key: &str) -> Result<Option<String>, BlobError>;
    fn set(&self, key: &str, value: &str) -> Result<(), BlobError>;
}

/// Blob store kept in memory.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    values: RefCell<HashMap<String, String>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>, BlobError> {
        Ok(self.values.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), BlobError> {
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Blob store persisted in the `blobs` table.
pub struct SqliteBlobStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBlobStore<'conn> {
    pub fn try_new(conn: &'conn Connection) -> Result<Self, BlobError> {
        ensure_table(conn, "blobs")?;
        Ok(Self { conn })
    }
}

impl BlobStore for SqliteBlobStore<'_> {
    fn get(&self, key: &str) -> Result<Option<String>, BlobError> {
        let value = self
            .conn
            .query_row("SELECT value FROM blobs WHERE key = ?1;", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), BlobError> {
        self.conn.execute(
            "INSERT INTO blobs (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![key, value],
        )?;
        Ok(())
    }
}
