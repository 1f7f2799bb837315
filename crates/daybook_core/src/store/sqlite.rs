//! SQLite-backed document store.
//!
//! # Invariants
//! - Documents live in the `documents` table as JSON object bodies.
//! - `seq` order is insertion order; queries read in `seq` order before
//!   filtering and ordering in memory.
//! - Live subscriptions only see writes made through the same store value.

use crate::db::ensure_table;
use crate::store::subscription::SubscriptionHub;
use crate::store::{
    DocId, Document, DocumentQuery, DocumentStore, Fields, StoreError, StoreResult, Subscription,
};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use uuid::Uuid;

/// Document store persisted in a migrated SQLite connection.
pub struct SqliteDocumentStore<'conn> {
    conn: &'conn Connection,
    hub: SubscriptionHub,
}

impl<'conn> SqliteDocumentStore<'conn> {
    /// Constructs a store from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_table(conn, "documents")?;
        Ok(Self {
            conn,
            hub: SubscriptionHub::new(),
        })
    }

    fn load_collection(&self, collection: &str) -> StoreResult<Vec<Document>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, body
             FROM documents
             WHERE collection = ?1
             ORDER BY seq ASC;",
        )?;
        let mut rows = stmt.query([collection])?;
        let mut documents = Vec::new();
        while let Some(row) = rows.next()? {
            let id_text: String = row.get("id")?;
            let body: String = row.get("body")?;
            documents.push(Document::new(
                parse_id(&id_text)?,
                parse_body(&id_text, &body)?,
            ));
        }
        Ok(documents)
    }

    fn run_query(&self, query: &DocumentQuery) -> StoreResult<Vec<Document>> {
        Ok(query.apply(self.load_collection(&query.collection)?))
    }

    fn notify(&self, collection: &str) {
        self.hub.publish(collection, |query| self.run_query(query));
    }

    fn not_found(collection: &str, id: DocId) -> StoreError {
        StoreError::NotFound {
            collection: collection.to_string(),
            id,
        }
    }
}

impl DocumentStore for SqliteDocumentStore<'_> {
    fn create(&self, collection: &str, fields: Fields) -> StoreResult<DocId> {
        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO documents (collection, id, body) VALUES (?1, ?2, ?3);",
            params![collection, id.to_string(), encode_body(fields)?],
        )?;
        self.notify(collection);
        Ok(id)
    }

    fn get(&self, collection: &str, id: DocId) -> StoreResult<Option<Document>> {
        let id_text = id.to_string();
        let body: Option<String> = self
            .conn
            .query_row(
                "SELECT body FROM documents WHERE collection = ?1 AND id = ?2;",
                params![collection, id_text.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        body.map(|body| Ok(Document::new(id, parse_body(&id_text, &body)?)))
            .transpose()
    }

    fn update(&self, collection: &str, id: DocId, fields: Fields) -> StoreResult<()> {
        let id_text = id.to_string();
        let tx = self.conn.unchecked_transaction()?;
        let body: Option<String> = tx
            .query_row(
                "SELECT body FROM documents WHERE collection = ?1 AND id = ?2;",
                params![collection, id_text.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        let mut merged = match body {
            Some(body) => parse_body(&id_text, &body)?,
            None => return Err(Self::not_found(collection, id)),
        };
        merged.extend(fields);

        tx.execute(
            "UPDATE documents
             SET
                body = ?3,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE collection = ?1 AND id = ?2;",
            params![collection, id_text.as_str(), encode_body(merged)?],
        )?;
        tx.commit()?;

        self.notify(collection);
        Ok(())
    }

    fn delete(&self, collection: &str, id: DocId) -> StoreResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM documents WHERE collection = ?1 AND id = ?2;",
            params![collection, id.to_string()],
        )?;
        if changed == 0 {
            return Err(Self::not_found(collection, id));
        }
        self.notify(collection);
        Ok(())
    }

    fn query(&self, query: &DocumentQuery) -> StoreResult<Vec<Document>> {
        self.run_query(query)
    }

    fn subscribe(&self, query: DocumentQuery) -> StoreResult<Subscription> {
        let initial = self.run_query(&query)?;
        Ok(self.hub.register(query, initial))
    }
}

fn parse_id(value: &str) -> StoreResult<DocId> {
    Uuid::parse_str(value).map_err(|_| {
        StoreError::InvalidData(format!("invalid uuid value `{value}` in documents.id"))
    })
}

fn parse_body(id: &str, body: &str) -> StoreResult<Fields> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(_) => Err(StoreError::InvalidData(format!(
            "document `{id}` body is not a JSON object"
        ))),
        Err(err) => Err(StoreError::InvalidData(format!(
            "document `{id}` body is not valid JSON: {err}"
        ))),
    }
}

fn encode_body(fields: Fields) -> StoreResult<String> {
    serde_json::to_string(&Value::Object(fields))
        .map_err(|err| StoreError::InvalidData(format!("document body does not encode: {err}")))
}
