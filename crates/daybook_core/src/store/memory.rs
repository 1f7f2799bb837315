//! In-process document store.
//!
//! Used by tests, demos and the CLI's scratch mode. It can be switched
//! offline to exercise write-failure paths.

use crate::store::subscription::SubscriptionHub;
use crate::store::{
    DocId, Document, DocumentQuery, DocumentStore, Fields, StoreError, StoreResult, Subscription,
};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Document store kept entirely in memory.
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: RefCell<BTreeMap<String, Vec<Document>>>,
    hub: SubscriptionHub,
    offline: Cell<bool>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While offline, every call fails with `StoreError::Unavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.set(offline);
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.hub.active_count()
    }

    fn ensure_online(&self) -> StoreResult<()> {
        if self.offline.get() {
            Err(StoreError::Unavailable("store is offline".to_string()))
        } else {
            Ok(())
        }
    }

    fn run_query(&self, query: &DocumentQuery) -> Vec<Document> {
        let collections = self.collections.borrow();
        let documents = collections
            .get(query.collection.as_str())
            .map(|documents| documents.to_vec())
            .unwrap_or_default();
        query.apply(documents)
    }

    fn notify(&self, collection: &str) {
        self.hub.publish(collection, |query| Ok(self.run_query(query)));
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn create(&self, collection: &str, fields: Fields) -> StoreResult<DocId> {
        self.ensure_online()?;
        let id = Uuid::new_v4();
        self.collections
            .borrow_mut()
            .entry(collection.to_string())
            .or_default()
            .push(Document::new(id, fields));
        self.notify(collection);
        Ok(id)
    }

    fn get(&self, collection: &str, id: DocId) -> StoreResult<Option<Document>> {
        self.ensure_online()?;
        Ok(self
            .collections
            .borrow()
            .get(collection)
            .and_then(|documents| documents.iter().find(|document| document.id == id))
            .cloned())
    }

    fn update(&self, collection: &str, id: DocId, fields: Fields) -> StoreResult<()> {
        self.ensure_online()?;
        {
            let mut collections = self.collections.borrow_mut();
            let document = collections
                .get_mut(collection)
                .and_then(|documents| documents.iter_mut().find(|document| document.id == id))
                .ok_or_else(|| StoreError::NotFound {
                    collection: collection.to_string(),
                    id,
                })?;
            document.fields.extend(fields);
        }
        self.notify(collection);
        Ok(())
    }

    fn delete(&self, collection: &str, id: DocId) -> StoreResult<()> {
        self.ensure_online()?;
        {
            let mut collections = self.collections.borrow_mut();
            let documents = collections.get_mut(collection);
            let position = documents
                .as_ref()
                .and_then(|documents| documents.iter().position(|document| document.id == id));
            match (documents, position) {
                (Some(documents), Some(position)) => {
                    documents.remove(position);
                }
                _ => {
                    return Err(StoreError::NotFound {
                        collection: collection.to_string(),
                        id,
                    })
                }
            }
        }
        self.notify(collection);
        Ok(())
    }

    fn query(&self, query: &DocumentQuery) -> StoreResult<Vec<Document>> {
        self.ensure_online()?;
        Ok(self.run_query(query))
    }

    fn subscribe(&self, query: DocumentQuery) -> StoreResult<Subscription> {
        self.ensure_online()?;
        let initial = self.run_query(&query);
        Ok(self.hub.register(query, initial))
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryDocumentStore;
    use crate::store::{fields, DocumentQuery, DocumentStore, StoreError};
    use serde_json::json;

    #[test]
    fn update_merges_fields_and_pushes_to_subscribers() {
        let store = MemoryDocumentStore::new();
        let sub = store
            .subscribe(DocumentQuery::collection("todos"))
            .expect("subscribe");
        let id = store
            .create("todos", fields([("title", json!("milk")), ("done", json!(false))]))
            .expect("create");
        store
            .update("todos", id, fields([("done", json!(true))]))
            .expect("update");

        let latest = sub.try_latest().expect("pushed snapshot");
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].get_str("title"), Some("milk"));
        assert_eq!(latest[0].get_bool("done"), Some(true));
    }

    #[test]
    fn delete_missing_document_is_not_found() {
        let store = MemoryDocumentStore::new();
        let err = store
            .delete("events", uuid::Uuid::new_v4())
            .expect_err("missing document");
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn offline_store_rejects_writes() {
        let store = MemoryDocumentStore::new();
        store.set_offline(true);
        let err = store
            .create("todos", fields([("title", json!("x"))]))
            .expect_err("offline");
        assert!(matches!(err, StoreError::Unavailable(_)));
        store.set_offline(false);
        assert!(store
            .query(&DocumentQuery::collection("todos"))
            .expect("query")
            .is_empty());
    }
}
